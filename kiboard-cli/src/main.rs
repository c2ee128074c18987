//! Kiboard CLI - KiCad PCB manufacturability checks from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use kiboard::{builtin_profiles, CheckOptions, CheckResult, KiboardCore, SpecProfile};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "kiboard")]
#[command(about = "KiCad PCB manufacturability checker and fixer", long_about = None)]
#[command(version)]
struct Cli {
    /// Log per-element detail
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a .kicad_pcb file, optionally fixing what fails
    Check {
        /// Path to .kicad_pcb file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Minimum via annular ring (mils)
        #[arg(long, value_name = "MILS")]
        via_annular_ring: Option<f64>,

        /// Minimum via drill width (mils)
        #[arg(long, value_name = "MILS")]
        via_drill_width: Option<f64>,

        /// Minimum trace width (mils)
        #[arg(long, value_name = "MILS")]
        trace_width: Option<f64>,

        /// Minimum text stroke thickness (mm)
        #[arg(long, value_name = "MM")]
        text_thickness: Option<f64>,

        /// Minimum text glyph width (mm, defaults to 4x thickness)
        #[arg(long, value_name = "MM")]
        text_width: Option<f64>,

        /// Minimum text glyph height (mm, defaults to 4x thickness)
        #[arg(long, value_name = "MM")]
        text_height: Option<f64>,

        /// Raise failing attributes to the threshold and save the board
        #[arg(long)]
        fix: bool,

        /// Where to save the fixed board (default: FILE plus a timestamp)
        #[arg(short, long, value_name = "PATH", requires = "fix")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if any violation was found
        #[arg(long)]
        fail_on_errors: bool,
    },

    /// List built-in manufacturer profiles
    Specs {
        /// Show every rule and note of each profile
        #[arg(short, long)]
        verbose: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let exit_code = match cli.command {
        Commands::Check {
            file,
            via_annular_ring,
            via_drill_width,
            trace_width,
            text_thickness,
            text_width,
            text_height,
            fix,
            output,
            format,
            fail_on_errors,
        } => {
            let options = CheckOptions {
                via_annular_ring,
                via_drill_width,
                trace_width,
                text_thickness,
                text_width,
                text_height,
                fix,
                output,
            };
            handle_check(&file, &options, format, fail_on_errors)
        }
        Commands::Specs { verbose, format } => {
            handle_specs(verbose, format);
            0
        }
    };

    process::exit(exit_code);
}

fn init_logging(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn handle_check(file: &Path, options: &CheckOptions, format: OutputFormat, fail_on_errors: bool) -> i32 {
    if file.extension().and_then(|s| s.to_str()) != Some("kicad_pcb") {
        tracing::warn!("{} does not have a .kicad_pcb extension", file.display());
    }

    match KiboardCore::check_board(file, options) {
        Ok(result) => {
            match format {
                OutputFormat::Human => output_human(&result),
                OutputFormat::Json => output_json(&result),
            }
            if fail_on_errors && result.has_errors() {
                return 1;
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn output_human(result: &CheckResult) {
    let report = &result.report;
    println!("\nFile: {}", result.file.display());
    println!("{}", "─".repeat(60));

    if report.checkers.is_empty() {
        println!("  No rules enabled");
        return;
    }

    for checker in &report.checkers {
        let inspected = &checker.inspected;
        println!("\n  {}", checker.description);
        println!(
            "    {} error(s) in {} modules, {} pads, {} text (ref/value), {} drawings, {} tracks",
            checker.errors,
            inspected.modules,
            inspected.pads,
            inspected.texts,
            inspected.drawings,
            inspected.tracks
        );
        for violation in report.violations.iter().filter(|v| v.checker == checker.checker) {
            let action = if violation.fixed { " [fixed]" } else { "" };
            println!("    - {}{}", violation.message, action);
        }
    }

    println!("\n  Summary:");
    println!("    Errors:   {}", report.total_errors);
    if report.fix_mode {
        let fixed: usize = report.checkers.iter().map(|c| c.fixed).sum();
        println!("    Fixed:    {}", fixed);
    }
    if let Some(residual) = report.residual_errors {
        println!("    Residual: {}", residual);
    }
    if let Some(path) = &result.saved_to {
        println!("    Saved to: {}", path.display());
    }
}

fn output_json(result: &CheckResult) {
    let output = serde_json::json!({
        "file": result.file.display().to_string(),
        "report": result.report,
        "saved_to": result.saved_to.as_ref().map(|p| p.display().to_string()),
        "summary": {
            "total_errors": result.total_errors(),
            "checkers": result.report.checkers.len(),
        }
    });
    print_json(&output);
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_specs(verbose: bool, format: OutputFormat) {
    let profiles = builtin_profiles();
    match format {
        OutputFormat::Human => specs_human(&profiles, verbose),
        OutputFormat::Json => print_json(&serde_json::json!({ "profiles": profiles })),
    }
}

fn specs_human(profiles: &[SpecProfile], verbose: bool) {
    println!("Built-in manufacturer profiles (mils):\n");

    for profile in profiles {
        println!("  {}", profile.name);
        if verbose {
            println!("    source: {}", profile.source);
            for (rule, value) in profile.rules() {
                println!("    {:<20} {}", rule, value);
            }
            for note in &profile.notes {
                println!("    note: {}", note);
            }
        } else {
            println!(
                "    trace {} / space {} / drill {} / annular ring {}",
                profile.trace_width, profile.trace_spacing, profile.drill, profile.annular_ring
            );
        }
        println!();
    }
}
