//! Check a board against a fab profile and print the violations.
//! Run with: cargo run --example check_board [path/to/file.kicad_pcb] [profile]

use kiboard::prelude::*;
use kiboard::find_profile;
use std::path::Path;

fn main() -> Result<(), KiboardError> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/violations_board.kicad_pcb".to_string());
    let profile_name = args.next().unwrap_or_else(|| "oshpark-4layers".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example check_board [path/to/file.kicad_pcb] [profile]");
        std::process::exit(1);
    }

    let profile = find_profile(&profile_name)
        .ok_or_else(|| KiboardError::Other(format!("Unknown profile: {}", profile_name)))?;

    let options = CheckOptions {
        via_annular_ring: Some(profile.annular_ring),
        via_drill_width: Some(profile.drill),
        trace_width: Some(profile.trace_width),
        ..Default::default()
    };

    let result = KiboardCore::check_board(path, &options)?;

    println!("Results for {} against {}:", result.file.display(), profile.name);
    for checker in &result.report.checkers {
        println!("  {}: {} error(s)", checker.description, checker.errors);
    }
    for violation in &result.report.violations {
        println!("    - {}", violation.message);
    }

    if result.has_errors() {
        println!("\n{} violation(s) found.", result.total_errors());
        std::process::exit(1);
    }

    println!("\nBoard meets the {} capabilities.", profile.name);
    Ok(())
}
