//! Core check-and-fix flow shared by the CLI and library users.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::board::Board;
use crate::checker::{
    AnnularRingChecker, CheckEngine, RuleChecker, RunReport, TextChecker, TraceWidthChecker,
    ViaDrillWidthChecker,
};
use crate::parser::{BoardParseError, BoardParser, BoardWriteError, BoardWriter};
use crate::units;

#[derive(Debug, thiserror::Error)]
pub enum KiboardError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Write error: {0}")]
    Write(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

impl From<BoardParseError> for KiboardError {
    fn from(e: BoardParseError) -> Self {
        match e {
            BoardParseError::Io(io) => KiboardError::Io(io),
            other => KiboardError::Parse(other.to_string()),
        }
    }
}

impl From<BoardWriteError> for KiboardError {
    fn from(e: BoardWriteError) -> Self {
        match e {
            BoardWriteError::Io(io) => KiboardError::Io(io),
            other => KiboardError::Write(other.to_string()),
        }
    }
}

/// Options for a check run. Geometric thresholds are in mils, text
/// thresholds in millimetres; `None` disables the rule.
#[derive(Clone, Debug, Default)]
pub struct CheckOptions {
    pub via_annular_ring: Option<f64>,
    pub via_drill_width: Option<f64>,
    pub trace_width: Option<f64>,
    pub text_thickness: Option<f64>,
    pub text_width: Option<f64>,
    pub text_height: Option<f64>,
    pub fix: bool,
    /// Where to save a fixed board; defaults to [`timestamped_output_path`].
    pub output: Option<PathBuf>,
}

impl CheckOptions {
    /// Reject thresholds that are negative, NaN, infinite, or too large to
    /// express in internal units.
    pub fn validate(&self) -> Result<(), KiboardError> {
        // The annular-ring fix widens a via by twice the ring
        let thresholds: [(&str, Option<f64>, fn(f64) -> bool); 6] = [
            ("via annular ring", self.via_annular_ring, |v| units::mils_in_range(2.0 * v)),
            ("via drill width", self.via_drill_width, units::mils_in_range),
            ("trace width", self.trace_width, units::mils_in_range),
            ("text thickness", self.text_thickness, units::mm_in_range),
            ("text width", self.text_width, units::mm_in_range),
            ("text height", self.text_height, units::mm_in_range),
        ];
        for (name, value, in_range) in thresholds {
            if let Some(v) = value {
                if v < 0.0 || !in_range(v) {
                    return Err(KiboardError::Other(format!(
                        "Invalid {} threshold: {}",
                        name, v
                    )));
                }
            }
        }
        Ok(())
    }

    /// Text thresholds, when any text option is set. Missing width or height
    /// default to four times the thickness; a missing thickness imposes no
    /// minimum.
    pub fn text_thresholds(&self) -> Option<(f64, f64, f64)> {
        if self.text_thickness.is_none() && self.text_width.is_none() && self.text_height.is_none() {
            return None;
        }
        let thickness = self.text_thickness.unwrap_or(0.0);
        let width = self.text_width.unwrap_or(4.0 * thickness);
        let height = self.text_height.unwrap_or(4.0 * thickness);
        Some((thickness, width, height))
    }

    /// Checkers for the enabled rules, in execution order: drill width,
    /// annular ring, trace width, text.
    pub fn checkers(&self) -> Vec<Arc<dyn RuleChecker>> {
        let mut checkers: Vec<Arc<dyn RuleChecker>> = Vec::new();
        if let Some(min) = self.via_drill_width {
            checkers.push(Arc::new(ViaDrillWidthChecker::new(min)));
        }
        if let Some(min) = self.via_annular_ring {
            checkers.push(Arc::new(AnnularRingChecker::new(min)));
        }
        if let Some(min) = self.trace_width {
            checkers.push(Arc::new(TraceWidthChecker::new(min)));
        }
        if let Some((thickness, width, height)) = self.text_thresholds() {
            checkers.push(Arc::new(TextChecker::new(thickness, width, height)));
        }
        checkers
    }
}

/// Result of checking one board file.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub file: PathBuf,
    pub report: RunReport,
    /// Path of the corrected board, when one was written.
    pub saved_to: Option<PathBuf>,
}

impl CheckResult {
    pub fn total_errors(&self) -> usize {
        self.report.total_errors
    }

    pub fn has_errors(&self) -> bool {
        self.report.has_errors()
    }
}

/// `board.kicad_pcb` -> `board.kicad_pcb20261019143000` (local time).
pub fn timestamped_output_path(path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let mut name = path.as_os_str().to_os_string();
    name.push(stamp.to_string());
    PathBuf::from(name)
}

/// Core check API used by the CLI.
pub struct KiboardCore;

impl KiboardCore {
    /// Load a board file, run the enabled checkers and, in fix mode, save the
    /// corrected board when at least one violation was found.
    pub fn check_board(path: &Path, options: &CheckOptions) -> Result<CheckResult, KiboardError> {
        options.validate()?;
        let mut board = BoardParser::load(path)?;
        let report = Self::check_loaded(&mut board, options);

        let saved_to = if options.fix && report.has_errors() {
            let output = options
                .output
                .clone()
                .unwrap_or_else(|| timestamped_output_path(path));
            tracing::info!("Saving modified PCB to {}", output.display());
            BoardWriter::save(&board, &output)?;
            Some(output)
        } else {
            None
        };

        Ok(CheckResult {
            file: path.to_path_buf(),
            report,
            saved_to,
        })
    }

    /// Run the enabled checkers over an already loaded board.
    pub fn check_loaded(board: &mut Board, options: &CheckOptions) -> RunReport {
        let mut engine = CheckEngine::new(board, options.fix);
        for checker in options.checkers() {
            engine.add_checker(checker);
        }
        if engine.checkers().is_empty() {
            tracing::warn!("No rules enabled; nothing to check");
        }

        engine.run();
        if options.fix {
            let residual = engine.verify();
            if residual > 0 {
                tracing::warn!(
                    "{} violation(s) remain after fixing; rules adjusting the same attribute may conflict",
                    residual
                );
            }
        }

        engine.into_report().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_order() {
        let options = CheckOptions {
            via_annular_ring: Some(5.0),
            via_drill_width: Some(10.0),
            trace_width: Some(6.0),
            text_thickness: Some(0.15),
            ..Default::default()
        };
        let ids: Vec<_> = options.checkers().iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids, ["via_drill_width", "via_annular_ring", "trace_width", "text_dimensions"]);
    }

    #[test]
    fn test_text_defaults() {
        let options = CheckOptions {
            text_thickness: Some(0.15),
            text_height: Some(1.0),
            ..Default::default()
        };
        assert_eq!(options.text_thresholds(), Some((0.15, 0.6, 1.0)));

        let options = CheckOptions {
            text_width: Some(0.8),
            ..Default::default()
        };
        assert_eq!(options.text_thresholds(), Some((0.0, 0.8, 0.0)));

        assert_eq!(CheckOptions::default().text_thresholds(), None);
        assert!(CheckOptions::default().checkers().is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let options = CheckOptions {
            trace_width: Some(-1.0),
            ..Default::default()
        };
        assert!(options.validate().is_err());
        let options = CheckOptions {
            text_height: Some(f64::NAN),
            ..Default::default()
        };
        assert!(options.validate().is_err());
        assert!(CheckOptions::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unrepresentable_thresholds() {
        let huge = [
            CheckOptions { trace_width: Some(1e15), ..Default::default() },
            CheckOptions { via_drill_width: Some(1e15), ..Default::default() },
            CheckOptions { via_annular_ring: Some(2e14), ..Default::default() },
            CheckOptions { text_thickness: Some(1e13), ..Default::default() },
        ];
        for options in huge {
            assert!(matches!(options.validate(), Err(KiboardError::Other(_))));
        }

        let large_but_valid = CheckOptions {
            trace_width: Some(1e9),
            text_height: Some(1e6),
            ..Default::default()
        };
        assert!(large_but_valid.validate().is_ok());
    }

    #[test]
    fn test_timestamped_output_path() {
        let output = timestamped_output_path(Path::new("/tmp/board.kicad_pcb"));
        let name = output.to_string_lossy();
        assert!(name.starts_with("/tmp/board.kicad_pcb"));
        let stamp = &name["/tmp/board.kicad_pcb".len()..];
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: KiboardError = BoardParseError::MissingField("via size".to_string()).into();
        assert!(matches!(err, KiboardError::Parse(_)));
        assert!(err.to_string().contains("via size"));
    }
}
