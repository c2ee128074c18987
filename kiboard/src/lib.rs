//! Kiboard - manufacturability checks and auto-fixes for KiCad PCB files
//!
//! This library loads a `.kicad_pcb` board, runs a set of rule checkers
//! against its vias, tracks and text annotations, and optionally widens
//! undersized features in place before writing the board back out.
//!
//! # Quick Start
//!
//! ```no_run
//! use kiboard::{CheckOptions, KiboardCore};
//! use std::path::Path;
//!
//! let options = CheckOptions {
//!     via_annular_ring: Some(5.0),
//!     trace_width: Some(6.0),
//!     ..Default::default()
//! };
//! let result = KiboardCore::check_board(Path::new("board.kicad_pcb"), &options).unwrap();
//!
//! for violation in &result.report.violations {
//!     println!("{}: {}", violation.checker, violation.message);
//! }
//! ```
//!
//! # Features
//!
//! - **Via checks**: minimum annular ring and minimum drill width
//! - **Track checks**: minimum trace width for segments and vias
//! - **Text checks**: minimum stroke thickness, glyph width and height
//! - **Fix mode**: raise offending attributes to the threshold and save
//! - **Fab profiles**: built-in design-rule sets of common board houses

pub mod board;
pub mod catalog;
pub mod checker;
pub mod core;
pub mod parser;
pub mod units;

// Re-export main types
pub use board::{Board, BoardItem, ElementKind};
pub use catalog::{builtin_profiles, find_profile, SpecProfile};
pub use checker::{CheckEngine, RuleChecker, RunReport, Violation};
pub use core::{timestamped_output_path, CheckOptions, CheckResult, KiboardCore, KiboardError};
pub use parser::{BoardParser, BoardWriter};
pub use units::Length;

/// Load a board file (convenience wrapper).
pub fn load_board(path: &std::path::Path) -> Result<Board, KiboardError> {
    BoardParser::load(path).map_err(KiboardError::from)
}

/// Save a board back to disk (convenience wrapper).
pub fn save_board(board: &Board, path: &std::path::Path) -> Result<(), KiboardError> {
    BoardWriter::save(board, path).map_err(KiboardError::from)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Board, BoardItem, CheckEngine, CheckOptions, CheckResult, KiboardCore, KiboardError,
        Length, RuleChecker, RunReport,
    };
}
