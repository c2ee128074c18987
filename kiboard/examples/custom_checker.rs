//! Example: driving CheckEngine directly with a checker of your own.
//! Run with: cargo run --example custom_checker [path/to/file.kicad_pcb]

use kiboard::checker::{RuleChecker, TraceWidthChecker};
use kiboard::units::to_mm;
use kiboard::{load_board, BoardItem, CheckEngine};
use std::path::Path;
use std::sync::Arc;

/// Flags board texts taller than a limit. Never fixes anything.
struct MaxTextHeight {
    max_mm: f64,
}

impl RuleChecker for MaxTextHeight {
    fn id(&self) -> &str {
        "max_text_height"
    }

    fn description(&self) -> String {
        format!("Text height <= {} mm", self.max_mm)
    }

    fn check(&self, item: &BoardItem<'_>) -> bool {
        match item {
            BoardItem::Text(text) => to_mm(text.height) <= self.max_mm,
            _ => true,
        }
    }

    fn fix(&self, _item: &mut BoardItem<'_>) {}

    fn explain(&self, item: &BoardItem<'_>) -> String {
        match item {
            BoardItem::Text(text) => format!("Text '{}' is {} mm tall", text.text, to_mm(text.height)),
            other => format!("{} is not governed by {}", other.kind(), self.id()),
        }
    }
}

fn main() -> Result<(), kiboard::KiboardError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/violations_board.kicad_pcb".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example custom_checker [path/to/file.kicad_pcb]");
        std::process::exit(1);
    }

    let mut board = load_board(path)?;
    let mut engine = CheckEngine::new(&mut board, false);
    engine.add_checker(Arc::new(TraceWidthChecker::new(6.0)));
    engine.add_checker(Arc::new(MaxTextHeight { max_mm: 1.2 }));

    let total = engine.run();
    println!("Custom check found {} violation(s) in {}", total, path.display());
    if let Some(report) = engine.report() {
        for violation in &report.violations {
            println!("  [{}] {}", violation.checker, violation.message);
        }
    }

    if total > 0 {
        std::process::exit(1);
    }
    Ok(())
}
