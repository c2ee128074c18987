//! Manufacturability rule checking
//!
//! A [`RuleChecker`] decides whether one board element satisfies one rule
//! and, when asked, corrects it. The [`CheckEngine`] applies every
//! registered checker to every element of a board.
//!
//! Checkers filter by element kind: anything a checker does not govern
//! passes, so the engine can hand every element to every checker without
//! per-rule dispatch.

pub mod engine;
pub mod rules;

pub use engine::{CheckEngine, CheckerReport, InspectionCounts, RunReport, Violation};
pub use rules::{AnnularRingChecker, TextChecker, TraceWidthChecker, ViaDrillWidthChecker};

use crate::board::BoardItem;

pub trait RuleChecker: Send + Sync {
    /// Stable identifier, e.g. `via_annular_ring`.
    fn id(&self) -> &str;

    /// Human label including the configured thresholds.
    fn description(&self) -> String;

    /// True when `item` is not governed by this rule or meets it.
    fn check(&self, item: &BoardItem<'_>) -> bool;

    /// Correct `item` so that `check` passes.
    ///
    /// Only called on an element that just failed `check`. Attributes that
    /// already meet their minimum are left alone, and elements of other
    /// kinds are not touched.
    fn fix(&self, item: &mut BoardItem<'_>);

    /// One-line description of why `item` fails, for diagnostics.
    fn explain(&self, item: &BoardItem<'_>) -> String;
}
