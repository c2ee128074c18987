//! Check-fix engine
//!
//! Runs each registered checker, in registration order, over every element
//! of a board:
//!
//! ```text
//! modules -> each module's pads -> each module's reference/value text
//!         -> drawings -> tracks
//! ```
//!
//! Failures are counted before any fix is applied. Fixes mutate the board in
//! place, so a later checker sees what an earlier one changed.

use super::RuleChecker;
use crate::board::{Board, BoardItem, ElementKind, Point};
use serde::Serialize;
use std::sync::Arc;

/// Number of elements visited by one checker, per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InspectionCounts {
    pub modules: usize,
    pub pads: usize,
    /// Module reference and value texts
    pub texts: usize,
    pub drawings: usize,
    pub tracks: usize,
}

impl InspectionCounts {
    pub fn total(&self) -> usize {
        self.modules + self.pads + self.texts + self.drawings + self.tracks
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub checker: String,
    pub element: ElementKind,
    pub location: Option<Point>,
    pub message: String,
    pub fixed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckerReport {
    pub checker: String,
    pub description: String,
    pub errors: usize,
    pub fixed: usize,
    pub inspected: InspectionCounts,
}

/// Outcome of one [`CheckEngine::run`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub fix_mode: bool,
    pub checkers: Vec<CheckerReport>,
    pub violations: Vec<Violation>,
    pub total_errors: usize,
    /// Violations left after a fix run, when [`CheckEngine::verify`] was called.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual_errors: Option<usize>,
}

impl RunReport {
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    pub fn errors_for(&self, checker_id: &str) -> usize {
        self.checkers
            .iter()
            .filter(|c| c.checker == checker_id)
            .map(|c| c.errors)
            .sum()
    }
}

pub struct CheckEngine<'b> {
    board: &'b mut Board,
    fix: bool,
    checkers: Vec<Arc<dyn RuleChecker>>,
    report: Option<RunReport>,
}

impl<'b> CheckEngine<'b> {
    pub fn new(board: &'b mut Board, fix: bool) -> Self {
        Self {
            board,
            fix,
            checkers: Vec::new(),
            report: None,
        }
    }

    /// Append a checker. Registration order is execution order; the same
    /// checker may be registered more than once.
    pub fn add_checker(&mut self, checker: Arc<dyn RuleChecker>) {
        self.checkers.push(checker);
    }

    pub fn checkers(&self) -> &[Arc<dyn RuleChecker>] {
        &self.checkers
    }

    pub fn fix_mode(&self) -> bool {
        self.fix
    }

    /// Check every element against every checker; returns the grand total
    /// of failures across all checkers.
    pub fn run(&mut self) -> usize {
        let mut report = RunReport {
            fix_mode: self.fix,
            ..Default::default()
        };

        for checker in &self.checkers {
            tracing::info!("Running {}", checker.description());
            let fix = self.fix;
            let mut errors = 0;
            let mut fixed = 0;
            let violations = &mut report.violations;

            let inspected = traverse(self.board, |item| {
                if process(checker.as_ref(), item, fix, violations) {
                    return;
                }
                errors += 1;
                if fix {
                    fixed += 1;
                }
            });

            tracing::info!(
                "Found {} errors in {} modules, {} pads, {} text (ref/value), {} drawings, {} tracks inspected.",
                errors,
                inspected.modules,
                inspected.pads,
                inspected.texts,
                inspected.drawings,
                inspected.tracks
            );

            report.total_errors += errors;
            report.checkers.push(CheckerReport {
                checker: checker.id().to_string(),
                description: checker.description(),
                errors,
                fixed,
                inspected,
            });
        }

        tracing::info!(
            "Total: {} errors from {} checker(s){}",
            report.total_errors,
            self.checkers.len(),
            if self.fix { ", fixes applied" } else { "" }
        );

        let total = report.total_errors;
        self.report = Some(report);
        total
    }

    /// Grand total of the last run; `None` before the first run.
    pub fn total_errors(&self) -> Option<usize> {
        self.report.as_ref().map(|r| r.total_errors)
    }

    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    pub fn into_report(self) -> Option<RunReport> {
        self.report
    }

    /// Re-check the board with every checker without fixing anything.
    ///
    /// Fixes of one checker can undo the work of an earlier one (a drill
    /// raised after the annular ring was sized, for instance); this counts
    /// what is still failing. The count is stored in the last report but
    /// does not change its total.
    pub fn verify(&mut self) -> usize {
        let mut residual = 0;
        for checker in &self.checkers {
            traverse(self.board, |item| {
                if !checker.check(item) {
                    residual += 1;
                    tracing::warn!("Still failing {}: {}", checker.id(), checker.explain(item));
                }
            });
        }
        if let Some(report) = self.report.as_mut() {
            report.residual_errors = Some(residual);
        }
        residual
    }
}

/// Check one element, fixing it on failure when `fix` is set.
fn process(
    checker: &dyn RuleChecker,
    item: &mut BoardItem<'_>,
    fix: bool,
    violations: &mut Vec<Violation>,
) -> bool {
    if checker.check(item) {
        tracing::debug!("{} passed for {}", checker.id(), item.kind());
        return true;
    }

    let message = checker.explain(item);
    tracing::info!("{}", message);
    let element = item.kind();
    let location = item.location();

    if fix {
        checker.fix(item);
    }

    violations.push(Violation {
        checker: checker.id().to_string(),
        element,
        location,
        message,
        fixed: fix,
    });
    false
}

/// Visit every element once, in the fixed traversal order.
fn traverse<F>(board: &mut Board, mut visit: F) -> InspectionCounts
where
    F: FnMut(&mut BoardItem<'_>),
{
    let mut counts = InspectionCounts::default();

    for module in board.modules.iter_mut() {
        counts.modules += 1;
        visit(&mut BoardItem::Module(&mut *module));

        for pad in module.pads.iter_mut() {
            counts.pads += 1;
            visit(&mut BoardItem::Pad(pad));
        }

        for text in [&mut module.reference, &mut module.value] {
            counts.texts += 1;
            visit(&mut BoardItem::Text(text));
        }
    }

    for drawing in board.drawings.iter_mut() {
        counts.drawings += 1;
        visit(&mut drawing.as_item_mut());
    }

    for track in board.tracks.iter_mut() {
        counts.tracks += 1;
        visit(&mut track.as_item_mut());
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::*;
    use crate::checker::rules::*;
    use crate::units::{from_mils, from_mm};
    use std::sync::Mutex;

    fn text(kind: TextKind, s: &str, mm: f64) -> TextAnnotation {
        TextAnnotation::new(kind, s, from_mm(0.15), from_mm(mm), from_mm(mm))
    }

    /// Two vias (one failing a 5 mil annular ring), three compliant tracks.
    fn scenario_board() -> Board {
        let mut board = Board::new("scenario");
        board.modules.push(
            Module::new(text(TextKind::Reference, "R1", 1.0), text(TextKind::Value, "10k", 1.0))
                .with_pads(vec![Pad::new("1"), Pad::new("2")]),
        );
        board.tracks.push(Track::Via(Via::new(from_mils(8.0), from_mils(16.0))));
        board.tracks.push(Track::Via(Via::new(from_mils(12.0), from_mils(24.0))));
        for _ in 0..3 {
            board.tracks.push(Track::Segment(TrackSegment::new(from_mils(8.0))));
        }
        board
    }

    #[test]
    fn test_total_errors_before_run() {
        let mut board = scenario_board();
        let engine = CheckEngine::new(&mut board, false);
        assert_eq!(engine.total_errors(), None);
    }

    #[test]
    fn test_scenario_single_annular_ring_failure() {
        let mut board = scenario_board();
        let mut engine = CheckEngine::new(&mut board, false);
        engine.add_checker(Arc::new(AnnularRingChecker::new(5.0)));

        assert_eq!(engine.run(), 1);
        assert_eq!(engine.total_errors(), Some(1));

        let report = engine.report().unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].element, ElementKind::Via);
        assert!(!report.violations[0].fixed);
        assert_eq!(
            report.checkers[0].inspected,
            InspectionCounts {
                modules: 1,
                pads: 2,
                texts: 2,
                drawings: 0,
                tracks: 5,
            }
        );
    }

    #[test]
    fn test_clean_board_has_no_errors() {
        let mut board = scenario_board();
        let mut engine = CheckEngine::new(&mut board, true);
        engine.add_checker(Arc::new(TraceWidthChecker::new(6.0)));
        engine.add_checker(Arc::new(TextChecker::new(0.15, 0.8, 0.8)));
        assert_eq!(engine.run(), 0);
        assert!(!engine.report().unwrap().has_errors());
    }

    #[test]
    fn test_total_is_sum_of_checker_counts() {
        let mut board = scenario_board();
        board.drawings.push(Drawing::Text(text(TextKind::Board, "tiny", 0.5)));
        board.tracks.push(Track::Segment(TrackSegment::new(from_mils(4.0))));

        let mut engine = CheckEngine::new(&mut board, false);
        engine.add_checker(Arc::new(ViaDrillWidthChecker::new(10.0)));
        engine.add_checker(Arc::new(AnnularRingChecker::new(5.0)));
        engine.add_checker(Arc::new(TraceWidthChecker::new(6.0)));
        engine.add_checker(Arc::new(TextChecker::new(0.15, 0.8, 0.8)));

        let total = engine.run();
        let report = engine.report().unwrap();
        assert_eq!(report.errors_for("via_drill_width"), 1);
        assert_eq!(report.errors_for("via_annular_ring"), 1);
        assert_eq!(report.errors_for("trace_width"), 1);
        assert_eq!(report.errors_for("text_dimensions"), 1);
        assert_eq!(total, 4);
        assert_eq!(total, report.checkers.iter().map(|c| c.errors).sum::<usize>());
    }

    #[test]
    fn test_fix_mode_counts_before_fixing() {
        let mut board = scenario_board();
        board.tracks.push(Track::Segment(TrackSegment::new(from_mils(4.0))));

        {
            let mut engine = CheckEngine::new(&mut board, true);
            engine.add_checker(Arc::new(AnnularRingChecker::new(5.0)));
            engine.add_checker(Arc::new(TraceWidthChecker::new(6.0)));
            assert_eq!(engine.run(), 2);
            let report = engine.report().unwrap();
            assert!(report.violations.iter().all(|v| v.fixed));
            assert_eq!(report.checkers[0].fixed, 1);
            assert_eq!(engine.verify(), 0);
        }

        let first_via = board.vias().next().unwrap();
        assert_eq!(first_via.width, from_mils(18.0));
        assert_eq!(board.segments().last().unwrap().width, from_mils(6.0));

        let mut engine = CheckEngine::new(&mut board, true);
        engine.add_checker(Arc::new(AnnularRingChecker::new(5.0)));
        engine.add_checker(Arc::new(TraceWidthChecker::new(6.0)));
        assert_eq!(engine.run(), 0);
    }

    #[test]
    fn test_report_mode_leaves_board_untouched() {
        let mut board = scenario_board();
        let mut engine = CheckEngine::new(&mut board, false);
        engine.add_checker(Arc::new(AnnularRingChecker::new(5.0)));
        engine.run();
        assert_eq!(engine.run(), 1);
        assert_eq!(board.vias().next().unwrap().width, from_mils(16.0));
    }

    #[test]
    fn test_duplicate_checkers_each_count() {
        let mut board = scenario_board();
        let checker: Arc<dyn RuleChecker> = Arc::new(AnnularRingChecker::new(5.0));
        let mut engine = CheckEngine::new(&mut board, false);
        engine.add_checker(checker.clone());
        engine.add_checker(checker);
        assert_eq!(engine.run(), 2);
        assert_eq!(engine.report().unwrap().checkers.len(), 2);
    }

    #[test]
    fn test_later_checker_sees_earlier_fix() {
        // Annular ring first sizes the via for an 8 mil drill; raising the
        // drill afterwards shrinks the ring again.
        let mut board = Board::new("overlap");
        board.tracks.push(Track::Via(Via::new(from_mils(8.0), from_mils(16.0))));

        let mut engine = CheckEngine::new(&mut board, true);
        engine.add_checker(Arc::new(AnnularRingChecker::new(5.0)));
        engine.add_checker(Arc::new(ViaDrillWidthChecker::new(12.0)));
        assert_eq!(engine.run(), 2);
        assert_eq!(engine.verify(), 1);
        assert_eq!(engine.report().unwrap().residual_errors, Some(1));
        assert_eq!(engine.total_errors(), Some(2));

        let via = board.vias().next().unwrap();
        assert_eq!(via.drill, from_mils(12.0));
        assert_eq!(via.width, from_mils(18.0));
    }

    /// Records the order in which elements reach a checker.
    struct Recorder(Mutex<Vec<ElementKind>>);

    impl RuleChecker for Recorder {
        fn id(&self) -> &str {
            "recorder"
        }

        fn description(&self) -> String {
            "records visits".to_string()
        }

        fn check(&self, item: &BoardItem<'_>) -> bool {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(item.kind());
            }
            true
        }

        fn fix(&self, _item: &mut BoardItem<'_>) {}

        fn explain(&self, _item: &BoardItem<'_>) -> String {
            String::new()
        }
    }

    #[test]
    fn test_traversal_order() {
        let mut board = scenario_board();
        board.drawings.push(Drawing::Graphic(Graphic::default()));
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));

        let mut engine = CheckEngine::new(&mut board, false);
        engine.add_checker(recorder.clone());
        engine.run();

        let seen = recorder.0.lock().unwrap().clone();
        let expected = [
            ElementKind::Module,
            ElementKind::Pad,
            ElementKind::Pad,
            ElementKind::Text,
            ElementKind::Text,
            ElementKind::Graphic,
            ElementKind::Via,
            ElementKind::Via,
            ElementKind::Track,
            ElementKind::Track,
            ElementKind::Track,
        ];
        assert_eq!(seen, expected);
    }
}
