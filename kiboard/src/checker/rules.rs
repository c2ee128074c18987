use super::RuleChecker;
use crate::board::{BoardItem, TextAnnotation, Via};
use crate::units::{from_mils_ceil, from_mm_ceil, to_mils, to_mm, Length};

/// Minimum radial copper around a via hole, in mils.
#[derive(Debug, Clone)]
pub struct AnnularRingChecker {
    min_annular_ring: f64,
}

impl AnnularRingChecker {
    pub fn new(min_annular_ring_mils: f64) -> Self {
        Self {
            min_annular_ring: min_annular_ring_mils,
        }
    }

    pub fn min_annular_ring(&self) -> f64 {
        self.min_annular_ring
    }

    fn annular_ring_mils(drill: Length, width: Length) -> f64 {
        (to_mils(width) - to_mils(drill)) / 2.0
    }

    fn passes(&self, via: &Via) -> bool {
        Self::annular_ring_mils(via.drill, via.width) >= self.min_annular_ring
    }
}

impl RuleChecker for AnnularRingChecker {
    fn id(&self) -> &str {
        "via_annular_ring"
    }

    fn description(&self) -> String {
        format!("Via annular ring >= {} mils", self.min_annular_ring)
    }

    fn check(&self, item: &BoardItem<'_>) -> bool {
        match item {
            BoardItem::Via(via) => self.passes(via),
            _ => true,
        }
    }

    fn fix(&self, item: &mut BoardItem<'_>) {
        let BoardItem::Via(via) = item else {
            return;
        };
        if self.passes(via) {
            return;
        }
        // Widen around the existing hole; the drill is never reduced
        let mut width = from_mils_ceil(to_mils(via.drill) + 2.0 * self.min_annular_ring);
        while Self::annular_ring_mils(via.drill, width) < self.min_annular_ring {
            match width.checked_add(Length::from_nm(1)) {
                Some(next) => width = next,
                None => break,
            }
        }
        tracing::debug!("Widening via at {} from {} to {}", via.position, via.width, width);
        via.width = width;
    }

    fn explain(&self, item: &BoardItem<'_>) -> String {
        match item {
            BoardItem::Via(via) => format!(
                "Fails annular ring test: Via at {}: {:.3} mils drill / {:.3} mils width - annular ring {:.3} mils (minimum {})",
                via.position,
                to_mils(via.drill),
                to_mils(via.width),
                Self::annular_ring_mils(via.drill, via.width),
                self.min_annular_ring
            ),
            other => format!("{} is not governed by {}", other.kind(), self.id()),
        }
    }
}

/// Minimum via drill diameter, in mils.
#[derive(Debug, Clone)]
pub struct ViaDrillWidthChecker {
    min_drill_width: f64,
}

impl ViaDrillWidthChecker {
    pub fn new(min_drill_width_mils: f64) -> Self {
        Self {
            min_drill_width: min_drill_width_mils,
        }
    }

    pub fn min_drill_width(&self) -> f64 {
        self.min_drill_width
    }
}

impl RuleChecker for ViaDrillWidthChecker {
    fn id(&self) -> &str {
        "via_drill_width"
    }

    fn description(&self) -> String {
        format!("Via drill >= {} mils", self.min_drill_width)
    }

    fn check(&self, item: &BoardItem<'_>) -> bool {
        match item {
            BoardItem::Via(via) => to_mils(via.drill) >= self.min_drill_width,
            _ => true,
        }
    }

    fn fix(&self, item: &mut BoardItem<'_>) {
        if let BoardItem::Via(via) = item {
            if to_mils(via.drill) < self.min_drill_width {
                via.drill = from_mils_ceil(self.min_drill_width);
            }
        }
    }

    fn explain(&self, item: &BoardItem<'_>) -> String {
        match item {
            BoardItem::Via(via) => format!(
                "Via at {}: drill is only {:.3} mils (minimum {})",
                via.position,
                to_mils(via.drill),
                self.min_drill_width
            ),
            other => format!("{} is not governed by {}", other.kind(), self.id()),
        }
    }
}

/// Minimum copper track width, in mils.
///
/// Applies to track segments and to the track facet of vias.
#[derive(Debug, Clone)]
pub struct TraceWidthChecker {
    min_trace_width: f64,
}

impl TraceWidthChecker {
    pub fn new(min_trace_width_mils: f64) -> Self {
        Self {
            min_trace_width: min_trace_width_mils,
        }
    }

    pub fn min_trace_width(&self) -> f64 {
        self.min_trace_width
    }
}

impl RuleChecker for TraceWidthChecker {
    fn id(&self) -> &str {
        "trace_width"
    }

    fn description(&self) -> String {
        format!("Trace width >= {} mils", self.min_trace_width)
    }

    fn check(&self, item: &BoardItem<'_>) -> bool {
        match item.track_width() {
            Some(width) => to_mils(width) >= self.min_trace_width,
            None => true,
        }
    }

    fn fix(&self, item: &mut BoardItem<'_>) {
        if let Some(width) = item.track_width() {
            if to_mils(width) < self.min_trace_width {
                item.set_track_width(from_mils_ceil(self.min_trace_width));
            }
        }
    }

    fn explain(&self, item: &BoardItem<'_>) -> String {
        let location = item
            .location()
            .map(|p| format!(" at {}", p))
            .unwrap_or_default();
        match item.track_width() {
            Some(width) => format!(
                "Trace width{} is only {:.3} mils (minimum {})",
                location,
                to_mils(width),
                self.min_trace_width
            ),
            None => format!("{} is not governed by {}", item.kind(), self.id()),
        }
    }
}

/// Minimum silkscreen text stroke and glyph size, in millimetres.
#[derive(Debug, Clone)]
pub struct TextChecker {
    min_thickness: f64,
    min_width: f64,
    min_height: f64,
}

impl TextChecker {
    pub fn new(min_thickness_mm: f64, min_width_mm: f64, min_height_mm: f64) -> Self {
        Self {
            min_thickness: min_thickness_mm,
            min_width: min_width_mm,
            min_height: min_height_mm,
        }
    }

    pub fn thresholds(&self) -> (f64, f64, f64) {
        (self.min_thickness, self.min_width, self.min_height)
    }

    fn passes(&self, text: &TextAnnotation) -> bool {
        to_mm(text.thickness) >= self.min_thickness
            && to_mm(text.width) >= self.min_width
            && to_mm(text.height) >= self.min_height
    }
}

impl RuleChecker for TextChecker {
    fn id(&self) -> &str {
        "text_dimensions"
    }

    fn description(&self) -> String {
        format!(
            "Text thickness/width/height >= {}/{}/{} mm",
            self.min_thickness, self.min_width, self.min_height
        )
    }

    fn check(&self, item: &BoardItem<'_>) -> bool {
        match item {
            BoardItem::Text(text) => self.passes(text),
            _ => true,
        }
    }

    fn fix(&self, item: &mut BoardItem<'_>) {
        let BoardItem::Text(text) = item else {
            return;
        };
        if to_mm(text.thickness) < self.min_thickness {
            text.set_thickness(from_mm_ceil(self.min_thickness));
        }
        if to_mm(text.width) < self.min_width {
            text.set_width(from_mm_ceil(self.min_width));
        }
        if to_mm(text.height) < self.min_height {
            text.set_height(from_mm_ceil(self.min_height));
        }
    }

    fn explain(&self, item: &BoardItem<'_>) -> String {
        match item {
            BoardItem::Text(text) => format!(
                "Text '{}' at {}: thickness/width/height are only {}/{}/{} mm",
                text.text,
                text.position,
                to_mm(text.thickness),
                to_mm(text.width),
                to_mm(text.height)
            ),
            other => format!("{} is not governed by {}", other.kind(), self.id()),
        }
    }
}
