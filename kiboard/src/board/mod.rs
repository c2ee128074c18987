//! Board Model
//!
//! In-memory representation of a PCB layout as seen by the rule checkers.
//! All geometry is in internal units (see [`crate::units`]).
//!
//! A board is created by the KiCad loader (or assembled by hand in tests).
//! Checkers mutate element attributes in place; elements are never added or
//! removed by the checking core.

pub mod item;

pub use item::{BoardItem, ElementKind};

use crate::parser::sexp::{NodePath, SExp};
use crate::units::Length;
use serde::{Deserialize, Serialize};

/// A loaded board layout
#[derive(Debug, Clone, Default)]
pub struct Board {
    pub filename: String,
    pub version: Option<String>,
    pub modules: Vec<Module>,
    pub drawings: Vec<Drawing>,
    pub tracks: Vec<Track>,
    /// Source document the board was loaded from; the writer patches it on save.
    pub(crate) document: Option<SExp>,
}

impl Board {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn vias(&self) -> impl Iterator<Item = &Via> {
        self.tracks.iter().filter_map(|t| match t {
            Track::Via(via) => Some(via),
            Track::Segment(_) => None,
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = &TrackSegment> {
        self.tracks.iter().filter_map(|t| match t {
            Track::Segment(segment) => Some(segment),
            Track::Via(_) => None,
        })
    }

    /// Free-standing texts plus every module's reference and value.
    pub fn texts(&self) -> impl Iterator<Item = &TextAnnotation> {
        let module_texts = self
            .modules
            .iter()
            .flat_map(|m| [&m.reference, &m.value]);
        let board_texts = self.drawings.iter().filter_map(|d| match d {
            Drawing::Text(text) => Some(text),
            Drawing::Graphic(_) => None,
        });
        module_texts.chain(board_texts)
    }

    /// Whether the board still carries the document it was parsed from.
    pub fn has_source_document(&self) -> bool {
        self.document.is_some()
    }
}

/// Position on the board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: Length,
    pub y: Length,
}

impl Point {
    pub fn new(x: Length, y: Length) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x.to_mm_string(), self.y.to_mm_string())
    }
}

/// Placed component (KiCad `module` / `footprint`)
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub library_id: String,
    pub layer: String,
    pub position: Point,
    pub pads: Vec<Pad>,
    pub reference: TextAnnotation,
    pub value: TextAnnotation,
    pub(crate) node: Option<NodePath>,
}

impl Module {
    pub fn new(reference: TextAnnotation, value: TextAnnotation) -> Self {
        Self {
            reference,
            value,
            ..Default::default()
        }
    }

    pub fn with_pads(mut self, pads: Vec<Pad>) -> Self {
        self.pads = pads;
        self
    }

    pub fn reference(&self) -> &TextAnnotation {
        &self.reference
    }

    pub fn value(&self) -> &TextAnnotation {
        &self.value
    }

    pub fn pads(&self) -> &[Pad] {
        &self.pads
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PadType {
    ThruHole,
    #[default]
    Smd,
    Connect,
    NpThruHole,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PadShape {
    #[default]
    Circle,
    Rect,
    Oval,
    Trapezoid,
    RoundRect,
    Custom,
}

/// Connection point on a module. Traversed but not governed by any rule.
#[derive(Debug, Clone, Default)]
pub struct Pad {
    pub number: String,
    pub pad_type: PadType,
    pub shape: PadShape,
    pub position: Point,
    pub size: (Length, Length),
    pub drill: Option<Length>,
}

impl Pad {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextKind {
    Reference,
    Value,
    /// Free-standing board text (`gr_text`)
    #[default]
    Board,
}

/// Silkscreen or reference text
#[derive(Debug, Clone, Default)]
pub struct TextAnnotation {
    pub kind: TextKind,
    pub text: String,
    pub layer: String,
    pub position: Point,
    /// Stroke weight
    pub thickness: Length,
    /// Glyph width
    pub width: Length,
    /// Glyph height
    pub height: Length,
    pub(crate) node: Option<NodePath>,
}

impl TextAnnotation {
    pub fn new(
        kind: TextKind,
        text: impl Into<String>,
        thickness: Length,
        width: Length,
        height: Length,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            thickness,
            width,
            height,
            ..Default::default()
        }
    }

    pub fn thickness(&self) -> Length {
        self.thickness
    }

    pub fn set_thickness(&mut self, thickness: Length) {
        self.thickness = thickness;
    }

    pub fn width(&self) -> Length {
        self.width
    }

    pub fn set_width(&mut self, width: Length) {
        self.width = width;
    }

    pub fn height(&self) -> Length {
        self.height
    }

    pub fn set_height(&mut self, height: Length) {
        self.height = height;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphicKind {
    #[default]
    Line,
    Arc,
    Circle,
    Rect,
    Polygon,
    Curve,
    Dimension,
    Other,
}

/// Non-text board drawing (outline, marking, dimension...)
#[derive(Debug, Clone, Default)]
pub struct Graphic {
    pub kind: GraphicKind,
    pub layer: String,
}

/// Item of the board's drawing collection
#[derive(Debug, Clone)]
pub enum Drawing {
    Text(TextAnnotation),
    Graphic(Graphic),
}

impl Drawing {
    pub fn as_item_mut(&mut self) -> BoardItem<'_> {
        match self {
            Drawing::Text(text) => BoardItem::Text(text),
            Drawing::Graphic(graphic) => BoardItem::Graphic(graphic),
        }
    }
}

/// Conductive trace. Arc tracks carry their midpoint.
#[derive(Debug, Clone, Default)]
pub struct TrackSegment {
    pub start: Point,
    pub end: Point,
    pub mid: Option<Point>,
    pub width: Length,
    pub layer: String,
    pub net: u32,
    pub(crate) node: Option<NodePath>,
}

impl TrackSegment {
    pub fn new(width: Length) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    pub fn is_arc(&self) -> bool {
        self.mid.is_some()
    }

    pub fn width(&self) -> Length {
        self.width
    }

    pub fn set_width(&mut self, width: Length) {
        self.width = width;
    }
}

/// Plated hole between copper layers.
///
/// `width` is the outer copper diameter. It is both the via facet's outer
/// width and the track facet's width.
#[derive(Debug, Clone, Default)]
pub struct Via {
    pub position: Point,
    pub drill: Length,
    pub width: Length,
    pub layers: (String, String),
    pub net: u32,
    pub(crate) node: Option<NodePath>,
}

impl Via {
    pub fn new(drill: Length, width: Length) -> Self {
        Self {
            drill,
            width,
            ..Default::default()
        }
    }

    pub fn drill(&self) -> Length {
        self.drill
    }

    pub fn set_drill(&mut self, drill: Length) {
        self.drill = drill;
    }

    pub fn width(&self) -> Length {
        self.width
    }

    pub fn set_width(&mut self, width: Length) {
        self.width = width;
    }

    /// Radial copper left around the hole.
    pub fn annular_ring(&self) -> Length {
        Length::from_nm((self.width.nm() - self.drill.nm()) / 2)
    }
}

/// Item of the board's track collection
#[derive(Debug, Clone)]
pub enum Track {
    Segment(TrackSegment),
    Via(Via),
}

impl Track {
    pub fn as_item_mut(&mut self) -> BoardItem<'_> {
        match self {
            Track::Segment(segment) => BoardItem::Track(segment),
            Track::Via(via) => BoardItem::Via(via),
        }
    }
}
