//! Uniform element view handed to rule checkers.

use super::{Graphic, Module, Pad, Point, TextAnnotation, TrackSegment, Via};
use crate::units::Length;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutable view of one board element.
///
/// The set of kinds is closed; checkers match on the tag and pass anything
/// they do not govern.
#[derive(Debug)]
pub enum BoardItem<'a> {
    Module(&'a mut Module),
    Pad(&'a mut Pad),
    Text(&'a mut TextAnnotation),
    Graphic(&'a mut Graphic),
    Track(&'a mut TrackSegment),
    Via(&'a mut Via),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Module,
    Pad,
    Text,
    Graphic,
    Track,
    Via,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Module => "module",
            ElementKind::Pad => "pad",
            ElementKind::Text => "text",
            ElementKind::Graphic => "graphic",
            ElementKind::Track => "track",
            ElementKind::Via => "via",
        };
        f.write_str(name)
    }
}

impl BoardItem<'_> {
    pub fn kind(&self) -> ElementKind {
        match self {
            BoardItem::Module(_) => ElementKind::Module,
            BoardItem::Pad(_) => ElementKind::Pad,
            BoardItem::Text(_) => ElementKind::Text,
            BoardItem::Graphic(_) => ElementKind::Graphic,
            BoardItem::Track(_) => ElementKind::Track,
            BoardItem::Via(_) => ElementKind::Via,
        }
    }

    /// Anchor position used in diagnostics.
    pub fn location(&self) -> Option<Point> {
        match self {
            BoardItem::Module(module) => Some(module.position),
            BoardItem::Pad(pad) => Some(pad.position),
            BoardItem::Text(text) => Some(text.position),
            BoardItem::Graphic(_) => None,
            BoardItem::Track(segment) => Some(segment.start),
            BoardItem::Via(via) => Some(via.position),
        }
    }

    /// Width of the element's track facet: segments, and vias (outer copper).
    pub fn track_width(&self) -> Option<Length> {
        match self {
            BoardItem::Track(segment) => Some(segment.width),
            BoardItem::Via(via) => Some(via.width),
            _ => None,
        }
    }

    pub fn set_track_width(&mut self, width: Length) {
        match self {
            BoardItem::Track(segment) => segment.width = width,
            BoardItem::Via(via) => via.width = width,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::from_mils;

    #[test]
    fn test_track_facet() {
        let mut via = Via::new(from_mils(10.0), from_mils(20.0));
        let mut item = BoardItem::Via(&mut via);
        assert_eq!(item.track_width(), Some(from_mils(20.0)));
        item.set_track_width(from_mils(22.0));
        assert_eq!(via.width, from_mils(22.0));

        let mut pad = Pad::new("1");
        let mut item = BoardItem::Pad(&mut pad);
        assert_eq!(item.track_width(), None);
        item.set_track_width(from_mils(22.0));
        assert_eq!(item.kind(), ElementKind::Pad);
    }
}
