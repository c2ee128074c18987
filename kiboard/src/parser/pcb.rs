//! KiCad PCB Loader
//!
//! Builds a [`Board`] from a KiCad s-expression board file (`.kicad_pcb`).
//!
//! Key format details:
//! - All lengths are in millimetres
//! - Components are `module` (KiCad 4-5) or `footprint` (KiCad 6+)
//! - Reference/value texts are `fp_text reference|value` or, from KiCad 8,
//!   `property "Reference"|"Value"`
//! - Font sizes are written `(size HEIGHT WIDTH)`
//! - Tracks are `segment`, `arc` and `via` elements at the top level
//!
//! Every element keeps the path of the node it came from so that the writer
//! can patch the original document in place.

use crate::board::*;
use crate::parser::sexp::{NodePath, SExp, SExpError, SExpParser};
use crate::units::Length;
use std::path::Path;
use thiserror::Error;

/// Glyph size KiCad assumes when a text carries no font size (50 mils).
pub const DEFAULT_TEXT_SIZE: Length = Length::from_nm(1_270_000);

#[derive(Debug, Error)]
pub enum BoardParseError {
    #[error("S-expression parse error: {0}")]
    SExp(#[from] SExpError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid board format: {0}")]
    InvalidFormat(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Loader for KiCad s-expression boards (KiCad 4 through 8).
pub struct BoardParser;

impl BoardParser {
    pub fn load(path: &Path) -> Result<Board, BoardParseError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content, &path.display().to_string())
    }

    pub fn parse_str(content: &str, filename: &str) -> Result<Board, BoardParseError> {
        let root = SExpParser::new(content).parse()?;

        let tag = root
            .tag()
            .ok_or_else(|| BoardParseError::InvalidFormat("Expected kicad_pcb root".to_string()))?;
        if tag != "kicad_pcb" {
            return Err(BoardParseError::InvalidFormat(format!(
                "Expected kicad_pcb, found {}",
                tag
            )));
        }

        let default_via_drill = root
            .find("setup")
            .and_then(|setup| Self::get_length(setup, "via_drill"));

        let mut board = Board::new(filename);
        board.version = Self::get_string_value(&root, "version");

        let items = root.as_list().unwrap_or_default();
        for (index, item) in items.iter().enumerate().skip(1) {
            let path = NodePath::root().child(index);
            let Some(tag) = item.tag() else {
                continue;
            };
            match tag {
                "module" | "footprint" => {
                    board.modules.push(Self::parse_module(item, path)?);
                }
                "gr_text" | "gr_text_box" => {
                    let text = Self::parse_text(item, TextKind::Board, 1, path)?;
                    board.drawings.push(Drawing::Text(text));
                }
                "gr_line" | "gr_arc" | "gr_circle" | "gr_rect" | "gr_poly" | "gr_curve"
                | "gr_bbox" | "dimension" => {
                    board.drawings.push(Drawing::Graphic(Self::parse_graphic(item, tag)));
                }
                "segment" | "arc" => {
                    board.tracks.push(Track::Segment(Self::parse_segment(item, path)?));
                }
                "via" => {
                    board
                        .tracks
                        .push(Track::Via(Self::parse_via(item, default_via_drill, path)?));
                }
                _ => {
                    // Nets, zones, setup and the rest are not inspected
                }
            }
        }

        tracing::debug!(
            "Loaded {}: {} modules, {} drawings, {} tracks",
            filename,
            board.modules.len(),
            board.drawings.len(),
            board.tracks.len()
        );

        board.document = Some(root);
        Ok(board)
    }

    fn get_string_value(sexp: &SExp, key: &str) -> Option<String> {
        sexp.get(key).and_then(|exp| {
            if let Some(list) = exp.as_list() {
                list.get(1).and_then(|v| v.as_atom()).map(|s| s.to_string())
            } else {
                exp.as_atom().map(|s| s.to_string())
            }
        })
    }

    fn get_length(sexp: &SExp, key: &str) -> Option<Length> {
        Self::get_string_value(sexp, key).and_then(|s| Length::parse_mm(&s))
    }

    fn get_int_value(sexp: &SExp, key: &str) -> Option<u32> {
        Self::get_string_value(sexp, key).and_then(|s| s.parse().ok())
    }

    /// Two numeric values following `key`, e.g. `(at x y [angle])`.
    fn get_pair(sexp: &SExp, key: &str) -> Option<(Length, Length)> {
        let list = sexp.find(key)?.as_list()?;
        let first = list.get(1)?.as_atom().and_then(Length::parse_mm)?;
        let second = list.get(2)?.as_atom().and_then(Length::parse_mm)?;
        Some((first, second))
    }

    fn get_point(sexp: &SExp, key: &str) -> Option<Point> {
        Self::get_pair(sexp, key).map(|(x, y)| Point::new(x, y))
    }

    fn parse_module(sexp: &SExp, path: NodePath) -> Result<Module, BoardParseError> {
        let list = sexp
            .as_list()
            .ok_or_else(|| BoardParseError::InvalidFormat("Module must be a list".to_string()))?;

        let library_id = list
            .get(1)
            .and_then(|a| a.as_atom())
            .unwrap_or("")
            .to_string();
        let layer = Self::get_string_value(sexp, "layer").unwrap_or_else(|| "F.Cu".to_string());
        let position = Self::get_point(sexp, "at").unwrap_or_default();

        let mut reference = None;
        let mut value = None;
        let mut pads = Vec::new();

        for (index, child) in list.iter().enumerate().skip(1) {
            let child_path = path.child(index);
            match child.tag() {
                Some("fp_text") | Some("property") => {
                    let kind = match child.as_list().and_then(|l| l.get(1)).and_then(|a| a.as_atom()) {
                        Some("reference") | Some("Reference") => TextKind::Reference,
                        Some("value") | Some("Value") => TextKind::Value,
                        _ => continue,
                    };
                    let slot = match kind {
                        TextKind::Reference => &mut reference,
                        _ => &mut value,
                    };
                    // fp_text wins over a later duplicate property
                    if slot.is_none() {
                        *slot = Some(Self::parse_text(child, kind, 2, child_path)?);
                    }
                }
                Some("pad") => pads.push(Self::parse_pad(child)?),
                _ => {}
            }
        }

        let reference = reference.ok_or_else(|| {
            BoardParseError::MissingField(format!("reference text of module {}", library_id))
        })?;
        let value = value.ok_or_else(|| {
            BoardParseError::MissingField(format!("value text of module {}", library_id))
        })?;

        Ok(Module {
            library_id,
            layer,
            position,
            pads,
            reference,
            value,
            node: Some(path),
        })
    }

    fn parse_pad(sexp: &SExp) -> Result<Pad, BoardParseError> {
        let list = sexp
            .as_list()
            .ok_or_else(|| BoardParseError::InvalidFormat("Pad must be a list".to_string()))?;

        if list.len() < 4 {
            return Err(BoardParseError::InvalidFormat(
                "Pad requires number, type, shape".to_string(),
            ));
        }

        let number = list[1].as_atom().unwrap_or("").to_string();

        let pad_type = match list[2].as_atom().unwrap_or("") {
            "thru_hole" => PadType::ThruHole,
            "smd" => PadType::Smd,
            "connect" => PadType::Connect,
            "np_thru_hole" => PadType::NpThruHole,
            _ => PadType::Smd,
        };

        let shape = match list[3].as_atom().unwrap_or("") {
            "circle" => PadShape::Circle,
            "rect" => PadShape::Rect,
            "oval" => PadShape::Oval,
            "trapezoid" => PadShape::Trapezoid,
            "roundrect" => PadShape::RoundRect,
            "custom" => PadShape::Custom,
            _ => PadShape::Circle,
        };

        // (drill 0.8) or (drill oval 0.8 1.2): first numeric value is the diameter
        let drill = sexp.find("drill").and_then(|d| {
            d.as_list()?
                .iter()
                .skip(1)
                .filter_map(|v| v.as_atom())
                .find_map(Length::parse_mm)
        });

        Ok(Pad {
            number,
            pad_type,
            shape,
            position: Self::get_point(sexp, "at").unwrap_or_default(),
            size: Self::get_pair(sexp, "size").unwrap_or_default(),
            drill,
        })
    }

    /// `content_index` is the position of the text body in the list:
    /// 1 for `gr_text`, 2 for `fp_text <kind>` and `property <name>`.
    fn parse_text(
        sexp: &SExp,
        kind: TextKind,
        content_index: usize,
        path: NodePath,
    ) -> Result<TextAnnotation, BoardParseError> {
        let list = sexp
            .as_list()
            .ok_or_else(|| BoardParseError::InvalidFormat("Text must be a list".to_string()))?;
        let text = list
            .get(content_index)
            .and_then(|a| a.as_atom())
            .ok_or_else(|| BoardParseError::MissingField("text content".to_string()))?
            .to_string();

        let font = sexp.find("effects").and_then(|e| e.find("font"));
        let (height, width) = font
            .and_then(|f| Self::get_pair(f, "size"))
            .unwrap_or((DEFAULT_TEXT_SIZE, DEFAULT_TEXT_SIZE));
        // Absent thickness is KiCad's automatic pen width, stored as 0
        let thickness = font
            .and_then(|f| Self::get_length(f, "thickness"))
            .unwrap_or(Length::ZERO);

        Ok(TextAnnotation {
            kind,
            text,
            layer: Self::get_string_value(sexp, "layer").unwrap_or_default(),
            position: Self::get_point(sexp, "at")
                .or_else(|| Self::get_point(sexp, "start"))
                .unwrap_or_default(),
            thickness,
            width,
            height,
            node: Some(path),
        })
    }

    fn parse_graphic(sexp: &SExp, tag: &str) -> Graphic {
        let kind = match tag {
            "gr_line" => GraphicKind::Line,
            "gr_arc" => GraphicKind::Arc,
            "gr_circle" => GraphicKind::Circle,
            "gr_rect" => GraphicKind::Rect,
            "gr_poly" => GraphicKind::Polygon,
            "gr_curve" => GraphicKind::Curve,
            "dimension" => GraphicKind::Dimension,
            _ => GraphicKind::Other,
        };

        Graphic {
            kind,
            layer: Self::get_string_value(sexp, "layer").unwrap_or_default(),
        }
    }

    fn parse_segment(sexp: &SExp, path: NodePath) -> Result<TrackSegment, BoardParseError> {
        let start = Self::get_point(sexp, "start")
            .ok_or_else(|| BoardParseError::MissingField("track start".to_string()))?;
        let end = Self::get_point(sexp, "end")
            .ok_or_else(|| BoardParseError::MissingField("track end".to_string()))?;
        let width = Self::get_length(sexp, "width")
            .ok_or_else(|| BoardParseError::MissingField("track width".to_string()))?;

        Ok(TrackSegment {
            start,
            end,
            mid: Self::get_point(sexp, "mid"),
            width,
            layer: Self::get_string_value(sexp, "layer").unwrap_or_default(),
            net: Self::get_int_value(sexp, "net").unwrap_or(0),
            node: Some(path),
        })
    }

    fn parse_via(
        sexp: &SExp,
        default_drill: Option<Length>,
        path: NodePath,
    ) -> Result<Via, BoardParseError> {
        let width = Self::get_length(sexp, "size")
            .ok_or_else(|| BoardParseError::MissingField("via size".to_string()))?;
        let drill = Self::get_length(sexp, "drill")
            .or(default_drill)
            .ok_or_else(|| BoardParseError::MissingField("via drill".to_string()))?;

        let layers = sexp
            .find("layers")
            .and_then(|l| l.as_list())
            .map(|l| {
                let start = l.get(1).and_then(|v| v.as_atom()).unwrap_or("F.Cu");
                let end = l.get(2).and_then(|v| v.as_atom()).unwrap_or("B.Cu");
                (start.to_string(), end.to_string())
            })
            .unwrap_or_else(|| ("F.Cu".to_string(), "B.Cu".to_string()));

        Ok(Via {
            position: Self::get_point(sexp, "at").unwrap_or_default(),
            drill,
            width,
            layers,
            net: Self::get_int_value(sexp, "net").unwrap_or(0),
            node: Some(path),
        })
    }
}
