//! KiCad PCB Writer
//!
//! Saves a board by patching the document it was loaded from. Only geometry
//! the checkers can change is written: track and via widths, via drills,
//! text font size and thickness. Everything else in the source file is
//! emitted as it was read.

use crate::board::{Board, Drawing, TextAnnotation, Track};
use crate::parser::pcb::DEFAULT_TEXT_SIZE;
use crate::parser::sexp::{NodePath, SExp};
use crate::units::Length;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardWriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Board was not loaded from a file and cannot be written back")]
    NoDocument,
    #[error("Element no longer matches the source document: {0}")]
    Stale(String),
}

pub struct BoardWriter;

impl BoardWriter {
    /// Render the updated document as board file text.
    pub fn render(board: &Board) -> Result<String, BoardWriteError> {
        let mut document = board.document.clone().ok_or(BoardWriteError::NoDocument)?;
        let changed = Self::apply(board, &mut document)?;
        tracing::debug!("Patched {} attribute(s) of {}", changed, board.filename);
        Ok(document.to_pretty_string())
    }

    pub fn save(board: &Board, path: &Path) -> Result<(), BoardWriteError> {
        let content = Self::render(board)?;
        std::fs::write(path, content)?;
        tracing::info!("Saved board to {}", path.display());
        Ok(())
    }

    /// Write element geometry into `document`; returns the number of
    /// attributes that changed.
    fn apply(board: &Board, document: &mut SExp) -> Result<usize, BoardWriteError> {
        let default_via_drill = document
            .find("setup")
            .and_then(|setup| read_length(setup, "via_drill"));
        let mut changed = 0;

        for module in &board.modules {
            for text in [&module.reference, &module.value] {
                changed += Self::write_text(document, text)?;
            }
        }

        for drawing in &board.drawings {
            if let Drawing::Text(text) = drawing {
                changed += Self::write_text(document, text)?;
            }
        }

        for track in &board.tracks {
            match track {
                Track::Segment(segment) => {
                    let Some(node) = Self::node_mut(document, segment.node.as_ref(), &["segment", "arc"])?
                    else {
                        continue;
                    };
                    changed += write_length(node, "width", segment.width, None);
                }
                Track::Via(via) => {
                    let Some(node) = Self::node_mut(document, via.node.as_ref(), &["via"])? else {
                        continue;
                    };
                    changed += write_length(node, "size", via.width, None);
                    changed += write_length(node, "drill", via.drill, default_via_drill);
                }
            }
        }

        Ok(changed)
    }

    fn write_text(document: &mut SExp, text: &TextAnnotation) -> Result<usize, BoardWriteError> {
        let tags: &[&str] = &["fp_text", "property", "gr_text", "gr_text_box"];
        let Some(node) = Self::node_mut(document, text.node.as_ref(), tags)? else {
            return Ok(0);
        };

        let current_font = node.find("effects").and_then(|e| e.find("font"));
        let current_size = current_font
            .and_then(|f| read_pair(f, "size"))
            .unwrap_or((DEFAULT_TEXT_SIZE, DEFAULT_TEXT_SIZE));
        let current_thickness = current_font
            .and_then(|f| read_length(f, "thickness"))
            .unwrap_or(Length::ZERO);

        let size_changed = current_size != (text.height, text.width);
        let thickness_changed = current_thickness != text.thickness;
        if !size_changed && !thickness_changed {
            return Ok(0);
        }

        let font = node
            .ensure_child("effects")
            .and_then(|effects| effects.ensure_child("font"))
            .ok_or_else(|| BoardWriteError::Stale(format!("text '{}'", text.text)))?;
        let mut changed = 0;
        if size_changed {
            font.set_values("size", &[text.height.to_mm_string(), text.width.to_mm_string()]);
            changed += 1;
        }
        if thickness_changed {
            font.set_values("thickness", &[text.thickness.to_mm_string()]);
            changed += 1;
        }
        Ok(changed)
    }

    /// Resolve an element's node; `Ok(None)` for elements created in memory.
    fn node_mut<'a>(
        document: &'a mut SExp,
        path: Option<&NodePath>,
        tags: &[&str],
    ) -> Result<Option<&'a mut SExp>, BoardWriteError> {
        let Some(path) = path else {
            return Ok(None);
        };
        let node = path
            .resolve_mut(document)
            .ok_or_else(|| BoardWriteError::Stale(format!("no node at {:?}", path)))?;
        let found = node.tag().map(str::to_string);
        match found {
            Some(tag) if tags.contains(&tag.as_str()) => Ok(Some(node)),
            other => Err(BoardWriteError::Stale(format!(
                "expected one of {:?}, found {:?}",
                tags, other
            ))),
        }
    }
}

fn read_length(sexp: &SExp, key: &str) -> Option<Length> {
    let list = sexp.find(key)?.as_list()?;
    list.get(1)?.as_atom().and_then(Length::parse_mm)
}

fn read_pair(sexp: &SExp, key: &str) -> Option<(Length, Length)> {
    let list = sexp.find(key)?.as_list()?;
    let first = list.get(1)?.as_atom().and_then(Length::parse_mm)?;
    let second = list.get(2)?.as_atom().and_then(Length::parse_mm)?;
    Some((first, second))
}

/// Set `(key value)` when it differs from the document. `implicit` is the
/// value an absent key stands for.
fn write_length(node: &mut SExp, key: &str, value: Length, implicit: Option<Length>) -> usize {
    let current = read_length(node, key).or(implicit);
    if current == Some(value) {
        return 0;
    }
    node.set_values(key, &[value.to_mm_string()]);
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Track, TrackSegment};
    use crate::parser::pcb::BoardParser;
    use crate::units::{from_mils, from_mm};

    const BOARD: &str = r#"(kicad_pcb (version 4)
  (setup (via_drill 0.4))
  (module R_0805 (at 100 50)
    (fp_text reference R1 (at 0 -1.65) (layer F.SilkS) (effects (font (size 1 1) (thickness 0.1))))
    (fp_text value 10k (at 0 1.75) (layer F.Fab) (effects (font (size 1 1) (thickness 0.15)))))
  (gr_text "rev A" (at 110 60) (layer F.SilkS) (effects (font (size 1.5 1.5))))
  (segment (start 100 50) (end 105 50) (width 0.1016) (layer F.Cu) (net 1))
  (via (at 105 50) (size 0.6) (layers F.Cu B.Cu) (net 1))
)"#;

    #[test]
    fn test_unchanged_board_renders_same_tree() {
        let board = BoardParser::parse_str(BOARD, "t").unwrap();
        let rendered = BoardWriter::render(&board).unwrap();
        let reparsed = crate::parser::sexp::SExpParser::new(&rendered).parse().unwrap();
        assert_eq!(Some(&reparsed), board.document.as_ref());
    }

    #[test]
    fn test_changes_are_written_back() {
        let mut board = BoardParser::parse_str(BOARD, "t").unwrap();
        board.modules[0].reference.thickness = from_mm(0.15);
        if let Some(Drawing::Text(text)) = board.drawings.first_mut() {
            text.thickness = from_mm(0.2);
        }
        for track in &mut board.tracks {
            match track {
                Track::Segment(segment) => segment.width = from_mils(6.0),
                Track::Via(via) => via.drill = from_mm(0.5),
            }
        }

        let rendered = BoardWriter::render(&board).unwrap();
        let reloaded = BoardParser::parse_str(&rendered, "t").unwrap();
        assert_eq!(reloaded.modules[0].reference.thickness, from_mm(0.15));
        assert_eq!(reloaded.modules[0].value.thickness, from_mm(0.15));
        assert_eq!(reloaded.texts().nth(2).unwrap().thickness, from_mm(0.2));
        assert_eq!(reloaded.segments().next().unwrap().width, from_mils(6.0));
        assert_eq!(reloaded.vias().next().unwrap().drill, from_mm(0.5));
        assert!(rendered.contains("(width 0.1524)"));
    }

    #[test]
    fn test_implicit_drill_is_not_materialized() {
        let board = BoardParser::parse_str(BOARD, "t").unwrap();
        let rendered = BoardWriter::render(&board).unwrap();
        assert!(!rendered.contains("(drill"));
    }

    #[test]
    fn test_in_memory_board_cannot_be_written() {
        let mut board = Board::new("memory");
        board.tracks.push(Track::Segment(TrackSegment::new(from_mils(6.0))));
        assert!(matches!(BoardWriter::render(&board), Err(BoardWriteError::NoDocument)));
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.kicad_pcb");
        let board = BoardParser::parse_str(BOARD, "t").unwrap();
        BoardWriter::save(&board, &path).unwrap();
        let reloaded = BoardParser::load(&path).unwrap();
        assert_eq!(reloaded.tracks.len(), 2);
    }
}
