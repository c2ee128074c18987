//! KiCad board source and sink.

pub mod pcb;
pub mod sexp;
pub mod writer;

pub use pcb::{BoardParseError, BoardParser};
pub use sexp::{NodePath, SExp, SExpError, SExpParser};
pub use writer::{BoardWriteError, BoardWriter};
