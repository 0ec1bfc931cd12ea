//! Fieldfare Forms crate - block graph resolution, text assembly, and field lookup.
//!
//! Turns the flat, id-cross-referenced block set produced by a document
//! analysis engine into a field-name to values map, and provides the fuzzy
//! lookup used to pick the embedding-source field out of noisy OCR names.

pub mod analysis;
pub mod lookup;
pub mod resolver;
pub mod text;

pub use analysis::{
    AnalysisOutput, AnalysisService, DynAnalysisService, MockAnalysisService, RemoteAnalysisService,
};
pub use lookup::{find_all_values, find_values};
pub use resolver::{resolve_fields, FieldMap};
pub use text::{assemble_text, index_blocks, BlockIndex};
