//! Turning binding tables into files
//!
//! [`Emitter`]s render [`ecsbind_core::BindingTables`] into in-memory [`Artifact`]s, and a
//! [`Stage`] publishes a set of artifacts into an output directory all at once.

pub mod binary;
pub mod emit;
pub mod error;
pub mod node;
pub mod stage;
pub mod text;

pub use binary::{read_bindings, BinaryEmitter, DecodedBindings};
pub use emit::{emit_all, emitter_by_name, Artifact, Emitter};
pub use error::ArtifactError;
pub use stage::{write_atomic, Stage};
pub use text::TextEmitter;
