use crate::error::ArtifactError;
use ecsbind_core::BindingTables;

/// A named output file, held in memory until it's published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Turns binding tables into files.
///
/// Emitters are pure: they never touch the filesystem. Writing is done by [`crate::Stage`].
pub trait Emitter: Send + Sync {
    /// Short name, as used in the manifest's `emit` list.
    fn name(&self) -> &'static str;

    fn emit(&self, tables: &BindingTables) -> Result<Vec<Artifact>, ArtifactError>;
}

/// Looks up one of the built-in emitters by its manifest name.
pub fn emitter_by_name(name: &str) -> Option<Box<dyn Emitter>> {
    match name {
        "text" => Some(Box::new(crate::TextEmitter)),
        "binary" => Some(Box::new(crate::BinaryEmitter)),
        _ => None,
    }
}

/// Runs every emitter, rejecting artifacts with colliding file names.
pub fn emit_all(
    emitters: &[Box<dyn Emitter>],
    tables: &BindingTables,
) -> Result<Vec<Artifact>, ArtifactError> {
    let mut artifacts: Vec<Artifact> = Vec::new();
    for emitter in emitters {
        for artifact in emitter.emit(tables)? {
            if artifacts.iter().any(|a| a.file_name == artifact.file_name) {
                return Err(ArtifactError::DuplicateArtifact(artifact.file_name));
            }
            log::debug!(
                "Emitter `{}` produced `{}` ({} bytes)",
                emitter.name(),
                artifact.file_name,
                artifact.bytes.len()
            );
            artifacts.push(artifact);
        }
    }
    Ok(artifacts)
}
