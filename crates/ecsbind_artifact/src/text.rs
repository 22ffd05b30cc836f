//! Human readable TOML rendering of the binding tables

use crate::{
    emit::{Artifact, Emitter},
    error::ArtifactError,
};
use ecsbind_core::{ArchetypeBinding, BindingTables, ComponentRecord, SystemRecord};
use serde::Serialize;

pub const TEXT_FORMAT_VERSION: u32 = 1;
pub const TEXT_FILE_NAME: &str = "bindings.toml";

#[derive(Serialize)]
struct Document<'a> {
    format: u32,
    fingerprint: String,
    mask_words: usize,
    global_commands: Vec<&'a str>,
    local_commands: Vec<&'a str>,
    // Arrays of tables have to come after plain values
    components: &'a [ComponentRecord],
    systems: &'a [SystemRecord],
    archetypes: &'a [ArchetypeBinding],
}

/// Writes `bindings.toml`. Masks are rendered as hex strings, most significant word first.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEmitter;

impl Emitter for TextEmitter {
    fn name(&self) -> &'static str {
        "text"
    }

    fn emit(&self, tables: &BindingTables) -> Result<Vec<Artifact>, ArtifactError> {
        let document = Document {
            format: TEXT_FORMAT_VERSION,
            fingerprint: format!("{:#010x}", tables.fingerprint()),
            mask_words: tables.components.width(),
            global_commands: tables
                .global_commands
                .records()
                .iter()
                .map(|c| c.name.as_str())
                .collect(),
            local_commands: tables
                .local_commands
                .records()
                .iter()
                .map(|c| c.name.as_str())
                .collect(),
            components: tables.components.records(),
            systems: &tables.systems,
            archetypes: &tables.archetypes,
        };

        let text = toml::to_string_pretty(&document)
            .map_err(|e| ArtifactError::encode(TEXT_FILE_NAME, e))?;
        Ok(vec![Artifact::new(TEXT_FILE_NAME, text)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml::Value;

    #[test]
    fn document_layout() {
        let tables = crate::tests::sample_tables();
        let artifacts = TextEmitter.emit(&tables).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].file_name, "bindings.toml");

        let text = String::from_utf8(artifacts[0].bytes.clone()).unwrap();
        let document: Value = toml::from_str(&text).unwrap();

        assert_eq!(document["format"].as_integer(), Some(1));
        assert_eq!(document["mask_words"].as_integer(), Some(1));
        assert_eq!(
            document["fingerprint"].as_str().unwrap(),
            format!("{:#010x}", tables.fingerprint())
        );

        let components = document["components"].as_array().unwrap();
        assert_eq!(components.len(), 3);
        assert_eq!(components[2]["name"].as_str(), Some("Health"));
        assert_eq!(components[2]["ordinal"].as_integer(), Some(2));
        assert_eq!(components[2]["mask"].as_str(), Some("0x4"));

        let systems = document["systems"].as_array().unwrap();
        assert_eq!(systems[0]["name"].as_str(), Some("MoveSystem"));
        assert_eq!(systems[0]["resolved_mask"].as_str(), Some("0x3"));

        assert_eq!(document["global_commands"][0].as_str(), Some("SaveGame"));
        assert_eq!(document["local_commands"][0].as_str(), Some("Damage"));
        assert_eq!(document["archetypes"][0]["mask"].as_str(), Some("0x5"));
    }

    #[test]
    fn empty_tables() {
        let tables = crate::tests::empty_tables();
        let artifacts = TextEmitter.emit(&tables).unwrap();
        let text = String::from_utf8(artifacts[0].bytes.clone()).unwrap();
        let document: Value = toml::from_str(&text).unwrap();

        assert_eq!(document["mask_words"].as_integer(), Some(0));
        assert!(document
            .get("components")
            .and_then(Value::as_array)
            .map_or(true, Vec::is_empty));
    }
}
