//! The `ecsbind.toml` workspace manifest

use ecsbind_artifact::{emitter_by_name, Emitter};
use ecsbind_core::{
    ArchetypeDefinition, GenerationOptions, Markers, RetirementPolicy, UnresolvedPolicy,
};
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const MANIFEST_FILE_NAME: &str = "ecsbind.toml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("couldn't read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("couldn't parse `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown emitter `{0}` (expected `text` or `binary`)")]
    UnknownEmitter(String),
    #[error("no emitters configured")]
    NoEmitters,
}

/// Reads and parses a TOML file.
pub(crate) fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ManifestError> {
    let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_owned(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ManifestError::Parse {
        path: path.to_owned(),
        source,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Symbol dumps of the compilation units, relative to the manifest.
    #[serde(default)]
    pub units: Vec<PathBuf>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    pub prior_mapping: Option<PathBuf>,
    #[serde(default)]
    pub retire_missing: bool,
    #[serde(default)]
    pub omit_unresolved_systems: bool,
    #[serde(default = "default_emit")]
    pub emit: Vec<String>,
    #[serde(default)]
    pub markers: Markers,
    #[serde(default)]
    pub archetypes: Vec<ArchetypeDefinition>,
}

fn default_output() -> PathBuf {
    PathBuf::from("Generated")
}

fn default_emit() -> Vec<String> {
    vec!["text".into(), "binary".into()]
}

impl Manifest {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            markers: self.markers.clone(),
            retirement: if self.retire_missing {
                RetirementPolicy::Retire
            } else {
                RetirementPolicy::Reserve
            },
            unresolved: if self.omit_unresolved_systems {
                UnresolvedPolicy::Omit
            } else {
                UnresolvedPolicy::Abort
            },
        }
    }

    pub fn emitters(&self) -> Result<Vec<Box<dyn Emitter>>, ManifestError> {
        if self.emit.is_empty() {
            return Err(ManifestError::NoEmitters);
        }
        self.emit
            .iter()
            .map(|name| {
                emitter_by_name(name).ok_or_else(|| ManifestError::UnknownEmitter(name.clone()))
            })
            .collect()
    }
}

/// A located and parsed manifest.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Directory containing the manifest. Every relative path is resolved against it.
    pub root: PathBuf,
    pub manifest: Manifest,
}

impl Workspace {
    /// Loads the manifest at `path`, or `path/ecsbind.toml` if `path` is a directory.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let manifest_path = if path.is_dir() {
            path.join(MANIFEST_FILE_NAME)
        } else {
            path.to_owned()
        };
        let manifest = read_toml(&manifest_path)?;
        let root = match manifest_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_owned(),
            _ => PathBuf::from("."),
        };

        Ok(Self { root, manifest })
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    pub fn unit_paths(&self) -> Vec<PathBuf> {
        self.manifest.units.iter().map(|p| self.resolve(p)).collect()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.manifest.output)
    }

    pub fn prior_mapping_path(&self) -> Option<PathBuf> {
        self.manifest.prior_mapping.as_deref().map(|p| self.resolve(p))
    }
}
