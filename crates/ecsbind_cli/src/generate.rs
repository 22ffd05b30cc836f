//! The generation driver: from a workspace manifest to published binding tables

use crate::{
    dump::DumpSource,
    manifest::{read_toml, ManifestError, Workspace},
    progress::Progress,
    toolchain,
};
use ecsbind_artifact::{emit_all, write_atomic, Stage};
use ecsbind_core::{Generation, PriorMapping, SourceModel};
use ecsbind_utils::{AnyResult, AnyhowResultExt};
use log::*;
use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Number of discovered components.
    pub components: usize,
    pub published: Vec<PathBuf>,
}

/// Runs a whole generation for the workspace.
///
/// `input` and `output` are used for the toolchain prompt, in case there's more than one
/// toolchain to choose from.
pub fn generate<R, W>(
    workspace: &Workspace,
    input: R,
    output: W,
    progress: &dyn Progress,
) -> AnyResult<Report>
where
    R: BufRead,
    W: Write,
{
    let manifest = &workspace.manifest;
    let options = manifest.options();
    let emitters = manifest.emitters()?;

    let toolchains = toolchain::discover(&workspace.root)?;
    let metadata = match toolchain::select(toolchains, input, output)? {
        Some(toolchain) => {
            info!("Using toolchain {} {}", toolchain.name, toolchain.version);
            toolchain.metadata_paths()
        }
        None => {
            info!("No toolchain found, marker types have to be declared in the workspace");
            Vec::new()
        }
    };

    let source = DumpSource::new(workspace.unit_paths(), metadata, progress);
    let metadata = source.referenced_metadata()?;
    let units = source.compilation_units()?;
    info!("Loaded {} compilation units", units.len());

    let prior_path = workspace.prior_mapping_path();
    let prior = match &prior_path {
        Some(path) if path.is_file() => Some(read_prior_mapping(path)?),
        Some(path) => {
            info!("No prior mapping at {}, starting fresh", path.display());
            None
        }
        None => None,
    };

    let generated = Generation::new(&options, &units)
        .with_metadata(&metadata)
        .with_archetypes(&manifest.archetypes)
        .with_prior(prior.as_ref())
        .run()?;
    let components = generated.tables.components.len();

    let output_dir = workspace.output_dir();
    let publish = || -> AnyResult<Vec<PathBuf>> {
        let artifacts = emit_all(&emitters, &generated.tables)?;
        let mut stage = Stage::new(&output_dir)?;
        for artifact in &artifacts {
            stage.write(artifact)?;
        }
        Ok(stage.commit()?)
    };

    let published = match publish() {
        Ok(published) => published,
        Err(err) => {
            error!("Couldn't publish binding tables: {err:#}");
            print_component_count(components);
            return Err(err);
        }
    };
    for path in &published {
        info!("Published {}", path.display());
    }

    // Only advanced once the tables that use it are out
    if let Some(path) = &prior_path {
        let text = toml::to_string_pretty(&generated.mapping)
            .otherwise("couldn't serialize the component mapping")?;
        write_atomic(path, text.as_bytes())?;
        debug!("Wrote component mapping to {}", path.display());
    }

    print_component_count(components);
    Ok(Report {
        components,
        published,
    })
}

fn read_prior_mapping(path: &Path) -> Result<PriorMapping, ManifestError> {
    read_toml(path)
}

fn print_component_count(count: usize) {
    println!("Found components: {count}");
}
