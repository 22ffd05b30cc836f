//! Toolchain discovery and selection
//!
//! A toolchain is a framework package shipped alongside the workspace, under
//! `toolchains/<name>/toolchain.toml`. Its metadata dumps describe the types the framework
//! defines, most importantly the marker types themselves.

use serde::Deserialize;
use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const TOOLCHAINS_DIR: &str = "toolchains";
pub const TOOLCHAIN_FILE_NAME: &str = "toolchain.toml";

#[derive(Debug, Error)]
pub enum ToolchainError {
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
    #[error("no toolchain was selected before the end of input")]
    NoSelection,
    #[error("toolchain prompt failed: {0}")]
    Prompt(#[source] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Toolchain {
    pub name: String,
    pub version: String,
    /// Metadata dumps, relative to the toolchain directory.
    #[serde(default)]
    pub metadata: Vec<PathBuf>,
    #[serde(skip)]
    pub directory: PathBuf,
}

impl Toolchain {
    pub fn metadata_paths(&self) -> Vec<PathBuf> {
        self.metadata.iter().map(|p| self.directory.join(p)).collect()
    }
}

/// Finds every toolchain of the workspace, sorted by directory name.
pub fn discover(workspace_root: &Path) -> Result<Vec<Toolchain>, ToolchainError> {
    let root = workspace_root.join(TOOLCHAINS_DIR);
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let io_error = |path: &Path| {
        let path = path.to_owned();
        move |source: io::Error| ToolchainError::Io { path, source }
    };

    let mut directories = Vec::new();
    for entry in fs::read_dir(&root).map_err(io_error(&root))? {
        let entry = entry.map_err(io_error(&root))?;
        let path = entry.path();
        if path.join(TOOLCHAIN_FILE_NAME).is_file() {
            directories.push(path);
        }
    }
    directories.sort();

    directories
        .into_iter()
        .map(|directory| {
            let path = directory.join(TOOLCHAIN_FILE_NAME);
            let text = fs::read_to_string(&path).map_err(io_error(&path))?;
            let mut toolchain: Toolchain = toml::from_str(&text)
                .map_err(|source| ToolchainError::Parse { path, source })?;
            toolchain.directory = directory;
            Ok(toolchain)
        })
        .collect()
}

/// Picks the toolchain to use. With more than one candidate, the user is asked to pick one by
/// its 1-based number, until a valid answer comes in.
pub fn select<R, W>(
    mut toolchains: Vec<Toolchain>,
    mut input: R,
    mut output: W,
) -> Result<Option<Toolchain>, ToolchainError>
where
    R: BufRead,
    W: Write,
{
    if toolchains.len() <= 1 {
        return Ok(toolchains.pop());
    }

    let prompt = |output: &mut W| -> io::Result<()> {
        writeln!(output, "Multiple toolchains detected, please select one:")?;
        for (i, toolchain) in toolchains.iter().enumerate() {
            writeln!(output, "Toolchain {}", i + 1)?;
            writeln!(output, "    Name: {}", toolchain.name)?;
            writeln!(output, "    Version: {}", toolchain.version)?;
            writeln!(output, "    Path: {}", toolchain.directory.display())?;
        }
        output.flush()
    };
    prompt(&mut output).map_err(ToolchainError::Prompt)?;

    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line).map_err(ToolchainError::Prompt)? == 0 {
            return Err(ToolchainError::NoSelection);
        }

        match line.trim().parse::<usize>() {
            Ok(number) if (1..=toolchains.len()).contains(&number) => {
                return Ok(Some(toolchains.swap_remove(number - 1)));
            }
            _ => {
                writeln!(output, "Input not accepted, try again.").map_err(ToolchainError::Prompt)?;
                output.flush().map_err(ToolchainError::Prompt)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn toolchain(name: &str) -> Toolchain {
        Toolchain {
            name: name.into(),
            version: "1.0".into(),
            metadata: vec![],
            directory: PathBuf::from(format!("toolchains/{name}")),
        }
    }

    #[test]
    fn single_toolchain_needs_no_prompt() {
        let mut output = Vec::new();
        let selected = select(vec![toolchain("hecs")], io::empty(), &mut output).unwrap();

        assert_eq!(selected.unwrap().name, "hecs");
        assert!(output.is_empty());
        assert_eq!(select(vec![], io::empty(), &mut output).unwrap(), None);
    }

    #[test]
    fn prompt_retries_until_valid() {
        let toolchains = vec![toolchain("a"), toolchain("b"), toolchain("c")];
        let mut output = Vec::new();
        let selected = select(toolchains, &b"zero\n0\n4\n 2 \n"[..], &mut output).unwrap();

        assert_eq!(selected.unwrap().name, "b");
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Multiple toolchains detected, please select one:\n"));
        assert!(output.contains("Toolchain 3\n    Name: c\n    Version: 1.0\n"));
        assert_eq!(output.matches("Input not accepted, try again.").count(), 3);
    }

    #[test]
    fn end_of_input_is_an_error() {
        let toolchains = vec![toolchain("a"), toolchain("b")];
        let err = select(toolchains, &b"9\n"[..], io::sink()).unwrap_err();
        assert!(matches!(err, ToolchainError::NoSelection));
    }

    #[test]
    fn discovery() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for (dir, name) in [("zeta", "Zeta"), ("alpha", "Alpha")] {
            let dir = root.join(TOOLCHAINS_DIR).join(dir);
            fs::create_dir_all(&dir).unwrap();
            fs::write(
                dir.join(TOOLCHAIN_FILE_NAME),
                format!("name = \"{name}\"\nversion = \"2.1\"\nmetadata = [\"core.toml\"]\n"),
            )
            .unwrap();
        }
        fs::create_dir_all(root.join(TOOLCHAINS_DIR).join("empty")).unwrap();

        let toolchains = discover(root).unwrap();
        let names: Vec<_> = toolchains.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Zeta"]);
        assert_eq!(
            toolchains[0].metadata_paths(),
            [root.join(TOOLCHAINS_DIR).join("alpha").join("core.toml")]
        );

        fs::remove_dir_all(root.join(TOOLCHAINS_DIR)).unwrap();
        assert!(discover(root).unwrap().is_empty());
    }
}
