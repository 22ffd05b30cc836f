//! Compact binary rendering of the binding tables, meant to be loaded by the ECS runtime
//!
//! ```text
//! ECSB
//!   INFO  u32 format, u32 fingerprint, u32 mask width, u32 component count
//!   COMP
//!     CMPT  u32 ordinal, str name, mask
//!   SYST
//!     SYS_  str name, u32 count, str dependencies..., mask
//!   GCMD
//!     CMD_  str name
//!   LCMD
//!     CMD_  str name
//!   ARCH
//!     ARC_  str name, u32 count, str components..., mask
//! ```
//!
//! Strings are a `u32` byte length followed by UTF-8. Masks are always exactly `mask width`
//! little-endian `u64` words, lowest ordinals first. Readers should skip nodes they don't know.

use crate::{
    emit::{Artifact, Emitter},
    error::ArtifactError,
    node::{self, NodeHeader, NodeName, NodeWriter},
};
use byteorder::{ReadBytesExt, LE};
use ecsbind_core::{BindingTables, CommandTable, Mask};
use ecsbind_utils::{ok, AnyResult};
use std::io::{self, Cursor, Read, Seek, Write};

pub const BINARY_FORMAT_VERSION: u32 = 1;
pub const BINARY_FILE_NAME: &str = "bindings.ecsb";

const ROOT: NodeName = NodeName::from_str("ECSB");
const INFO: NodeName = NodeName::from_str("INFO");
const COMPONENTS: NodeName = NodeName::from_str("COMP");
const COMPONENT: NodeName = NodeName::from_str("CMPT");
const SYSTEMS: NodeName = NodeName::from_str("SYST");
const SYSTEM: NodeName = NodeName::from_str("SYS_");
const GLOBAL_COMMANDS: NodeName = NodeName::from_str("GCMD");
const LOCAL_COMMANDS: NodeName = NodeName::from_str("LCMD");
const COMMAND: NodeName = NodeName::from_str("CMD_");
const ARCHETYPES: NodeName = NodeName::from_str("ARCH");
const ARCHETYPE: NodeName = NodeName::from_str("ARC_");

/// Writes `bindings.ecsb`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryEmitter;

impl Emitter for BinaryEmitter {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn emit(&self, tables: &BindingTables) -> Result<Vec<Artifact>, ArtifactError> {
        let bytes = encode(tables).map_err(|e| ArtifactError::encode(BINARY_FILE_NAME, e))?;
        Ok(vec![Artifact::new(BINARY_FILE_NAME, bytes)])
    }
}

fn encode(tables: &BindingTables) -> AnyResult<Vec<u8>> {
    let width = tables.components.width();
    let mut cursor = Cursor::new(Vec::new());

    {
        let mut root = NodeWriter::new(&mut cursor, ROOT)?;

        root.build_node(INFO, |info| {
            info.write_u32(BINARY_FORMAT_VERSION)?;
            info.write_u32(tables.fingerprint())?;
            info.write_u32(width.try_into()?)?;
            info.write_u32(tables.components.len().try_into()?)
        })?;

        root.build_node(COMPONENTS, |list| {
            for record in tables.components.records() {
                list.build_node(COMPONENT, |node| {
                    node.write_u32(record.ordinal)?;
                    node.write_string(&record.name)?;
                    write_mask(node, &record.mask, width)
                })?;
            }
            ok()
        })?;

        root.build_node(SYSTEMS, |list| {
            for system in &tables.systems {
                list.build_node(SYSTEM, |node| {
                    node.write_string(&system.name)?;
                    write_strings(node, &system.dependencies)?;
                    write_mask(node, &system.resolved_mask, width)
                })?;
            }
            ok()
        })?;

        write_commands(&mut root, GLOBAL_COMMANDS, &tables.global_commands)?;
        write_commands(&mut root, LOCAL_COMMANDS, &tables.local_commands)?;

        root.build_node(ARCHETYPES, |list| {
            for archetype in &tables.archetypes {
                list.build_node(ARCHETYPE, |node| {
                    node.write_string(&archetype.name)?;
                    write_strings(node, &archetype.components)?;
                    write_mask(node, &archetype.mask, width)
                })?;
            }
            ok()
        })?;

        root.finish()?;
    }

    Ok(cursor.into_inner())
}

fn write_commands<W: Write + Seek>(
    root: &mut NodeWriter<W>,
    name: NodeName,
    commands: &CommandTable,
) -> AnyResult {
    root.build_node(name, |list| {
        for command in commands.records() {
            list.build_node(COMMAND, |node| node.write_string(&command.name))?;
        }
        ok()
    })
}

fn write_strings<W: Write + Seek>(node: &mut NodeWriter<W>, strings: &[String]) -> AnyResult {
    node.write_u32(strings.len().try_into()?)?;
    for s in strings {
        node.write_string(s)?;
    }
    ok()
}

fn write_mask<W: Write + Seek>(node: &mut NodeWriter<W>, mask: &Mask, width: usize) -> AnyResult {
    if mask.width() == width {
        node.write_words(mask.words())
    } else {
        let mut mask = mask.clone();
        mask.resize(width);
        node.write_words(mask.words())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedComponent {
    pub ordinal: u32,
    pub name: String,
    pub mask: Mask,
}

/// A system or an archetype: a name, a list of component names and their union mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedGroup {
    pub name: String,
    pub components: Vec<String>,
    pub mask: Mask,
}

/// Contents of a `bindings.ecsb` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedBindings {
    pub version: u32,
    pub fingerprint: u32,
    pub width: usize,
    pub components: Vec<DecodedComponent>,
    pub systems: Vec<DecodedGroup>,
    pub global_commands: Vec<String>,
    pub local_commands: Vec<String>,
    pub archetypes: Vec<DecodedGroup>,
}

/// Parses a `bindings.ecsb` file.
pub fn read_bindings(bytes: &[u8]) -> io::Result<DecodedBindings> {
    let mut r = Cursor::new(bytes);
    let root = node::read_node_header(&mut r)?;
    if root.name != ROOT {
        return Err(invalid_data(format!("expected `{ROOT}` root node, got `{}`", root.name)));
    }

    let mut result = DecodedBindings::default();
    let children = node::read_node_children(&mut r, root)?;

    // INFO carries the mask width, so it has to be read first
    let info = children
        .iter()
        .find(|child| child.name == INFO)
        .ok_or_else(|| invalid_data("missing `INFO` node".into()))?;
    info.seek_to_payload(&mut r)?;
    result.version = r.read_u32::<LE>()?;
    result.fingerprint = r.read_u32::<LE>()?;
    result.width = r.read_u32::<LE>()? as usize;
    if result.version != BINARY_FORMAT_VERSION {
        return Err(invalid_data(format!(
            "unsupported format version {}",
            result.version
        )));
    }

    for child in &children {
        match child.name {
            COMPONENTS => {
                for entry in node::read_node_children(&mut r, *child)? {
                    entry.seek_to_payload(&mut r)?;
                    result.components.push(DecodedComponent {
                        ordinal: r.read_u32::<LE>()?,
                        name: node::read_string(&mut r)?,
                        mask: read_mask(&mut r, result.width)?,
                    });
                }
            }
            SYSTEMS => {
                for entry in node::read_node_children(&mut r, *child)? {
                    entry.seek_to_payload(&mut r)?;
                    result.systems.push(read_group(&mut r, result.width)?);
                }
            }
            ARCHETYPES => {
                for entry in node::read_node_children(&mut r, *child)? {
                    entry.seek_to_payload(&mut r)?;
                    result.archetypes.push(read_group(&mut r, result.width)?);
                }
            }
            GLOBAL_COMMANDS => result.global_commands = read_commands(&mut r, *child)?,
            LOCAL_COMMANDS => result.local_commands = read_commands(&mut r, *child)?,
            _ => {}
        }
    }

    Ok(result)
}

fn read_commands<R: Read + Seek>(r: &mut R, list: NodeHeader) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in node::read_node_children(r, list)? {
        entry.seek_to_payload(r)?;
        names.push(node::read_string(r)?);
    }
    Ok(names)
}

fn read_group<R: Read>(r: &mut R, width: usize) -> io::Result<DecodedGroup> {
    let name = node::read_string(r)?;
    let count = r.read_u32::<LE>()?;
    let components: Vec<String> = (0..count)
        .map(|_| node::read_string(r))
        .collect::<io::Result<_>>()?;
    Ok(DecodedGroup {
        name,
        components,
        mask: read_mask(r, width)?,
    })
}

fn read_mask<R: Read>(r: &mut R, width: usize) -> io::Result<Mask> {
    Ok(Mask::from_words(&node::read_words(r, width)?))
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_emitted_tables() {
        let tables = crate::tests::sample_tables();
        let artifacts = BinaryEmitter.emit(&tables).unwrap();
        assert_eq!(artifacts[0].file_name, "bindings.ecsb");
        assert_eq!(&artifacts[0].bytes[0..4], b"ECSB");

        let decoded = read_bindings(&artifacts[0].bytes).unwrap();
        assert_eq!(decoded.version, BINARY_FORMAT_VERSION);
        assert_eq!(decoded.fingerprint, tables.fingerprint());
        assert_eq!(decoded.width, 1);

        let names: Vec<_> = decoded.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Position", "Velocity", "Health"]);
        assert_eq!(decoded.components[1].ordinal, 1);
        assert_eq!(decoded.components[1].mask.words(), &[0b10]);

        assert_eq!(decoded.systems[0].name, "MoveSystem");
        assert_eq!(decoded.systems[0].components, ["Position", "Velocity"]);
        assert_eq!(decoded.systems[0].mask.words(), &[0b11]);

        assert_eq!(decoded.global_commands, ["SaveGame"]);
        assert_eq!(decoded.local_commands, ["Damage"]);
        assert_eq!(decoded.archetypes[0].mask.words(), &[0b101]);
    }

    #[test]
    fn empty_tables_are_well_formed() {
        let artifacts = BinaryEmitter.emit(&crate::tests::empty_tables()).unwrap();
        let decoded = read_bindings(&artifacts[0].bytes).unwrap();

        assert_eq!(decoded.width, 0);
        assert!(decoded.components.is_empty());
        assert!(decoded.systems.is_empty());
        assert!(decoded.global_commands.is_empty());
    }

    #[test]
    fn wrong_root_is_rejected() {
        let mut bytes = BinaryEmitter.emit(&crate::tests::empty_tables()).unwrap()[0]
            .bytes
            .clone();
        bytes[0..4].copy_from_slice(b"ucfb");

        let err = read_bindings(&bytes).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
