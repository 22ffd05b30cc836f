//! Chunked binary layout used by the binary emitter
//!
//! Every node is a 4-byte name, followed by a little-endian `u32` payload size and the payload.
//! A payload is either raw data, or a sequence of child nodes, back to back, with no padding.

use anyhow::ensure;
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use ecsbind_utils::{ok, AnyResult};
use std::{
    fmt::{self, Display},
    io::{self, Read, Seek, SeekFrom, Write},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeName(pub [u8; 4]);

impl NodeName {
    /// Converts given string into a [`NodeName`].
    ///
    /// ## Panics
    /// Panics if the string isn't 4 bytes long.
    pub const fn from_str(s: &str) -> Self {
        let bytes = s.as_bytes();
        assert!(bytes.len() == 4, "invalid string length");
        Self([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl<'a> From<&'a [u8; 4]> for NodeName {
    fn from(value: &'a [u8; 4]) -> Self {
        Self(*value)
    }
}

impl PartialEq<&[u8; 4]> for NodeName {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        &self.0 == *other
    }
}

impl Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            if byte.is_ascii_graphic() {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, r"\x{byte:02X}")?;
            }
        }
        ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHeader {
    pub header_position: u64,
    pub name: NodeName,
    pub size: u32,
}

impl NodeHeader {
    pub fn seek_to_payload(&self, r: &mut impl Seek) -> io::Result<()> {
        r.seek(SeekFrom::Start(self.header_position + 8))?;
        ok()
    }

    pub fn payload_end(&self) -> u64 {
        self.header_position + 8 + self.size as u64
    }
}

pub fn read_node_header<R>(r: &mut R) -> io::Result<NodeHeader>
where
    R: Read + Seek,
{
    Ok(NodeHeader {
        header_position: r.stream_position()?,
        name: {
            let mut name = NodeName([0; 4]);
            r.read_exact(&mut name.0)?;
            name
        },
        size: r.read_u32::<LE>()?,
    })
}

/// Reads the given node's payload as a byte buffer.
pub fn read_node_payload<R>(r: &mut R, header: NodeHeader) -> io::Result<Vec<u8>>
where
    R: Read + Seek,
{
    let mut result = Vec::with_capacity(header.size as usize);
    header.seek_to_payload(r)?;
    r.take(header.size as u64).read_to_end(&mut result)?;

    if result.len() != header.size as usize {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "node payload is truncated",
        ));
    }
    Ok(result)
}

/// Parses the given node's payload as a list of child nodes.
pub fn read_node_children<R>(r: &mut R, header: NodeHeader) -> io::Result<Vec<NodeHeader>>
where
    R: Read + Seek,
{
    let end = header.payload_end();
    header.seek_to_payload(r)?;

    let mut children = Vec::new();
    while r.stream_position()? < end {
        let child = read_node_header(r)?;
        if child.payload_end() > end {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("node `{}` went out of bounds", child.name),
            ));
        }

        r.seek(SeekFrom::Start(child.payload_end()))?;
        children.push(child);
    }

    Ok(children)
}

/// A builder-style node writer.
///
/// ## Quick crash course
///  1. You can use [`NodeWriter::build_node`] to create a nested node writer for a child node.
///  2. You can use [`NodeWriter::write_node`] to create a child node with a raw byte payload.
///  3. You can write raw data into the node using its [`Write`] implementation, that just forwards
///     everything to the parent writer.
///  4. Once you're finished, either call [`NodeWriter::finish`] manually or drop the writer. Note,
///     that the drop implementation unwraps any IO errors returned by `finish`.
pub struct NodeWriter<'w, W: Write + Seek> {
    w: &'w mut W,
    data_start: u64,
    finished: bool,
}

impl<'w, W: Write + Seek> NodeWriter<'w, W> {
    pub fn new(w: &'w mut W, name: impl Into<NodeName>) -> AnyResult<Self> {
        let data_start = w.stream_position()?;
        w.write_all(&name.into().0)?;
        w.write_u32::<LE>(0)?;

        Ok(Self {
            w,
            data_start,
            finished: false,
        })
    }

    /// Creates a new child node holding the given bytes.
    pub fn write_node(&mut self, name: impl Into<NodeName>, payload: &[u8]) -> AnyResult {
        self.build_node(name, |writer| {
            writer.write_all(payload)?;
            ok()
        })
    }

    /// Creates a nested node builder.
    pub fn build_node<'a, N, F>(&'a mut self, name: N, f: F) -> AnyResult
    where
        N: Into<NodeName>,
        F: FnOnce(&mut NodeWriter<'a, W>) -> AnyResult,
        'w: 'a,
    {
        assert!(!self.finished);

        let mut writer = NodeWriter::new(self.w, name.into())?;
        (f)(&mut writer)?;
        writer.finish()?;

        ok()
    }

    /// Writes a `u32` length prefixed UTF-8 string.
    pub fn write_string(&mut self, s: &str) -> AnyResult {
        ensure!(s.len() <= u32::MAX as usize, "string too long");
        self.w.write_u32::<LE>(s.len() as u32)?;
        self.w.write_all(s.as_bytes())?;
        ok()
    }

    pub fn write_u32(&mut self, value: u32) -> AnyResult {
        self.w.write_u32::<LE>(value)?;
        ok()
    }

    pub fn write_words(&mut self, words: &[u64]) -> AnyResult {
        for &word in words {
            self.w.write_u64::<LE>(word)?;
        }
        ok()
    }

    /// Finishes writing the node, by marking its final size in the stream.
    pub fn finish(&mut self) -> AnyResult {
        if self.finished {
            return ok();
        }

        let data_end = self.w.stream_position()?;
        let data_size = data_end - self.data_start - 8;
        ensure!(data_size <= u32::MAX.into(), "node too large");

        self.w.seek(SeekFrom::Start(self.data_start + 4))?;
        self.w.write_u32::<LE>(data_size as u32)?;
        self.w.seek(SeekFrom::Start(data_end))?;

        self.finished = true;
        ok()
    }
}

impl<'w, W: Write + Seek> Write for NodeWriter<'w, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.w.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.w.flush()
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.w.write_all(buf)
    }
}

impl<'w, W: Write + Seek> Drop for NodeWriter<'w, W> {
    fn drop(&mut self) {
        if !self.finished {
            self.finish().unwrap();
        }
    }
}

/// Reads a `u32` length prefixed UTF-8 string, as written by [`NodeWriter::write_string`].
pub fn read_string<R: Read>(r: &mut R) -> io::Result<String> {
    let len = r.read_u32::<LE>()?;
    let mut bytes = Vec::with_capacity(len as usize);
    r.take(len as u64).read_to_end(&mut bytes)?;

    if bytes.len() != len as usize {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "string is truncated",
        ));
    }
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub fn read_words<R: Read>(r: &mut R, count: usize) -> io::Result<Vec<u64>> {
    (0..count).map(|_| r.read_u64::<LE>()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn nested_nodes() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut root = NodeWriter::new(&mut cursor, b"ROOT").unwrap();
            root.write_node(b"AAAA", &[1, 2, 3]).unwrap();
            root.build_node(b"BBBB", |b| {
                b.write_string("Position")?;
                b.write_words(&[5])
            })
            .unwrap();
            root.finish().unwrap();
        }

        let bytes = cursor.into_inner();
        assert_eq!(&bytes[0..4], b"ROOT");
        // AAAA: 8 + 3, BBBB: 8 + 4 + 8 + 8
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 11 + 28);

        let mut r = Cursor::new(bytes);
        let root = read_node_header(&mut r).unwrap();
        let children = read_node_children(&mut r, root).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, b"AAAA");
        assert_eq!(read_node_payload(&mut r, children[0]).unwrap(), [1, 2, 3]);

        children[1].seek_to_payload(&mut r).unwrap();
        assert_eq!(read_string(&mut r).unwrap(), "Position");
        assert_eq!(read_words(&mut r, 1).unwrap(), [5]);
    }

    #[test]
    fn out_of_bounds_child() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"ROOT");
        bytes.extend_from_slice(&12u32.to_le_bytes());
        bytes.extend_from_slice(b"KIDS");
        bytes.extend_from_slice(&100u32.to_le_bytes());
        bytes.extend_from_slice(&[0; 4]);

        let mut r = Cursor::new(bytes);
        let root = read_node_header(&mut r).unwrap();
        let err = read_node_children(&mut r, root).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn name_display() {
        assert_eq!(NodeName::from_str("COMP").to_string(), "COMP");
        assert_eq!(NodeName([b'A', 0, b'B', b'C']).to_string(), r"A\x00BC");
    }
}
