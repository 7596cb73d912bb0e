//! Component file persistence
//!
//! # File Format
//!
//! All integers are big-endian.
//!
//! **Plain layout** (read by the downstream statistics tools):
//! ```text
//! i32 number of components
//! per component:
//!   i32 size
//!   i64 weight
//!   i64 k-mer code × size
//! ```
//!
//! **Extended layout** (also persists the frequency threshold):
//! ```text
//! [u8; 8] magic "CCOMPv02"
//! i32 number of components
//! per component:
//!   i32 size
//!   i64 weight
//!   i32 usedFreqThreshold
//!   i64 k-mer code × size
//! ```
//!
//! Loading detects the layout from the magic. Components loaded from the
//! plain layout get a threshold of 0. Loaded components are numbered from 1
//! in file order.
//!
//! The statistics sidecar is plain text: a header line followed by one
//! tab-separated row per component (ordinal, size, weight, threshold).

use crate::component::{ComponentBody, ConnectedComponent};
use crate::constants::{COMPONENTS_MAGIC, STATS_HEADER};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or saving component files
#[derive(Error, Debug)]
pub enum ComponentFileError {
    /// The file does not exist
    #[error("Can't load components: file not found: {0}")]
    NotFound(PathBuf),
    /// The file ended early or holds impossible values
    #[error("Can't load components: corrupted file or format mismatch ({0})")]
    Corrupted(String),
    /// A component can't be written in this format
    #[error("Can't save components: {0}")]
    Unsaveable(String),
    /// Any other I/O failure
    #[error("Component file I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for component file operations
pub type ComponentFileResult<T> = Result<T, ComponentFileError>;

/// On-disk layout of a component file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentFileFormat {
    /// Count, then size/weight/codes per component
    #[default]
    Plain,
    /// Magic-prefixed layout with the per-component threshold
    WithThresholds,
}

fn checked_size(component: &ConnectedComponent) -> ComponentFileResult<&[u64]> {
    let members = match component.body() {
        ComponentBody::Members(members) => members,
        ComponentBody::Overflowed(derived) => {
            return Err(ComponentFileError::Unsaveable(format!(
                "component {} of size {} is overflowed ({} vertices left to refine)",
                component.id,
                component.size,
                derived.len()
            )));
        }
    };
    if members.len() > i32::MAX as usize {
        return Err(ComponentFileError::Unsaveable(format!(
            "component {} has {} members, more than the format allows",
            component.id,
            members.len()
        )));
    }
    Ok(members)
}

/// Write components to a writer in the given layout
pub fn write_components<W: Write>(
    writer: &mut W,
    components: &[ConnectedComponent],
    format: ComponentFileFormat,
) -> ComponentFileResult<()> {
    if components.len() > i32::MAX as usize {
        return Err(ComponentFileError::Unsaveable(format!(
            "{} components exceed the format limit",
            components.len()
        )));
    }
    if format == ComponentFileFormat::WithThresholds {
        writer.write_all(COMPONENTS_MAGIC)?;
    }
    writer.write_all(&(components.len() as i32).to_be_bytes())?;

    for component in components {
        let members = checked_size(component)?;
        writer.write_all(&(members.len() as i32).to_be_bytes())?;
        writer.write_all(&(component.weight as i64).to_be_bytes())?;
        if format == ComponentFileFormat::WithThresholds {
            writer.write_all(&(component.used_freq_threshold as i32).to_be_bytes())?;
        }
        for &kmer in members {
            writer.write_all(&(kmer as i64).to_be_bytes())?;
        }
    }
    Ok(())
}

/// Save components to a file in the plain layout
pub fn save_components<P: AsRef<Path>>(
    components: &[ConnectedComponent],
    path: P,
) -> ComponentFileResult<()> {
    save_components_as(components, path, ComponentFileFormat::Plain)
}

/// Save components to a file in the given layout
pub fn save_components_as<P: AsRef<Path>>(
    components: &[ConnectedComponent],
    path: P,
    format: ComponentFileFormat,
) -> ComponentFileResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_components(&mut writer, components, format)?;
    writer.flush()?;
    Ok(())
}

fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(i32::from_be_bytes(bytes))
}

fn read_i64<R: Read>(reader: &mut R) -> io::Result<i64> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    Ok(i64::from_be_bytes(bytes))
}

fn eof_as_corrupted(err: io::Error) -> ComponentFileError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ComponentFileError::Corrupted("unexpected end of file".into())
    } else {
        ComponentFileError::Io(err)
    }
}

fn non_negative(value: i32, what: &str) -> ComponentFileResult<usize> {
    usize::try_from(value)
        .map_err(|_| ComponentFileError::Corrupted(format!("negative {what}: {value}")))
}

/// Read components from a buffered reader, detecting the layout
pub fn read_components<R: BufRead>(
    reader: &mut R,
) -> ComponentFileResult<Vec<ConnectedComponent>> {
    let format = if reader.fill_buf()?.starts_with(COMPONENTS_MAGIC) {
        ComponentFileFormat::WithThresholds
    } else {
        ComponentFileFormat::Plain
    };
    if format == ComponentFileFormat::WithThresholds {
        reader.consume(COMPONENTS_MAGIC.len());
    }

    let count = non_negative(read_i32(reader).map_err(eof_as_corrupted)?, "component count")?;
    // Cap the pre-allocation: the count is untrusted until the data is read
    let mut components = Vec::with_capacity(count.min(1 << 20));

    for i in 0..count {
        let size = non_negative(read_i32(reader).map_err(eof_as_corrupted)?, "component size")?;
        let weight = read_i64(reader).map_err(eof_as_corrupted)?;
        let threshold = match format {
            ComponentFileFormat::WithThresholds => {
                non_negative(read_i32(reader).map_err(eof_as_corrupted)?, "threshold")? as u32
            }
            ComponentFileFormat::Plain => 0,
        };

        let mut members = Vec::with_capacity(size.min(1 << 20));
        for _ in 0..size {
            members.push(read_i64(reader).map_err(eof_as_corrupted)? as u64);
        }

        let mut component = ConnectedComponent::from_members(members, weight as u64);
        component.used_freq_threshold = threshold;
        component.id = (i + 1) as u32;
        components.push(component);
    }
    Ok(components)
}

/// Load components from a file
///
/// # Errors
/// Distinguishes a missing file ([`ComponentFileError::NotFound`]), a
/// truncated or malformed file ([`ComponentFileError::Corrupted`]) and other
/// I/O failures ([`ComponentFileError::Io`]).
pub fn load_components<P: AsRef<Path>>(path: P) -> ComponentFileResult<Vec<ConnectedComponent>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ComponentFileError::NotFound(path.to_path_buf()),
        _ => ComponentFileError::Io(e),
    })?;
    let mut reader = BufReader::new(file);
    read_components(&mut reader)
}

/// Write the tab-separated statistics table for components
pub fn write_component_stats<W: Write>(
    writer: &mut W,
    components: &[ConnectedComponent],
) -> io::Result<()> {
    writeln!(writer, "{STATS_HEADER}")?;
    for (i, component) in components.iter().enumerate() {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            i + 1,
            component.size,
            component.weight,
            component.used_freq_threshold
        )?;
    }
    Ok(())
}

/// Save the statistics sidecar to a file
pub fn save_component_stats<P: AsRef<Path>>(
    components: &[ConnectedComponent],
    path: P,
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_component_stats(&mut writer, components)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::VertexIndex;

    fn sample() -> Vec<ConnectedComponent> {
        let mut a = ConnectedComponent::from_members(vec![3, 1, 2], 17);
        a.used_freq_threshold = 2;
        let b = ConnectedComponent::from_members(vec![u64::MAX >> 2], 4);
        vec![a, b]
    }

    #[test]
    fn test_plain_layout_bytes() {
        let comps = vec![ConnectedComponent::from_members(vec![5], 9)];
        let mut buffer = Vec::new();
        write_components(&mut buffer, &comps, ComponentFileFormat::Plain).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&1i32.to_be_bytes());
        expected.extend_from_slice(&1i32.to_be_bytes());
        expected.extend_from_slice(&9i64.to_be_bytes());
        expected.extend_from_slice(&5i64.to_be_bytes());
        assert_eq!(buffer, expected);
    }

    #[test]
    fn test_plain_roundtrip_drops_threshold() {
        let comps = sample();
        let mut buffer = Vec::new();
        write_components(&mut buffer, &comps, ComponentFileFormat::Plain).unwrap();

        let loaded = read_components(&mut buffer.as_slice()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, 1);
        assert_eq!(loaded[1].id, 2);
        assert_eq!(loaded[0].size, 3);
        assert_eq!(loaded[0].weight, 17);
        assert_eq!(loaded[0].members(), Some(&[3u64, 1, 2][..]));
        assert_eq!(loaded[0].used_freq_threshold, 0);
        assert_eq!(loaded[1].members(), comps[1].members());
    }

    #[test]
    fn test_extended_roundtrip_keeps_threshold() {
        let comps = sample();
        let mut buffer = Vec::new();
        write_components(&mut buffer, &comps, ComponentFileFormat::WithThresholds).unwrap();

        let loaded = read_components(&mut buffer.as_slice()).unwrap();
        assert_eq!(loaded[0].used_freq_threshold, 2);
        assert_eq!(loaded[1].used_freq_threshold, 0);
        assert_eq!(loaded[0].weight, 17);
    }

    #[test]
    fn test_empty_list() {
        let mut buffer = Vec::new();
        write_components(&mut buffer, &[], ComponentFileFormat::Plain).unwrap();
        assert_eq!(buffer.len(), 4);
        assert!(read_components(&mut buffer.as_slice()).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_is_corrupted() {
        let mut buffer = Vec::new();
        write_components(&mut buffer, &sample(), ComponentFileFormat::Plain).unwrap();
        buffer.truncate(buffer.len() - 3);

        let err = read_components(&mut buffer.as_slice()).unwrap_err();
        assert!(matches!(err, ComponentFileError::Corrupted(_)));
    }

    #[test]
    fn test_negative_size_is_corrupted() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&1i32.to_be_bytes());
        buffer.extend_from_slice(&(-4i32).to_be_bytes());
        let err = read_components(&mut buffer.as_slice()).unwrap_err();
        assert!(matches!(err, ComponentFileError::Corrupted(_)));
    }

    #[test]
    fn test_overflowed_component_is_rejected() {
        let mut comp = ConnectedComponent::new(1);
        comp.add(1, 1);
        comp.overflow(VertexIndex::new());
        let mut buffer = Vec::new();
        let err = write_components(&mut buffer, &[comp], ComponentFileFormat::Plain).unwrap_err();
        assert!(matches!(err, ComponentFileError::Unsaveable(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_components("/definitely/not/here/components.bin").unwrap_err();
        assert!(matches!(err, ComponentFileError::NotFound(_)));
    }

    #[test]
    fn test_stats_table() {
        let mut out = Vec::new();
        write_component_stats(&mut out, &sample()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], STATS_HEADER);
        assert_eq!(lines[1], "1\t3\t17\t2");
        assert_eq!(lines[2], "2\t1\t4\t0");
    }
}
