//! FASTA export of components
//!
//! Each component is written as a set of paths: starting from the first
//! member not yet written, the path is extended greedily to the left and
//! then to the right through unused members. Every member appears in exactly
//! one path.

use crate::component::ConnectedComponent;
use crate::constants::kmer_mask;
use crate::encoding::decode_base;
use crate::kmer::{canonical, decode_kmer};
use crate::neighbors::Adjacency;
use ahash::AHashSet;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Greedy path cover of a component's members
///
/// Returns nothing for an overflowed component.
pub fn component_paths(
    component: &ConnectedComponent,
    k: usize,
    adjacency: Adjacency,
) -> Vec<String> {
    let Some(members) = component.members() else {
        return Vec::new();
    };
    let key = |code: u64| match adjacency {
        Adjacency::Directed => code,
        Adjacency::Canonical => canonical(code, k),
    };
    let present: AHashSet<u64> = members.iter().copied().collect();
    let mut used: AHashSet<u64> = AHashSet::with_capacity(members.len());
    let mask = kmer_mask(k);
    let shift = 2 * (k - 1);
    let mut paths = Vec::new();

    for &start in members {
        if !used.insert(start) {
            continue;
        }
        let mut path: VecDeque<u8> = decode_kmer(start, k).into_bytes().into();

        let mut first = start;
        'left: loop {
            for nuc in 0..4u64 {
                let candidate = (first >> 2) | (nuc << shift);
                let candidate_key = key(candidate);
                if present.contains(&candidate_key) && used.insert(candidate_key) {
                    path.push_front(decode_base(nuc as u8));
                    first = candidate;
                    continue 'left;
                }
            }
            break;
        }

        let mut last = start;
        'right: loop {
            for nuc in 0..4u64 {
                let candidate = ((last << 2) & mask) | nuc;
                let candidate_key = key(candidate);
                if present.contains(&candidate_key) && used.insert(candidate_key) {
                    path.push_back(decode_base(nuc as u8));
                    last = candidate;
                    continue 'right;
                }
            }
            break;
        }

        paths.push(path.into_iter().map(char::from).collect());
    }
    paths
}

/// Write one component as FASTA records
pub fn write_component_fasta<W: Write>(
    writer: &mut W,
    component: &ConnectedComponent,
    k: usize,
    adjacency: Adjacency,
) -> io::Result<()> {
    for (i, path) in component_paths(component, k, adjacency).iter().enumerate() {
        writeln!(writer, ">comp_{}_path_{} length={}", component.id, i + 1, path.len())?;
        writeln!(writer, "{path}")?;
    }
    Ok(())
}

/// Write every component to `<output_dir>/fasta/comp_<n>.fa`
///
/// `n` is the 1-based position in `components`. Overflowed components get
/// an empty file. Returns the directory written to.
pub fn export_fasta<P: AsRef<Path>>(
    components: &[ConnectedComponent],
    k: usize,
    adjacency: Adjacency,
    output_dir: P,
) -> io::Result<PathBuf> {
    let dir = output_dir.as_ref().join("fasta");
    fs::create_dir_all(&dir)?;

    for (i, component) in components.iter().enumerate() {
        let path = dir.join(format!("comp_{}.fa", i + 1));
        let mut writer = BufWriter::new(File::create(&path)?);
        write_component_fasta(&mut writer, component, k, adjacency)?;
        writer.flush()?;
        debug!("Wrote {}", path.display());
    }
    info!("Wrote {} FASTA files to {}", components.len(), dir.display());
    Ok(dir)
}
