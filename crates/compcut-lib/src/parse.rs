//! FASTA/FASTQ input
//!
//! Reads DNA sequences from FASTA or FASTQ files (gzip handled
//! transparently) and counts their k-mers into a [`VertexIndex`].
//! Ambiguous bases are allowed; k-mers spanning them are skipped.

use crate::constants::{is_valid_k, MAX_K, MIN_K};
use crate::index::VertexIndex;
use crate::kmer::KmerIter;
use crate::neighbors::Adjacency;
use anyhow::{Context, Result};
use needletail::parse_fastx_file;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Parse a FASTA/FASTQ file and call a function for each sequence
///
/// # Arguments
/// * `path` - Path to input file (may be gzipped)
/// * `callback` - Function called for each sequence, receives (name, sequence)
///
/// # Errors
/// Returns error if the file cannot be opened or a record is malformed
pub fn parse_sequences<P, F>(path: P, mut callback: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnMut(&[u8], &[u8]) -> Result<()>,
{
    let path = path.as_ref();

    let mut reader = parse_fastx_file(path)
        .with_context(|| format!("Failed to open sequence file: {}", path.display()))?;

    while let Some(record) = reader.next() {
        let record = record
            .with_context(|| format!("Failed to parse sequence record in {}", path.display()))?;
        let seq = record.seq();
        callback(record.id(), &seq)?;
    }

    Ok(())
}

/// Load every sequence of a file into memory
pub fn load_sequences<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<u8>>> {
    let mut sequences = Vec::new();
    parse_sequences(&path, |_name, seq| {
        sequences.push(seq.to_vec());
        Ok(())
    })?;
    debug!(
        "Loaded {} sequences from {}",
        sequences.len(),
        path.as_ref().display()
    );
    Ok(sequences)
}

/// Options for counting k-mers of reads
#[derive(Debug, Clone)]
pub struct CountOptions {
    /// K-mer length
    pub k: usize,
    /// Store canonical codes or codes as read
    pub adjacency: Adjacency,
    /// Reads shorter than this are skipped
    pub min_read_length: usize,
    /// K-mers seen fewer times are dropped from the index
    pub min_count: u64,
    /// Worker threads (0 = all available cores)
    pub num_threads: usize,
}

impl CountOptions {
    /// Count k-mers of length `k` with default filters
    pub fn new(k: usize) -> Self {
        Self {
            k,
            adjacency: Adjacency::default(),
            min_read_length: 0,
            min_count: 1,
            num_threads: 0,
        }
    }

    /// Check that the k-mer length fits into a 64-bit code
    pub fn validate(&self) -> Result<()> {
        if !is_valid_k(self.k) {
            anyhow::bail!(
                "k must be between {} and {}, got {}",
                MIN_K,
                MAX_K,
                self.k
            );
        }
        Ok(())
    }
}

/// Count the k-mers of one file
fn count_file(path: &Path, options: &CountOptions) -> Result<VertexIndex> {
    let canonical = options.adjacency == Adjacency::Canonical;
    let mut index = VertexIndex::new();
    let mut reads = 0u64;
    let mut skipped = 0u64;

    parse_sequences(path, |_name, seq| {
        if seq.len() < options.min_read_length || seq.len() < options.k {
            skipped += 1;
            return Ok(());
        }
        reads += 1;
        for code in KmerIter::new(seq, options.k, canonical) {
            index.increment(code);
        }
        Ok(())
    })?;

    debug!(
        "{}: {} reads counted, {} skipped, {} distinct kmers",
        path.display(),
        reads,
        skipped,
        index.len()
    );
    Ok(index)
}

/// Count the k-mers of all files into a single index
///
/// Files are processed in parallel and their counts summed. K-mers below
/// `min_count` are dropped afterwards.
pub fn count_kmers(paths: &[PathBuf], options: &CountOptions) -> Result<VertexIndex> {
    options.validate()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.num_threads)
        .build()
        .context("Failed to build counting thread pool")?;

    let counted = pool.install(|| {
        paths
            .par_iter()
            .map(|path| count_file(path, options))
            .try_reduce(VertexIndex::new, |mut acc, index| {
                acc.merge(index);
                Ok(acc)
            })
    })?;

    let distinct = counted.len();
    let index: VertexIndex = counted
        .iter()
        .filter(|&(_, counter)| counter as u64 >= options.min_count)
        .map(|(code, counter)| (code, counter as u64))
        .collect();
    info!(
        "Counted {} distinct kmers in {} files, {} kept with count >= {}",
        distinct,
        paths.len(),
        index.len(),
        options.min_count
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fasta(records: &[&str]) -> Result<NamedTempFile> {
        let mut temp_file = NamedTempFile::new()?;
        for (i, seq) in records.iter().enumerate() {
            writeln!(temp_file, ">seq{}", i + 1)?;
            writeln!(temp_file, "{}", seq)?;
        }
        temp_file.flush()?;
        Ok(temp_file)
    }

    #[test]
    fn test_parse_fasta_file() -> Result<()> {
        let temp_file = fasta(&["ACGT", "TGCA"])?;

        let mut sequences = Vec::new();
        parse_sequences(temp_file.path(), |name, seq| {
            sequences.push((name.to_vec(), seq.to_vec()));
            Ok(())
        })?;

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].0, b"seq1");
        assert_eq!(sequences[0].1, b"ACGT");
        assert_eq!(sequences[1].0, b"seq2");
        assert_eq!(sequences[1].1, b"TGCA");

        Ok(())
    }

    #[test]
    fn test_load_sequences_keeps_ambiguous_bases() -> Result<()> {
        let temp_file = fasta(&["ACGTNACGT"])?;
        let sequences = load_sequences(temp_file.path())?;
        assert_eq!(sequences, vec![b"ACGTNACGT".to_vec()]);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_sequences("/nonexistent/reads.fa").is_err());
    }

    #[test]
    fn test_count_kmers_across_files() -> Result<()> {
        let first = fasta(&["AAAT", "AC"])?;
        let second = fasta(&["AAATT"])?;
        let mut options = CountOptions::new(3);
        options.num_threads = 2;

        let paths = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let index = count_kmers(&paths, &options)?;

        let code = |s: &str| crate::kmer::encode_kmer(s.as_bytes()).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.frequency(code("AAA")), 2);
        assert_eq!(index.frequency(code("AAT")), 2);
        assert_eq!(index.frequency(code("ATT")), 1);
        Ok(())
    }

    #[test]
    fn test_count_filters() -> Result<()> {
        let reads = fasta(&["AAAT", "AAATT", "CCCCCCCCCCCC"])?;
        let mut options = CountOptions::new(3);
        options.min_count = 2;
        options.min_read_length = 5;

        let index = count_kmers(&[reads.path().to_path_buf()], &options)?;
        let code = |s: &str| crate::kmer::encode_kmer(s.as_bytes()).unwrap();
        // AAAT is skipped; AAATT contributes once each, CCC ten times
        assert_eq!(index.len(), 1);
        assert_eq!(index.frequency(code("CCC")), 10);
        Ok(())
    }

    #[test]
    fn test_count_rejects_unsupported_k() -> Result<()> {
        let reads = fasta(&["ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGT"])?;
        let paths = vec![reads.path().to_path_buf()];
        for k in [0, 32, 64] {
            let err = count_kmers(&paths, &CountOptions::new(k)).unwrap_err();
            assert!(err.to_string().contains("k must be between"), "k = {k}");
        }
        assert_eq!(count_kmers(&paths, &CountOptions::new(31))?.len(), 4);
        Ok(())
    }
}
