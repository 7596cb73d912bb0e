//! Constants and defaults for component cutting
//!
//! This module defines the k-mer bounds supported by the 64-bit code,
//! the default component size bounds and the file-format markers shared
//! by the writers and readers.

/// Minimum k-mer size supported
pub const MIN_K: usize = 1;

/// Maximum k-mer size supported (2 bits per base in a u64)
pub const MAX_K: usize = 31;

/// Default minimum component size (in k-mers)
pub const DEFAULT_MIN_COMPONENT_SIZE: u64 = 1000;

/// Default maximum component size (in k-mers)
pub const DEFAULT_MAX_COMPONENT_SIZE: u64 = 10_000;

/// Frequency threshold of the first (full index) partitioning round
pub const INITIAL_FREQ_THRESHOLD: u32 = 1;

/// Number of candidate neighbours of a k-mer (4 left + 4 right extensions)
pub const MAX_NEIGHBOURS: usize = 8;

/// Header line of the component statistics sidecar
pub const STATS_HEADER: &str =
    "# component.no\tcomponent.size\tcomponent.weight\tusedFreqThreshold";

/// Magic bytes of the extended component file (persists thresholds)
pub const COMPONENTS_MAGIC: &[u8; 8] = b"CCOMPv02";

/// Version number
pub const VERSION: (u8, u8, u8) = (0, 1, 0);

/// Check if a k-mer size fits into a 64-bit code
#[inline]
pub const fn is_valid_k(k: usize) -> bool {
    k >= MIN_K && k <= MAX_K
}

/// Bit mask covering the lower `2k` bits of a code
#[inline]
pub const fn kmer_mask(k: usize) -> u64 {
    if k >= 32 {
        u64::MAX
    } else {
        (1u64 << (2 * k)) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_k() {
        assert!(is_valid_k(1));
        assert!(is_valid_k(21));
        assert!(is_valid_k(31));

        assert!(!is_valid_k(0));
        assert!(!is_valid_k(32));
        assert!(!is_valid_k(63));
    }

    #[test]
    fn test_kmer_mask() {
        assert_eq!(kmer_mask(1), 0b11);
        assert_eq!(kmer_mask(3), 0b11_1111);
        assert_eq!(kmer_mask(31), (1u64 << 62) - 1);
        assert_eq!(kmer_mask(32), u64::MAX);
    }

    #[test]
    fn test_default_bounds_are_ordered() {
        assert!(DEFAULT_MIN_COMPONENT_SIZE <= DEFAULT_MAX_COMPONENT_SIZE);
    }
}
