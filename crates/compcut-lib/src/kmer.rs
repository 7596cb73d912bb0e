//! K-mer codes
//!
//! A k-mer is stored as a `u64` with the first base in the most significant
//! used bit pair, i.e. `ACG` encodes to `0b00_01_10`. Only the lower `2k`
//! bits are used, so k is limited to 31.

use crate::constants::{is_valid_k, kmer_mask};
use crate::encoding::{complement_base, decode_base, encode_base, try_encode_base, EncodingError};

/// Encode a k-mer string into its code
///
/// # Errors
/// Returns an error if the string is empty, longer than 31 bases or
/// contains a non-ACGT byte.
pub fn encode_kmer(kmer: &[u8]) -> Result<u64, EncodingError> {
    if !is_valid_k(kmer.len()) {
        return Err(EncodingError::UnsupportedK(kmer.len()));
    }
    let mut code = 0u64;
    for &base in kmer {
        code = (code << 2) | encode_base(base)? as u64;
    }
    Ok(code)
}

/// Decode a code back into its k-mer string
pub fn decode_kmer(code: u64, k: usize) -> String {
    (0..k)
        .rev()
        .map(|i| decode_base(((code >> (2 * i)) & 0b11) as u8) as char)
        .collect()
}

/// Reverse complement of a code
#[inline]
pub fn reverse_complement(code: u64, k: usize) -> u64 {
    let mut rc = 0u64;
    let mut rest = code;
    for _ in 0..k {
        rc = (rc << 2) | complement_base((rest & 0b11) as u8) as u64;
        rest >>= 2;
    }
    rc
}

/// Canonical form: the smaller of a code and its reverse complement
#[inline]
pub fn canonical(code: u64, k: usize) -> u64 {
    code.min(reverse_complement(code, k))
}

/// Rolling iterator over the k-mer codes of a sequence
///
/// Windows containing an ambiguous base are skipped; the rolling state is
/// reset after such a base.
pub struct KmerIter<'a> {
    seq: &'a [u8],
    k: usize,
    mask: u64,
    canonical: bool,
    pos: usize,
    fwd: u64,
    rc: u64,
    len: usize,
}

impl<'a> KmerIter<'a> {
    /// Iterate the k-mers of `seq` as codes, optionally canonicalized
    pub fn new(seq: &'a [u8], k: usize, canonical: bool) -> Self {
        Self {
            seq,
            k,
            mask: kmer_mask(k),
            canonical,
            pos: 0,
            fwd: 0,
            rc: 0,
            len: 0,
        }
    }
}

impl Iterator for KmerIter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        while self.pos < self.seq.len() {
            let base = self.seq[self.pos];
            self.pos += 1;
            let Some(bits) = try_encode_base(base) else {
                self.fwd = 0;
                self.rc = 0;
                self.len = 0;
                continue;
            };
            let bits = bits as u64;
            self.fwd = ((self.fwd << 2) | bits) & self.mask;
            self.rc = (self.rc >> 2) | ((3 - bits) << (2 * (self.k - 1)));
            self.len += 1;
            if self.len >= self.k {
                return Some(if self.canonical {
                    self.fwd.min(self.rc)
                } else {
                    self.fwd
                });
            }
        }
        None
    }
}

/// Convenience: iterate the (non-canonical) k-mers of a sequence
pub fn kmers_of(seq: &[u8], k: usize) -> KmerIter<'_> {
    KmerIter::new(seq, k, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let code = encode_kmer(b"ACG").unwrap();
        assert_eq!(code, 0b00_01_10);
        assert_eq!(decode_kmer(code, 3), "ACG");

        assert_eq!(encode_kmer(b"acgt").unwrap(), encode_kmer(b"ACGT").unwrap());
        assert!(encode_kmer(b"ACNT").is_err());
        assert!(encode_kmer(b"").is_err());
    }

    #[test]
    fn test_reverse_complement() {
        let k = 3;
        let att = encode_kmer(b"ATT").unwrap();
        let aat = encode_kmer(b"AAT").unwrap();
        assert_eq!(reverse_complement(att, k), aat);
        assert_eq!(reverse_complement(reverse_complement(att, k), k), att);

        let k = 4;
        let acgt = encode_kmer(b"ACGT").unwrap();
        assert_eq!(reverse_complement(acgt, k), acgt);
    }

    #[test]
    fn test_canonical() {
        let k = 3;
        let att = encode_kmer(b"ATT").unwrap();
        let aat = encode_kmer(b"AAT").unwrap();
        assert_eq!(canonical(att, k), aat);
        assert_eq!(canonical(aat, k), aat);
    }

    #[test]
    fn test_kmer_iter() {
        let kmers: Vec<String> = kmers_of(b"AACGT", 3).map(|c| decode_kmer(c, 3)).collect();
        assert_eq!(kmers, vec!["AAC", "ACG", "CGT"]);
    }

    #[test]
    fn test_kmer_iter_resets_on_ambiguous_base() {
        let kmers: Vec<String> = kmers_of(b"AACNGTTA", 3).map(|c| decode_kmer(c, 3)).collect();
        assert_eq!(kmers, vec!["AAC", "GTT", "TTA"]);

        assert_eq!(kmers_of(b"AC", 3).count(), 0);
    }

    #[test]
    fn test_kmer_iter_canonical() {
        let seq = b"ATTGCA";
        for (fwd, can) in kmers_of(seq, 3).zip(KmerIter::new(seq, 3, true)) {
            assert_eq!(canonical(fwd, 3), can);
        }
    }
}
