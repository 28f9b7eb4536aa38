//! Sequence statistics: nucleotide counts, codon frequency, transcription,
//! and translation of DNA sequences.

use crate::error::{MetaboError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// A validated DNA sequence (A, C, G, T, with N for ambiguous bases).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnaSequence {
    bases: String,
}

impl DnaSequence {
    /// Validate and normalize a raw sequence string.
    ///
    /// Input is uppercased; anything outside A/C/G/T/N is rejected with the
    /// offending position.
    pub fn new(bases: impl Into<String>) -> Result<Self> {
        let bases = bases.into().to_uppercase();
        if bases.is_empty() {
            return Err(MetaboError::EmptyData("empty sequence".to_string()));
        }
        for (position, base) in bases.chars().enumerate() {
            if !matches!(base, 'A' | 'C' | 'G' | 'T' | 'N') {
                return Err(MetaboError::InvalidSequence { position, base });
            }
        }
        Ok(Self { bases })
    }

    /// Read a sequence from a FASTA file, skipping header lines.
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let bases: String = contents
            .lines()
            .filter(|line| !line.starts_with('>'))
            .map(|line| line.trim())
            .collect();
        Self::new(bases)
    }

    /// Sequence length in bases.
    #[inline]
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Never true for a constructed sequence; kept for API symmetry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// The validated bases.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.bases
    }

    /// Count each nucleotide.
    pub fn nucleotide_counts(&self) -> NucleotideCounts {
        let mut counts = NucleotideCounts::default();
        for base in self.bases.chars() {
            match base {
                'A' => counts.a += 1,
                'C' => counts.c += 1,
                'G' => counts.g += 1,
                'T' => counts.t += 1,
                _ => counts.ambiguous += 1,
            }
        }
        counts
    }

    /// Count frame-0 complete codons; a trailing partial codon is ignored.
    pub fn codon_frequency(&self) -> CodonFrequency {
        let bytes = self.bases.as_bytes();
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut total = 0;
        for chunk in bytes.chunks_exact(3) {
            let codon = std::str::from_utf8(chunk).expect("ASCII bases").to_string();
            *counts.entry(codon).or_insert(0) += 1;
            total += 1;
        }
        CodonFrequency { counts, total }
    }

    /// Transcribe to RNA (T becomes U).
    pub fn transcribe(&self) -> String {
        self.bases.replace('T', "U")
    }

    /// Translate frame 0 with the standard genetic code.
    ///
    /// Translation stops at the first stop codon; codons containing
    /// ambiguous bases yield `X`. A sequence shorter than one codon is an
    /// error.
    pub fn translate(&self) -> Result<String> {
        if self.bases.len() < 3 {
            return Err(MetaboError::EmptyData(
                "sequence shorter than one codon".to_string(),
            ));
        }
        let mut protein = String::with_capacity(self.bases.len() / 3);
        for chunk in self.bases.as_bytes().chunks_exact(3) {
            let codon = std::str::from_utf8(chunk).expect("ASCII bases");
            match codon_to_amino_acid(codon) {
                Some('*') => break,
                Some(aa) => protein.push(aa),
                None => protein.push('X'),
            }
        }
        Ok(protein)
    }
}

/// Per-base counts for one sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NucleotideCounts {
    pub a: usize,
    pub c: usize,
    pub g: usize,
    pub t: usize,
    pub ambiguous: usize,
}

impl NucleotideCounts {
    /// Total number of bases counted.
    pub fn total(&self) -> usize {
        self.a + self.c + self.g + self.t + self.ambiguous
    }

    /// Fraction of unambiguous bases that are G or C.
    pub fn gc_fraction(&self) -> f64 {
        let unambiguous = self.a + self.c + self.g + self.t;
        if unambiguous == 0 {
            return 0.0;
        }
        (self.g + self.c) as f64 / unambiguous as f64
    }
}

impl fmt::Display for NucleotideCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A: {}  C: {}  G: {}  T: {}  GC: {:.1}%",
            self.a,
            self.c,
            self.g,
            self.t,
            self.gc_fraction() * 100.0
        )?;
        if self.ambiguous > 0 {
            write!(f, "  N: {}", self.ambiguous)?;
        }
        Ok(())
    }
}

/// Codon counts over frame 0, in lexicographic codon order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodonFrequency {
    counts: BTreeMap<String, usize>,
    total: usize,
}

impl CodonFrequency {
    /// Count for one codon.
    pub fn count(&self, codon: &str) -> usize {
        self.counts.get(codon).copied().unwrap_or(0)
    }

    /// Fraction of all complete codons.
    pub fn fraction(&self, codon: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(codon) as f64 / self.total as f64
    }

    /// Number of complete codons counted.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Iterate (codon, count) in codon order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(codon, &count)| (codon.as_str(), count))
    }
}

/// Standard genetic code; `None` for codons with ambiguous bases.
fn codon_to_amino_acid(codon: &str) -> Option<char> {
    let aa = match codon {
        "TTT" | "TTC" => 'F',
        "TTA" | "TTG" | "CTT" | "CTC" | "CTA" | "CTG" => 'L',
        "ATT" | "ATC" | "ATA" => 'I',
        "ATG" => 'M',
        "GTT" | "GTC" | "GTA" | "GTG" => 'V',
        "TCT" | "TCC" | "TCA" | "TCG" | "AGT" | "AGC" => 'S',
        "CCT" | "CCC" | "CCA" | "CCG" => 'P',
        "ACT" | "ACC" | "ACA" | "ACG" => 'T',
        "GCT" | "GCC" | "GCA" | "GCG" => 'A',
        "TAT" | "TAC" => 'Y',
        "TAA" | "TAG" | "TGA" => '*',
        "CAT" | "CAC" => 'H',
        "CAA" | "CAG" => 'Q',
        "AAT" | "AAC" => 'N',
        "AAA" | "AAG" => 'K',
        "GAT" | "GAC" => 'D',
        "GAA" | "GAG" => 'E',
        "TGT" | "TGC" => 'C',
        "TGG" => 'W',
        "CGT" | "CGC" | "CGA" | "CGG" | "AGA" | "AGG" => 'R',
        "GGT" | "GGC" | "GGA" | "GGG" => 'G',
        _ => return None,
    };
    Some(aa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validation() {
        assert!(DnaSequence::new("acgtn").is_ok());
        assert!(matches!(
            DnaSequence::new("ACXT"),
            Err(MetaboError::InvalidSequence {
                position: 2,
                base: 'X'
            })
        ));
        assert!(DnaSequence::new("").is_err());
    }

    #[test]
    fn test_nucleotide_counts() {
        let seq = DnaSequence::new("AACCGGTTN").unwrap();
        let counts = seq.nucleotide_counts();
        assert_eq!(counts.a, 2);
        assert_eq!(counts.c, 2);
        assert_eq!(counts.g, 2);
        assert_eq!(counts.t, 2);
        assert_eq!(counts.ambiguous, 1);
        assert_eq!(counts.total(), 9);
        assert_relative_eq!(counts.gc_fraction(), 0.5);
    }

    #[test]
    fn test_codon_frequency_ignores_partial() {
        let seq = DnaSequence::new("ATGATGCCCA").unwrap();
        let freq = seq.codon_frequency();
        assert_eq!(freq.total(), 3);
        assert_eq!(freq.count("ATG"), 2);
        assert_eq!(freq.count("CCC"), 1);
        assert_relative_eq!(freq.fraction("ATG"), 2.0 / 3.0);
        assert_eq!(freq.count("AAA"), 0);
    }

    #[test]
    fn test_transcription() {
        let seq = DnaSequence::new("ATGCT").unwrap();
        assert_eq!(seq.transcribe(), "AUGCU");
    }

    #[test]
    fn test_translation_stops_at_stop_codon() {
        let seq = DnaSequence::new("ATGGCCTGAAAA").unwrap();
        assert_eq!(seq.translate().unwrap(), "MA");
    }

    #[test]
    fn test_translation_ambiguous_codon() {
        let seq = DnaSequence::new("ATGANG").unwrap();
        assert_eq!(seq.translate().unwrap(), "MX");
    }

    #[test]
    fn test_translation_too_short() {
        let seq = DnaSequence::new("AT").unwrap();
        assert!(seq.translate().is_err());
    }

    #[test]
    fn test_from_fasta_skips_headers() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "> seq1 test record").unwrap();
        writeln!(file, "ATGGCC").unwrap();
        writeln!(file, "TGA").unwrap();
        file.flush().unwrap();

        let seq = DnaSequence::from_fasta(file.path()).unwrap();
        assert_eq!(seq.as_str(), "ATGGCCTGA");
        assert_eq!(seq.translate().unwrap(), "MA");
    }
}
