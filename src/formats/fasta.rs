//! Minimal FASTA support
//!
//! Reads reference sequences for the CLI wrapper and writes the
//! allele-specific output. Not part of the decoding core.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// Line width for FASTA output
const FASTA_LINE_WIDTH: usize = 60;

/// Simple in-memory FASTA reader.
///
/// Sequence names are the first whitespace-delimited token of each `>`
/// header; lookup tolerates a missing or extra `chr` prefix.
pub struct FastaReader {
    sequences: Vec<(String, String)>,
}

impl FastaReader {
    /// Read a FASTA file fully into memory.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Read FASTA content from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut sequences: Vec<(String, String)> = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if let Some(header) = line.strip_prefix('>') {
                let name = header
                    .split_whitespace()
                    .next()
                    .unwrap_or("")
                    .to_string();
                sequences.push((name, String::new()));
            } else if let Some((_, sequence)) = sequences.last_mut() {
                sequence.push_str(line.trim());
            }
        }
        Ok(Self { sequences })
    }

    /// The sequence for a chromosome, trying the name as-is and with the
    /// `chr` prefix added or removed.
    pub fn fetch(&self, chromosome: &str) -> Option<&str> {
        let find = |name: &str| {
            self.sequences
                .iter()
                .find(|(sequence_name, _)| sequence_name == name)
                .map(|(_, sequence)| sequence.as_str())
        };
        find(chromosome).or_else(|| {
            if let Some(stripped) = chromosome.strip_prefix("chr") {
                find(stripped)
            } else {
                find(&format!("chr{}", chromosome))
            }
        })
    }

    /// Sequence names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sequences.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

/// Write one named sequence in FASTA layout, wrapped at 60 columns.
pub fn write_fasta<W: Write>(writer: &mut W, name: &str, sequence: &str) -> io::Result<()> {
    writeln!(writer, ">{}", name)?;
    for chunk in sequence.as_bytes().chunks(FASTA_LINE_WIDTH) {
        writer.write_all(chunk)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const EXAMPLE: &str = ">chr1 test sequence\nATCGA\nTTAA\n>2\nGGCC\n";

    #[test]
    fn test_read_and_fetch() {
        let fasta = FastaReader::from_reader(Cursor::new(EXAMPLE)).unwrap();
        assert_eq!(fasta.len(), 2);
        assert_eq!(fasta.fetch("chr1"), Some("ATCGATTAA"));
        assert_eq!(fasta.fetch("2"), Some("GGCC"));
    }

    #[test]
    fn test_fetch_prefix_tolerance() {
        let fasta = FastaReader::from_reader(Cursor::new(EXAMPLE)).unwrap();
        assert_eq!(fasta.fetch("1"), Some("ATCGATTAA"));
        assert_eq!(fasta.fetch("chr2"), Some("GGCC"));
        assert_eq!(fasta.fetch("chr3"), None);
    }

    #[test]
    fn test_write_wraps_lines() {
        let sequence = "A".repeat(130);
        let mut output = Vec::new();
        write_fasta(&mut output, "1", &sequence).unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ">1");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2].len(), 60);
        assert_eq!(lines[3].len(), 10);
    }
}
