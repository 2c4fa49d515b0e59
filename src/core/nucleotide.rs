//! Nucleic acid alphabet
//!
//! Provides the code type for single nucleotide symbols including
//! IUPAC ambiguity codes, and the positioned-code pair used by the
//! streaming sequence transducers.

use crate::core::error::ApplyError;
use std::fmt;

/// One symbol of the nucleic-acid alphabet.
///
/// Covers the four canonical DNA bases, uracil and the IUPAC ambiguity
/// codes. Parsing is case-insensitive; the canonical form is uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NucleicAcidCode {
    A,
    C,
    G,
    T,
    U,
    /// Any base
    N,
    /// A or G
    R,
    /// C or T
    Y,
    /// G or C
    S,
    /// A or T
    W,
    /// G or T
    K,
    /// A or C
    M,
    /// C, G or T
    B,
    /// A, C or G
    V,
    /// A, G or T
    D,
    /// A, C or T
    H,
}

impl NucleicAcidCode {
    /// Parse a single symbol, case-insensitively.
    ///
    /// # Examples
    /// ```
    /// use vcf_applicator::core::NucleicAcidCode;
    ///
    /// assert_eq!(NucleicAcidCode::from_char('a'), Some(NucleicAcidCode::A));
    /// assert_eq!(NucleicAcidCode::from_char('T'), Some(NucleicAcidCode::T));
    /// assert_eq!(NucleicAcidCode::from_char('x'), None);
    /// ```
    #[inline]
    pub fn from_char(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'A' => Some(NucleicAcidCode::A),
            'C' => Some(NucleicAcidCode::C),
            'G' => Some(NucleicAcidCode::G),
            'T' => Some(NucleicAcidCode::T),
            'U' => Some(NucleicAcidCode::U),
            'N' => Some(NucleicAcidCode::N),
            'R' => Some(NucleicAcidCode::R),
            'Y' => Some(NucleicAcidCode::Y),
            'S' => Some(NucleicAcidCode::S),
            'W' => Some(NucleicAcidCode::W),
            'K' => Some(NucleicAcidCode::K),
            'M' => Some(NucleicAcidCode::M),
            'B' => Some(NucleicAcidCode::B),
            'V' => Some(NucleicAcidCode::V),
            'D' => Some(NucleicAcidCode::D),
            'H' => Some(NucleicAcidCode::H),
            _ => None,
        }
    }

    /// The canonical uppercase symbol.
    #[inline]
    pub fn to_char(&self) -> char {
        match self {
            NucleicAcidCode::A => 'A',
            NucleicAcidCode::C => 'C',
            NucleicAcidCode::G => 'G',
            NucleicAcidCode::T => 'T',
            NucleicAcidCode::U => 'U',
            NucleicAcidCode::N => 'N',
            NucleicAcidCode::R => 'R',
            NucleicAcidCode::Y => 'Y',
            NucleicAcidCode::S => 'S',
            NucleicAcidCode::W => 'W',
            NucleicAcidCode::K => 'K',
            NucleicAcidCode::M => 'M',
            NucleicAcidCode::B => 'B',
            NucleicAcidCode::V => 'V',
            NucleicAcidCode::D => 'D',
            NucleicAcidCode::H => 'H',
        }
    }
}

impl fmt::Display for NucleicAcidCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Parse a whole sequence string into codes.
///
/// Fails on the first unsupported symbol, reporting its 1-based offset.
///
/// # Examples
/// ```
/// use vcf_applicator::core::{codes_from_str, NucleicAcidCode};
///
/// let codes = codes_from_str("acGT").unwrap();
/// assert_eq!(codes[2], NucleicAcidCode::G);
/// assert!(codes_from_str("ACXG").is_err());
/// ```
pub fn codes_from_str(sequence: &str) -> Result<Vec<NucleicAcidCode>, ApplyError> {
    sequence
        .chars()
        .enumerate()
        .map(|(index, symbol)| {
            NucleicAcidCode::from_char(symbol).ok_or(ApplyError::InvalidCode {
                position: index as u64 + 1,
                symbol,
            })
        })
        .collect()
}

/// Render a sequence of codes as a string of canonical symbols.
pub fn codes_to_string<I>(codes: I) -> String
where
    I: IntoIterator<Item = NucleicAcidCode>,
{
    codes.into_iter().map(|code| code.to_char()).collect()
}

/// A nucleotide code together with its 1-based sequence position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeAndPosition {
    pub code: NucleicAcidCode,
    pub position: u64,
}

impl CodeAndPosition {
    pub fn new(code: NucleicAcidCode, position: u64) -> Self {
        Self { code, position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_char_case_insensitive() {
        assert_eq!(NucleicAcidCode::from_char('a'), Some(NucleicAcidCode::A));
        assert_eq!(NucleicAcidCode::from_char('A'), Some(NucleicAcidCode::A));
        assert_eq!(NucleicAcidCode::from_char('g'), Some(NucleicAcidCode::G));
        assert_eq!(NucleicAcidCode::from_char('n'), Some(NucleicAcidCode::N));
    }

    #[test]
    fn test_from_char_ambiguity_codes() {
        for symbol in "RYSWKMBVDH".chars() {
            assert!(NucleicAcidCode::from_char(symbol).is_some());
        }
    }

    #[test]
    fn test_from_char_rejects_unknown() {
        assert_eq!(NucleicAcidCode::from_char('X'), None);
        assert_eq!(NucleicAcidCode::from_char(','), None);
        assert_eq!(NucleicAcidCode::from_char(' '), None);
    }

    #[test]
    fn test_round_trip() {
        for symbol in "ACGTUNRYSWKMBVDH".chars() {
            let code = NucleicAcidCode::from_char(symbol).unwrap();
            assert_eq!(code.to_char(), symbol);
        }
    }

    #[test]
    fn test_codes_from_str() {
        let codes = codes_from_str("ATCGA").unwrap();
        assert_eq!(codes.len(), 5);
        assert_eq!(codes_to_string(codes), "ATCGA");
    }

    #[test]
    fn test_codes_from_str_reports_offset() {
        match codes_from_str("AT!GA") {
            Err(ApplyError::InvalidCode { position, symbol }) => {
                assert_eq!(position, 3);
                assert_eq!(symbol, '!');
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
