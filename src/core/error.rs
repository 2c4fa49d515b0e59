//! Error types for VcfApplicator
//!
//! Defines all error types used throughout the library.

use crate::core::nucleotide::NucleicAcidCode;
use thiserror::Error;

/// Main error type for VcfApplicator operations
#[derive(Debug, Error)]
pub enum VcfError {
    /// Format decoding errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Genome application errors
    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),

    /// Sample field resolution errors
    #[error("Sample field error: {0}")]
    SampleField(#[from] SampleFieldError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while decoding VCF text
#[derive(Debug, Error)]
pub enum ParseError {
    /// No registered grammar accepted the header block
    #[error("No parser found matching headers: {}", .headers.join("\t"))]
    NoMatchingParser { headers: Vec<String> },

    /// I/O error while reading lines
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while building or applying the replacement model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The observed code in the input sequence does not match the modeled
    /// reference code. Signals a wrong reference build, an off-by-one or a
    /// wrong chromosome.
    #[error("Reference code did not match: {actual}<->{expected} at position {position} on chromosome {chromosome}")]
    ReferenceMismatch {
        chromosome: String,
        position: u64,
        expected: NucleicAcidCode,
        actual: NucleicAcidCode,
    },

    /// A REF/ALT column contained a symbol outside the nucleic-acid alphabet
    #[error("Invalid nucleic acid symbol '{symbol}' at position {position}")]
    InvalidCode { position: u64, symbol: char },

    /// Allele counting over an empty record set
    #[error("Record set contains no variants")]
    NoRecords,
}

/// Errors that can occur while resolving per-sample field values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleFieldError {
    /// A consensus value was requested for a field that varies across samples
    #[error("Non-unique sample value for field {field}: {}", .values.join(","))]
    NonUniqueValue { field: String, values: Vec<String> },
}

/// Result type alias for VcfApplicator operations
pub type Result<T> = std::result::Result<T, VcfError>;

/// Result type alias for decoding operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type alias for genome application operations
pub type ApplyResult<T> = std::result::Result<T, ApplyError>;

/// Result type alias for sample field resolution
pub type SampleFieldResult<T> = std::result::Result<T, SampleFieldError>;
