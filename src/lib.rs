//! VcfApplicator - VCF decoding and allele-specific genome application
//!
//! Decodes Variant Call Format text into typed records and applies the
//! decoded variants to a reference nucleotide sequence, producing the
//! individual's allele-specific sequence.
//!
//! # Features
//!
//! - Streaming, single-pass record decoding with header metadata capture
//! - Version-sniffing grammar registry (VCF 4.x shipped, open to more)
//! - Genotype-driven allele assignment (GT codes, two haplotype copies)
//! - One-pass substitution/insertion/deletion transduction with
//!   reference-integrity checks and output position renumbering
//!
//! # Example
//!
//! ```ignore
//! use vcf_applicator::{codes_from_str, VcfData};
//!
//! let data = VcfData::from_path("genome.vcf")?;
//! let applicator = data.applicator();
//!
//! let reference = codes_from_str("ATCGA")?;
//! let sequence: Result<Vec<_>, _> = applicator
//!     .using_primary_allele()
//!     .apply_to_sequence("1", reference)?
//!     .collect();
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use crate::core::{
    codes_from_str, codes_to_string, normalize_chromosome, Allele, AlleleApplicator, ApplyError,
    ApplyResult, CodeAndPosition, GenomeApplicator, Genotype, NucleicAcidCode, ParseError,
    ParseResult, PositionMap, Replacement, Replacements, SampleFieldError, SampleFields,
    Transduction, VcfError, VcfRecord,
};
pub use crate::formats::{ParserRegistry, VcfData, VcfParser};
