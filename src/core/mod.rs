//! Core genome application functionality
//!
//! This module contains the nucleic-acid alphabet, the variant record
//! model and the replacement model builder with its allele-specific
//! sequence transducer.

pub mod applicator;
pub mod error;
pub mod nucleotide;
pub mod record;

pub use applicator::{
    normalize_chromosome, AlleleApplicator, GenomeApplicator, PositionMap, Replacement,
    Replacements, Transduction,
};
pub use error::{
    ApplyError, ApplyResult, ParseError, ParseResult, Result, SampleFieldError,
    SampleFieldResult, VcfError,
};
pub use nucleotide::{codes_from_str, codes_to_string, CodeAndPosition, NucleicAcidCode};
pub use record::{Allele, Genotype, InfoMap, SampleFields, VcfRecord};
