//! File format adapters
//!
//! The VCF decoder/encoder and the minimal FASTA support used by the CLI.

pub mod fasta;
pub mod vcf;

pub use fasta::FastaReader;
pub use vcf::{
    lines_from_reader, open_vcf, parse_vcf_text, write_records, write_records_to_path,
    CommentMap, GrammarV4, MetaInfo, ParserRegistry, Records, SampleInfos, VcfData, VcfGrammar,
    VcfParser,
};
