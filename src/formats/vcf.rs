//! VCF format adapter
//!
//! Decodes Variant Call Format text into [`VcfRecord`]s plus header
//! metadata, and serializes records back out.
//!
//! Decoding is two-phase: the comment/header prefix is drained eagerly
//! (grammar selection, column mapping and the `##key=value` comment map all
//! complete up front), then the remaining data lines stream through a lazy,
//! single-pass record iterator.

use crate::core::applicator::{normalize_chromosome, GenomeApplicator};
use crate::core::error::{ParseError, ParseResult};
use crate::core::record::VcfRecord;
use log::{debug, warn};
use memchr::memchr;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Buffer size for reading VCF files (128KB)
const READ_BUFFER_SIZE: usize = 128 * 1024;

/// Buffer size for writing VCF files (64KB)
const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Column header substituted when the file carries none
const DEFAULT_COLUMN_HEADER: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT";

/// Header metadata: `##key=value` lines keyed by name, values in file order.
/// A key may repeat (e.g. multiple `FILTER` definitions).
pub type CommentMap = HashMap<String, Vec<String>>;

/// A versioned VCF grammar.
///
/// Concrete grammars are registered on a [`ParserRegistry`] and selected by
/// descending declared version, first-accepts-wins.
pub trait VcfGrammar {
    /// Declared (major, minor) version, used for registry ordering.
    fn version(&self) -> (u8, u8);

    /// True if this grammar can decode a file with the given header block.
    fn accepts(&self, headers: &[String]) -> bool;
}

/// The shipped VCF 4.x grammar.
///
/// Accepts any header carrying a `##fileformat=VCFv4.<digit>` fingerprint,
/// case-insensitively. The check is a permissive version-family match, not
/// an exact-version comparison.
pub struct GrammarV4;

impl VcfGrammar for GrammarV4 {
    fn version(&self) -> (u8, u8) {
        (4, 1)
    }

    fn accepts(&self, headers: &[String]) -> bool {
        headers.iter().any(|line| detects_version_4(line))
    }
}

fn detects_version_4(line: &str) -> bool {
    let body = line.trim_start_matches('#');
    if body.len() == line.len() {
        return false;
    }
    let lower = body.to_ascii_lowercase();
    match lower.strip_prefix("fileformat=vcfv4.") {
        Some(minor) => minor.chars().next().is_some_and(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Explicit grammar registry, constructed by the caller and passed to the
/// decode entry points.
///
/// Grammars are kept ordered by descending declared version; the first one
/// accepting the header block wins.
pub struct ParserRegistry {
    grammars: Vec<Box<dyn VcfGrammar>>,
}

impl ParserRegistry {
    /// A registry with no grammars. Decoding against it always fails.
    pub fn empty() -> Self {
        Self {
            grammars: Vec::new(),
        }
    }

    /// Register a grammar, re-establishing descending version order.
    pub fn register(mut self, grammar: Box<dyn VcfGrammar>) -> Self {
        self.grammars.push(grammar);
        self.grammars.sort_by(|a, b| b.version().cmp(&a.version()));
        self
    }

    /// Decode a pre-filtered (no blank lines) line sequence.
    ///
    /// Phase 1 drains the leading comment block, selects a grammar and
    /// builds the comment map and column mapping. Phase 2 is the returned
    /// parser's lazy record stream. Fails with
    /// [`ParseError::NoMatchingParser`] when no grammar accepts the header.
    pub fn parse<I>(&self, lines: I) -> ParseResult<VcfParser<I::IntoIter>>
    where
        I: IntoIterator<Item = String>,
    {
        let mut lines = lines.into_iter();
        let mut headers = Vec::new();
        let mut pending = None;
        for line in &mut lines {
            if line.starts_with('#') {
                headers.push(line);
            } else {
                pending = Some(line);
                break;
            }
        }
        let grammar = self
            .grammars
            .iter()
            .find(|grammar| grammar.accepts(&headers))
            .ok_or_else(|| ParseError::NoMatchingParser {
                headers: headers.clone(),
            })?;
        let comments = collect_comments(&headers);
        let columns = determine_columns(&headers);
        Ok(VcfParser {
            version: grammar.version(),
            comments,
            columns,
            pending,
            lines,
        })
    }
}

impl Default for ParserRegistry {
    /// The registry shipping the 4.x grammar.
    fn default() -> Self {
        Self::empty().register(Box::new(GrammarV4))
    }
}

/// Capture `##key=value` header lines into the comment map. Keys are
/// alphanumeric; anything else is not metadata and is ignored here.
fn collect_comments(headers: &[String]) -> CommentMap {
    let mut comments = CommentMap::new();
    for line in headers {
        if let Some(body) = line.strip_prefix("##") {
            if let Some((key, value)) = body.split_once('=') {
                if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric()) {
                    comments
                        .entry(key.to_string())
                        .or_default()
                        .push(value.to_string());
                }
            }
        }
    }
    comments
}

/// The column name list: the last single-`#` header line, or the fixed
/// default when the file carries none.
fn determine_columns(headers: &[String]) -> Arc<[String]> {
    let column_line = headers
        .iter()
        .rev()
        .find(|line| line.starts_with('#') && !line.starts_with("##"))
        .map(String::as_str)
        .unwrap_or(DEFAULT_COLUMN_HEADER);
    column_line
        .trim_start_matches('#')
        .trim()
        .split('\t')
        .map(str::to_string)
        .collect()
}

/// Decoded header block plus the lazy record stream.
///
/// The comment map and column mapping are complete on construction; the
/// record stream is single-pass and non-restartable.
pub struct VcfParser<I> {
    version: (u8, u8),
    comments: CommentMap,
    columns: Arc<[String]>,
    pending: Option<String>,
    lines: I,
}

impl<I> VcfParser<I>
where
    I: Iterator<Item = String>,
{
    /// The (major, minor) version of the grammar that accepted the file.
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// The `##key=value` header metadata. Fully populated before any record
    /// is pulled.
    pub fn comments(&self) -> &CommentMap {
        &self.comments
    }

    /// The column names applied to data lines.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Consume the parser into its lazy record iterator. Once the iterator
    /// is exhausted the underlying text source is too; re-reading requires
    /// re-acquiring the source.
    pub fn records(self) -> Records<I> {
        Records {
            columns: self.columns,
            pending: self.pending,
            lines: self.lines,
        }
    }
}

/// Lazy, single-pass iterator over decoded records.
pub struct Records<I> {
    columns: Arc<[String]>,
    pending: Option<String>,
    lines: I,
}

impl<I> Iterator for Records<I>
where
    I: Iterator<Item = String>,
{
    type Item = VcfRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.pending.take().or_else(|| self.lines.next())?;
            if line.starts_with('#') {
                // the header block ended before the first data line; stray
                // comments are not re-captured
                debug!("Skipping comment line between data lines: {}", line);
                continue;
            }
            return Some(map_to_record(&line, &self.columns));
        }
    }
}

/// Split on tabs, preserving empty tokens so consecutive tabs yield empty
/// fields.
fn split_tabs(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::with_capacity(10);
    let mut start = 0;
    while let Some(offset) = memchr(b'\t', &bytes[start..]) {
        tokens.push(&line[start..start + offset]);
        start += offset + 1;
    }
    tokens.push(&line[start..]);
    tokens
}

fn take_field(mapped: &mut Vec<(String, String)>, name: &str) -> String {
    mapped
        .iter()
        .position(|(column, _)| column == name)
        .map(|index| mapped.remove(index).1)
        .unwrap_or_default()
}

/// Zip one data line against the column names. Tokens without a column are
/// dropped with a warning; columns beyond the nine fixed ones become the
/// record's sample fields in file order.
fn map_to_record(line: &str, columns: &[String]) -> VcfRecord {
    let tokens = split_tabs(line);
    let mut mapped: Vec<(String, String)> = Vec::with_capacity(tokens.len());
    for (index, token) in tokens.iter().enumerate() {
        match columns.get(index) {
            Some(column) if !column.trim().is_empty() => {
                mapped.push((column.clone(), token.to_string()));
            }
            _ => warn!("Unmapped field value: {}({})", token, line),
        }
    }
    let chromosome = take_field(&mut mapped, "CHROM");
    let position = take_field(&mut mapped, "POS");
    let id = take_field(&mut mapped, "ID");
    let reference = take_field(&mut mapped, "REF");
    let alternative_alleles = take_field(&mut mapped, "ALT");
    let quality = take_field(&mut mapped, "QUAL");
    let filter = take_field(&mut mapped, "FILTER");
    let info = take_field(&mut mapped, "INFO");
    let format = take_field(&mut mapped, "FORMAT");
    VcfRecord::new(
        chromosome,
        position,
        id,
        reference,
        alternative_alleles,
        quality,
        filter,
        info,
        format,
        mapped,
    )
}

/// Lazily read lines from a buffered reader, dropping blank lines.
///
/// A mid-stream I/O failure terminates the sequence with a logged warning;
/// open-time failures surface through [`open_vcf`].
pub fn lines_from_reader<R>(reader: R) -> impl Iterator<Item = String>
where
    R: BufRead,
{
    let mut lines = reader.lines();
    std::iter::from_fn(move || loop {
        match lines.next()? {
            Ok(line) => {
                if !line.trim().is_empty() {
                    return Some(line);
                }
            }
            Err(error) => {
                warn!("Aborting VCF read after I/O error: {}", error);
                return None;
            }
        }
    })
}

/// Open a VCF file and decode it with the given registry.
pub fn open_vcf<P: AsRef<Path>>(
    registry: &ParserRegistry,
    path: P,
) -> ParseResult<VcfParser<impl Iterator<Item = String>>> {
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    registry.parse(lines_from_reader(reader))
}

/// Decode VCF content held in memory.
pub fn parse_vcf_text(
    registry: &ParserRegistry,
    content: &str,
) -> ParseResult<VcfParser<impl Iterator<Item = String>>> {
    let lines: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();
    registry.parse(lines)
}

/// Fully decoded, in-memory VCF content: records grouped eagerly by
/// normalized chromosome, plus the header metadata.
pub struct VcfData {
    chromosome_to_records: Arc<BTreeMap<String, Vec<VcfRecord>>>,
    comments: CommentMap,
}

impl VcfData {
    /// Drain a parser into memory. The record stream is consumed fully.
    pub fn from_parser<I>(parser: VcfParser<I>) -> Self
    where
        I: Iterator<Item = String>,
    {
        let comments = parser.comments().clone();
        let mut grouped: BTreeMap<String, Vec<VcfRecord>> = BTreeMap::new();
        for record in parser.records() {
            grouped
                .entry(normalize_chromosome(record.chromosome()))
                .or_default()
                .push(record);
        }
        Self {
            chromosome_to_records: Arc::new(grouped),
            comments,
        }
    }

    /// Read and decode a file with the default registry.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        Ok(Self::from_parser(open_vcf(&ParserRegistry::default(), path)?))
    }

    /// Decode in-memory content with the default registry.
    pub fn from_text(content: &str) -> ParseResult<Self> {
        Ok(Self::from_parser(parse_vcf_text(
            &ParserRegistry::default(),
            content,
        )?))
    }

    /// All records, grouped-chromosome order.
    pub fn records(&self) -> impl Iterator<Item = &VcfRecord> {
        self.chromosome_to_records.values().flatten()
    }

    /// The records of one chromosome; lookup is case-insensitive with the
    /// `chr` prefix stripped.
    pub fn records_for_chromosome(&self, chromosome: &str) -> &[VcfRecord] {
        self.chromosome_to_records
            .get(&normalize_chromosome(chromosome))
            .map(|records| records.as_slice())
            .unwrap_or(&[])
    }

    /// The normalized chromosome names present in the file.
    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.chromosome_to_records.keys().map(String::as_str)
    }

    pub fn record_count(&self) -> usize {
        self.chromosome_to_records.values().map(Vec::len).sum()
    }

    /// The raw header metadata.
    pub fn comments(&self) -> &CommentMap {
        &self.comments
    }

    /// A genome applicator sharing this data's record grouping.
    pub fn applicator(&self) -> GenomeApplicator {
        GenomeApplicator::new(Arc::clone(&self.chromosome_to_records))
    }

    /// The typed header-metadata view.
    pub fn meta_info(&self) -> MetaInfo<'_> {
        MetaInfo {
            comments: &self.comments,
        }
    }
}

/// Typed view over the header metadata.
pub struct MetaInfo<'a> {
    comments: &'a CommentMap,
}

impl<'a> MetaInfo<'a> {
    fn first(&self, key: &str) -> Option<&'a str> {
        self.comments
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// The `##fileformat` value.
    pub fn file_format(&self) -> Option<&'a str> {
        self.first("fileformat")
    }

    /// The `##fileDate` value.
    pub fn file_date(&self) -> Option<&'a str> {
        self.first("fileDate")
    }

    /// The `##reference` value.
    pub fn reference(&self) -> Option<&'a str> {
        self.first("reference")
    }

    /// The first `hg<digits>` or `GRCh<digits>` token found in the
    /// reference value, original casing preserved.
    pub fn parsed_human_reference_genome(&self) -> Option<String> {
        self.reference().and_then(find_genome_build)
    }

    /// The `##SAMPLE` entries, keyed by their `ID` field.
    pub fn sample_infos(&self) -> SampleInfos {
        let mut samples = Vec::new();
        if let Some(values) = self.comments.get("SAMPLE") {
            for value in values {
                for group in angle_groups(value) {
                    let fields: Vec<(String, String)> = group
                        .split(',')
                        .filter_map(|pair| pair.split_once('='))
                        .map(|(key, value)| (key.to_string(), value.to_string()))
                        .collect();
                    if let Some((_, id)) = fields.iter().find(|(key, _)| key == "ID") {
                        samples.push((id.clone(), fields.clone()));
                    }
                }
            }
        }
        SampleInfos { samples }
    }
}

/// Parsed `##SAMPLE` metadata entries.
pub struct SampleInfos {
    samples: Vec<(String, Vec<(String, String)>)>,
}

impl SampleInfos {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.samples.iter().map(|(id, _)| id.as_str())
    }

    pub fn get(&self, id: &str) -> Option<&[(String, String)]> {
        self.samples
            .iter()
            .find(|(sample_id, _)| sample_id == id)
            .map(|(_, fields)| fields.as_slice())
    }

    pub fn value(&self, id: &str, key: &str) -> Option<&str> {
        self.get(id)?
            .iter()
            .find(|(field, _)| field == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Extract every `<...>` group from a header value.
fn angle_groups(value: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut rest = value;
    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(close) => {
                groups.push(&after[..close]);
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    groups
}

/// Find the first human genome build token (`hg` or `GRCh` followed by
/// digits) in a reference description, case-insensitively.
fn find_genome_build(reference: &str) -> Option<String> {
    let bytes = reference.as_bytes();
    for start in 0..bytes.len() {
        for prefix in ["hg", "grch"] {
            let end = start + prefix.len();
            if end > bytes.len() {
                continue;
            }
            if bytes[start..end].eq_ignore_ascii_case(prefix.as_bytes()) {
                let digits = bytes[end..]
                    .iter()
                    .take_while(|b| b.is_ascii_digit())
                    .count();
                if digits > 0 {
                    return Some(reference[start..end + digits].to_string());
                }
            }
        }
    }
    None
}

/// Serialize records to VCF text.
///
/// Emits a fixed `##fileformat=VCFv4.3` header and the nine fixed columns
/// plus one synthetic sample column, then one tab-joined line per record.
pub fn write_records<'a, W, I>(records: I, writer: &mut W) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a VcfRecord>,
{
    writeln!(writer, "##fileformat=VCFv4.3")?;
    writeln!(
        writer,
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t000000001"
    )?;
    for record in records {
        let mut fields: Vec<&str> = vec![
            record.chromosome(),
            record.position(),
            record.id(),
            record.reference(),
            record.alternative_alleles(),
            record.quality(),
            record.filter(),
            record.info(),
            record.format(),
        ];
        fields.extend(record.sample_fields().iter().map(|(_, value)| value.as_str()));
        writeln!(writer, "{}", fields.join("\t"))?;
    }
    writer.flush()
}

/// Write records to a file, creating parent directories as needed.
pub fn write_records_to_path<'a, P, I>(records: I, path: P) -> std::io::Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a VcfRecord>,
{
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, File::create(path)?);
    write_records(records, &mut writer)
}
