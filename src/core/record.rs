//! Variant record model
//!
//! A [`VcfRecord`] is the typed, read-only view over one decoded data line.
//! Derived views ([`SampleFields`], [`InfoMap`]) are recomputed on demand and
//! never stored back into the record.

use crate::core::error::{SampleFieldError, SampleFieldResult};
use std::collections::BTreeSet;

/// Header list used by snpEff for the ANN info sub-field.
const ANNOTATION_HEADERS: [&str; 16] = [
    "Allele",
    "Annotation",
    "Annotation_Impact",
    "Gene_Name",
    "Gene_ID",
    "Feature_Type",
    "Feature_ID",
    "Transcript_BioType",
    "Rank",
    "HGVS.c",
    "HGVS.p",
    "cDNA.pos / cDNA.length",
    "CDS.pos / CDS.length",
    "AA.pos / AA.length",
    "Distance",
    "ERRORS / WARNINGS / INFO",
];

/// Header list used by snpEff for the LOF info sub-field.
const LOSS_OF_FUNCTION_HEADERS: [&str; 4] = [
    "Gene_Name",
    "Gene_ID",
    "Number_of_transcripts_in_gene",
    "Percent_of_transcripts_affected",
];

/// Genotype classification over the literal GT code set.
///
/// Matching is exact, case-insensitive string comparison against the code
/// lists, not numeric allele-count parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genotype {
    /// "0/0" or "0"
    ReferenceBoth,
    /// "1/0" or "0/1"
    ReferenceAndAlternative,
    /// "1/0"
    FirstAlleleAlternative,
    /// "0/1"
    SecondAlleleAlternative,
    /// "1" or "1/1"
    AlternativeBoth,
}

impl Genotype {
    fn matching_codes(&self) -> &'static [&'static str] {
        match self {
            Genotype::ReferenceBoth => &["0/0", "0"],
            Genotype::ReferenceAndAlternative => &["1/0", "0/1"],
            Genotype::FirstAlleleAlternative => &["1/0"],
            Genotype::SecondAlleleAlternative => &["0/1"],
            Genotype::AlternativeBoth => &["1", "1/1"],
        }
    }

    /// True if the raw GT code matches this classification.
    pub fn matches(&self, code: &str) -> bool {
        self.matching_codes()
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(code))
    }
}

/// Which haplotype side a depth query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allele {
    Reference,
    Alternative,
}

/// Insertion-ordered key/value view over the INFO column.
///
/// Values are optional: a pair without `=` carries a key only. Duplicate
/// keys overwrite the earlier value while keeping the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoMap {
    entries: Vec<(String, Option<String>)>,
}

impl InfoMap {
    fn insert(&mut self, key: String, value: Option<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// The value for a key, flattened: `None` when the key is absent or has
    /// no value. Use [`InfoMap::contains_key`] to tell the two apart.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One decoded variant line.
///
/// Immutable once constructed. All columns are kept as raw text; typed
/// interpretations ([`VcfRecord::position_as_u64`], [`VcfRecord::parse_info`],
/// [`VcfRecord::parse_sample_fields`]) are derived lazily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcfRecord {
    chromosome: String,
    position: String,
    id: String,
    reference: String,
    alternative_alleles: String,
    quality: String,
    filter: String,
    info: String,
    format: String,
    sample_fields: Vec<(String, String)>,
}

impl VcfRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chromosome: String,
        position: String,
        id: String,
        reference: String,
        alternative_alleles: String,
        quality: String,
        filter: String,
        info: String,
        format: String,
        sample_fields: Vec<(String, String)>,
    ) -> Self {
        Self {
            chromosome,
            position,
            id,
            reference,
            alternative_alleles,
            quality,
            filter,
            info,
            format,
            sample_fields,
        }
    }

    /// The CHROM column as written in the file.
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// The POS column as raw text.
    pub fn position(&self) -> &str {
        &self.position
    }

    /// The POS column parsed as a 1-based position. Unparseable text maps
    /// to 0.
    pub fn position_as_u64(&self) -> u64 {
        self.position.trim().parse().unwrap_or(0)
    }

    /// The ID column as raw text.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All semicolon-separated identifiers, with blanks and `.` dropped.
    pub fn ids(&self) -> BTreeSet<String> {
        self.id
            .split(';')
            .map(str::trim)
            .filter(|token| !token.is_empty() && *token != ".")
            .map(str::to_string)
            .collect()
    }

    /// The REF column.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The ALT column; comma-separated when multiple alleles are called.
    pub fn alternative_alleles(&self) -> &str {
        &self.alternative_alleles
    }

    /// The QUAL column.
    pub fn quality(&self) -> &str {
        &self.quality
    }

    /// The FILTER column.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// The raw INFO column. See [`VcfRecord::parse_info`].
    pub fn info(&self) -> &str {
        &self.info
    }

    /// The FORMAT column, e.g. `GT:GQ:DP:AD`.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The sample columns in file order, name to raw value.
    pub fn sample_fields(&self) -> &[(String, String)] {
        &self.sample_fields
    }

    /// Split the INFO column into an insertion-ordered map.
    ///
    /// Pairs are separated by `;`; each pair splits on the first `=`, and a
    /// pair without `=` yields a valueless key.
    pub fn parse_info(&self) -> InfoMap {
        let mut map = InfoMap::default();
        if self.info.trim().is_empty() {
            return map;
        }
        for pair in self.info.split(';').filter(|pair| !pair.is_empty()) {
            match pair.split_once('=') {
                Some((key, value)) => map.insert(key.to_string(), Some(value.to_string())),
                None => map.insert(pair.to_string(), None),
            }
        }
        map
    }

    /// The value of one INFO key, `None` when absent or valueless.
    pub fn info_value(&self, key: &str) -> Option<String> {
        self.parse_info().value_of(key).map(str::to_string)
    }

    /// True if the INFO key is present, with or without a value.
    pub fn has_info(&self, key: &str) -> bool {
        self.parse_info().contains_key(key)
    }

    /// The snpEff ANN sub-field split on `|` and zipped against its fixed
    /// header list. Empty when no ANN info is present.
    pub fn annotation(&self) -> Vec<(String, String)> {
        match self.info_value("ANN") {
            Some(ann) if !ann.trim().is_empty() => ANNOTATION_HEADERS
                .iter()
                .zip(ann.split('|'))
                .map(|(header, token)| (header.to_string(), token.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// One field of [`VcfRecord::annotation`] by header name.
    pub fn annotation_value(&self, header: &str) -> Option<String> {
        self.annotation()
            .into_iter()
            .find(|(h, _)| h == header)
            .map(|(_, value)| value)
    }

    /// The snpEff LOF sub-field, surrounding parentheses stripped, split on
    /// `|` and zipped against its fixed header list.
    pub fn loss_of_function(&self) -> Vec<(String, String)> {
        match self.info_value("LOF") {
            Some(lof) if !lof.trim().is_empty() => {
                let body = lof.strip_prefix('(').unwrap_or(&lof);
                let body = body.strip_suffix(')').unwrap_or(body);
                LOSS_OF_FUNCTION_HEADERS
                    .iter()
                    .zip(body.split('|'))
                    .map(|(header, token)| (header.to_string(), token.to_string()))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// The LOF `Percent_of_transcripts_affected` value, 0.0 when absent or
    /// unparseable.
    pub fn loss_of_function_prediction(&self) -> f64 {
        self.loss_of_function()
            .into_iter()
            .find(|(header, _)| header == "Percent_of_transcripts_affected")
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or(0.0)
    }

    /// The gene name, uppercased: the `Gene` info token before `/`, falling
    /// back to the annotation's `Gene_Name`.
    pub fn gene(&self) -> Option<String> {
        let from_info = self
            .info_value("Gene")
            .and_then(|gene| gene.split('/').next().map(str::to_string))
            .map(|gene| gene.trim().to_uppercase())
            .filter(|gene| !gene.is_empty());
        from_info.or_else(|| {
            self.annotation_value("Gene_Name")
                .map(|gene| gene.trim().to_uppercase())
                .filter(|gene| !gene.is_empty())
        })
    }

    pub fn has_gene(&self) -> bool {
        self.gene().is_some()
    }

    /// True if any comma-separated ALT token is strictly longer than REF.
    pub fn has_insertion(&self) -> bool {
        let reference_length = self.reference.len();
        self.alternative_alleles
            .split(',')
            .map(str::trim)
            .any(|allele| allele.len() > reference_length)
    }

    /// True if any comma-separated ALT token is strictly shorter than REF.
    ///
    /// A record can be neither, or in multi-allelic lines nominally both.
    pub fn has_deletion(&self) -> bool {
        let reference_length = self.reference.len();
        self.alternative_alleles
            .split(',')
            .map(str::trim)
            .any(|allele| allele.len() < reference_length)
    }

    /// Parse the sample columns against the FORMAT keys.
    pub fn parse_sample_fields(&self) -> SampleFields {
        let format_keys: Vec<&str> = if self.format.is_empty() {
            Vec::new()
        } else {
            self.format.split(':').collect()
        };
        let sample_to_fields = self
            .sample_fields
            .iter()
            .map(|(sample, value)| {
                // Best-effort zip: a token count mismatch truncates to the
                // shorter side instead of failing.
                let fields = format_keys
                    .iter()
                    .zip(value.split(':'))
                    .map(|(key, token)| (key.to_string(), token.to_string()))
                    .collect();
                (sample.clone(), fields)
            })
            .collect();
        SampleFields {
            sample_to_fields,
            reference: self.reference.clone(),
            alternative: self.alternative_alleles.clone(),
        }
    }

    /// True if any sample's GT code matches the genotype classification.
    pub fn has_genotype(&self, genotype: Genotype) -> bool {
        self.parse_sample_fields().has_genotype(genotype)
    }
}

/// Derived per-sample view: sample name to (format key to value).
#[derive(Debug, Clone)]
pub struct SampleFields {
    sample_to_fields: Vec<(String, Vec<(String, String)>)>,
    reference: String,
    alternative: String,
}

impl SampleFields {
    /// The full sample to field mapping in file order.
    pub fn get(&self) -> &[(String, Vec<(String, String)>)] {
        &self.sample_to_fields
    }

    /// Sample name to value for one format key; samples lacking the key are
    /// omitted.
    pub fn filter_by_field(&self, field: &str) -> Vec<(&str, &str)> {
        self.sample_to_fields
            .iter()
            .filter_map(|(sample, fields)| {
                fields
                    .iter()
                    .find(|(key, _)| key == field)
                    .map(|(_, value)| (sample.as_str(), value.as_str()))
            })
            .collect()
    }

    /// Distinct values of one format key across samples, first-seen order.
    pub fn values_for_field(&self, field: &str) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for (_, value) in self.filter_by_field(field) {
            if !values.iter().any(|seen| seen == value) {
                values.push(value.to_string());
            }
        }
        values
    }

    /// The single consensus value of a format key across all samples.
    ///
    /// Returns `None` when no sample carries the key, and a
    /// [`SampleFieldError::NonUniqueValue`] when samples disagree.
    pub fn unique_value(&self, field: &str) -> SampleFieldResult<Option<String>> {
        let values = self.values_for_field(field);
        if values.len() > 1 {
            return Err(SampleFieldError::NonUniqueValue {
                field: field.to_string(),
                values,
            });
        }
        Ok(values.into_iter().next())
    }

    /// True if any sample's GT code matches the genotype classification.
    /// GT codes are deduplicated across samples before matching.
    pub fn has_genotype(&self, genotype: Genotype) -> bool {
        self.values_for_field("GT")
            .iter()
            .any(|code| genotype.matches(code))
    }

    /// The consensus DP value as an integer, 0 when absent or unparseable.
    pub fn unique_coverage_depth(&self) -> SampleFieldResult<u64> {
        Ok(self
            .unique_value("DP")?
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0))
    }

    /// The consensus allele depth for one allele: AD values zipped against
    /// the AB allele-order keys, looked up by the record's REF or ALT
    /// string. 0 when the allele is not listed.
    pub fn unique_allele_depth(&self, allele: Allele) -> SampleFieldResult<u64> {
        let allele_code = match allele {
            Allele::Reference => &self.reference,
            Allele::Alternative => &self.alternative,
        };
        let depths = self.unique_value("AD")?.unwrap_or_default();
        let order = self.unique_value("AB")?.unwrap_or_default();
        let depth = order
            .split(',')
            .zip(depths.split(','))
            .find(|(key, _)| *key == allele_code.as_str())
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0);
        Ok(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        reference: &str,
        alternative: &str,
        info: &str,
        format: &str,
        samples: &[(&str, &str)],
    ) -> VcfRecord {
        VcfRecord::new(
            "1".to_string(),
            "123".to_string(),
            "rs1;rs2;.".to_string(),
            reference.to_string(),
            alternative.to_string(),
            "30".to_string(),
            "PASS".to_string(),
            info.to_string(),
            format.to_string(),
            samples
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_position_parsing() {
        let record = record("A", "G", "", "", &[]);
        assert_eq!(record.position_as_u64(), 123);

        let garbled = VcfRecord::new(
            "1".into(),
            "abc".into(),
            ".".into(),
            "A".into(),
            "G".into(),
            ".".into(),
            ".".into(),
            ".".into(),
            "".into(),
            Vec::new(),
        );
        assert_eq!(garbled.position_as_u64(), 0);
    }

    #[test]
    fn test_ids_drop_dot_and_blanks() {
        let record = record("A", "G", "", "", &[]);
        let ids = record.ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("rs1"));
        assert!(ids.contains("rs2"));
    }

    #[test]
    fn test_parse_info_pairs_and_flags() {
        let record = record("A", "G", "DP=100;AF=0.5;DB", "", &[]);
        let info = record.parse_info();
        assert_eq!(info.value_of("DP"), Some("100"));
        assert_eq!(info.value_of("AF"), Some("0.5"));
        assert_eq!(info.value_of("DB"), None);
        assert!(info.contains_key("DB"));
        assert!(!info.contains_key("MQ"));
        assert!(record.has_info("DB"));
        assert_eq!(record.info_value("DP").as_deref(), Some("100"));
    }

    #[test]
    fn test_parse_info_splits_on_first_equals() {
        let record = record("A", "G", "KEY=a=b", "", &[]);
        assert_eq!(record.parse_info().value_of("KEY"), Some("a=b"));
    }

    #[test]
    fn test_parse_info_duplicate_overwrites() {
        let record = record("A", "G", "DP=1;DP=2", "", &[]);
        let info = record.parse_info();
        assert_eq!(info.len(), 1);
        assert_eq!(info.value_of("DP"), Some("2"));
    }

    #[test]
    fn test_insertion_and_deletion_predicates() {
        assert!(record("A", "AG", "", "", &[]).has_insertion());
        assert!(!record("A", "AG", "", "", &[]).has_deletion());
        assert!(record("AG", "A", "", "", &[]).has_deletion());
        assert!(!record("AG", "A", "", "", &[]).has_insertion());
        assert!(!record("A", "G", "", "", &[]).has_insertion());
        assert!(!record("A", "G", "", "", &[]).has_deletion());
        // multi-allelic line that is nominally both
        let both = record("AG", "A,AGT", "", "", &[]);
        assert!(both.has_insertion());
        assert!(both.has_deletion());
    }

    #[test]
    fn test_sample_fields_zip() {
        let record = record(
            "C",
            "T",
            "",
            "GT:DP:AD:AB",
            &[("S1", "0/1:4:1,3:C,T")],
        );
        let fields = record.parse_sample_fields();
        assert_eq!(fields.filter_by_field("GT"), vec![("S1", "0/1")]);
        assert_eq!(fields.unique_value("GT").unwrap().as_deref(), Some("0/1"));
        assert_eq!(fields.unique_coverage_depth().unwrap(), 4);
        assert_eq!(fields.unique_allele_depth(Allele::Reference).unwrap(), 1);
        assert_eq!(fields.unique_allele_depth(Allele::Alternative).unwrap(), 3);
    }

    #[test]
    fn test_sample_fields_truncating_zip() {
        // value has fewer tokens than the format declares
        let record = record("C", "T", "", "GT:DP:AD", &[("S1", "0/1:4")]);
        let fields = record.parse_sample_fields();
        assert_eq!(fields.unique_value("GT").unwrap().as_deref(), Some("0/1"));
        assert_eq!(fields.unique_value("AD").unwrap(), None);
    }

    #[test]
    fn test_genotype_classification() {
        let het = record("C", "T", "", "GT", &[("S1", "0/1")]);
        assert!(het.has_genotype(Genotype::ReferenceAndAlternative));
        assert!(het.has_genotype(Genotype::SecondAlleleAlternative));
        assert!(!het.has_genotype(Genotype::FirstAlleleAlternative));
        assert!(!het.has_genotype(Genotype::ReferenceBoth));
        assert!(!het.has_genotype(Genotype::AlternativeBoth));

        let hom = record("C", "T", "", "GT", &[("S1", "1/1")]);
        assert!(hom.has_genotype(Genotype::AlternativeBoth));
        assert!(!hom.has_genotype(Genotype::ReferenceAndAlternative));

        let haploid = record("C", "T", "", "GT", &[("S1", "1")]);
        assert!(haploid.has_genotype(Genotype::AlternativeBoth));
    }

    #[test]
    fn test_non_unique_sample_value() {
        let record = record("C", "T", "", "GT", &[("S1", "0/1"), ("S2", "1/1")]);
        let fields = record.parse_sample_fields();
        match fields.unique_value("GT") {
            Err(SampleFieldError::NonUniqueValue { field, values }) => {
                assert_eq!(field, "GT");
                assert_eq!(values, vec!["0/1".to_string(), "1/1".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unique_value_agreeing_samples() {
        let record = record("C", "T", "", "GT", &[("S1", "0/1"), ("S2", "0/1")]);
        let fields = record.parse_sample_fields();
        assert_eq!(fields.unique_value("GT").unwrap().as_deref(), Some("0/1"));
    }

    #[test]
    fn test_annotation_zip() {
        let record = record(
            "A",
            "G",
            "ANN=G|missense_variant|MODERATE|BHMT|ENSG123",
            "",
            &[],
        );
        assert_eq!(record.annotation_value("Allele").as_deref(), Some("G"));
        assert_eq!(record.annotation_value("Gene_Name").as_deref(), Some("BHMT"));
        assert_eq!(record.annotation_value("Distance"), None);
    }

    #[test]
    fn test_loss_of_function() {
        let record = record("A", "G", "LOF=(BHMT|ENSG123|4|0.25)", "", &[]);
        assert_eq!(record.loss_of_function_prediction(), 0.25);
        let none = record_without_lof();
        assert_eq!(none.loss_of_function_prediction(), 0.0);
    }

    fn record_without_lof() -> VcfRecord {
        record("A", "G", "DP=1", "", &[])
    }

    #[test]
    fn test_gene_fallback_to_annotation() {
        let direct = record("A", "G", "Gene=bhmt/other", "", &[]);
        assert_eq!(direct.gene().as_deref(), Some("BHMT"));

        let via_annotation = record("A", "G", "ANN=G|missense|MOD|fmo3|ENSG1", "", &[]);
        assert_eq!(via_annotation.gene().as_deref(), Some("FMO3"));

        let none = record("A", "G", "DP=1", "", &[]);
        assert!(!none.has_gene());
    }
}
