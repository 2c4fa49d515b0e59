//! End-to-end scenarios: decode VCF content and apply it to reference
//! sequences, covering substitution, insertion, deletion, per-allele
//! assignment and metadata extraction.

use std::io::Write;
use vcf_applicator::{
    codes_from_str, codes_to_string, Allele, ApplyError, CodeAndPosition, GenomeApplicator,
    NucleicAcidCode, ParseError, VcfData,
};

/// Substitution on chromosome 1, deletion on 2, insertion on 3. All
/// homozygous-alternative so the primary allele carries every edit.
const MIXED_EDITS: &str = "\
##fileformat=VCFv4.1
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1
1\t3\t.\tC\tG\t.\t.\t.\tGT\t1/1
2\t3\t.\tC\t\t.\t.\t.\tGT\t1/1
3\t4\t.\t\tA\t.\t.\t.\tGT\t1/1
";

/// Two heterozygous records colliding at position 3 of chromosome 1, one
/// per allele.
const PER_ALLELE: &str = "\
##fileformat=VCFv4.1
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1
1\t3\t.\tC\tG\t.\t.\t.\tGT\t1/0
1\t3\t.\tC\tA\t.\t.\t.\tGT\t0/1
";

/// A second-allele heterozygous record plus one with no resolvable
/// genotype.
const ALLELE_SPECIFIC: &str = "\
##fileformat=VCFv4.1
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1
1\t3\t.\tC\tG\t.\t.\t.\tGT\t0/1
1\t10\t.\tA\tT\t.\t.\t.\tGT\t./.
";

/// Multi-sample file with depth metrics.
const SAMPLE_METRICS: &str = "\
##fileformat=VCFv4.1
##fileDate=20170101
##reference=/tmp/local_ngs_data/GRCh37.fa
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1
1\t1\t.\tA\tG\t.\t.\t.\tGT:DP:AD:AB\t1/1:7:0,7:A,G
1\t3\trs99\tC\tT\t.\t.\t.\tGT:DP:AD:AB\t0/1:4:1,3:C,T
";

fn apply(data: &VcfData, allele: usize, chromosome: &str, sequence: &str) -> String {
    let applicator = data.applicator();
    let codes = codes_from_str(sequence).unwrap();
    let output: Result<Vec<_>, _> = applicator
        .using_allele(allele)
        .apply_to_sequence(chromosome, codes)
        .unwrap()
        .collect();
    codes_to_string(output.unwrap())
}

#[test]
fn applies_substitution_deletion_and_insertion() {
    let data = VcfData::from_text(MIXED_EDITS).unwrap();
    assert_eq!(apply(&data, 0, "X", "ATCGA"), "ATCGA");
    assert_eq!(apply(&data, 0, "1", "ATCGA"), "ATGGA");
    assert_eq!(apply(&data, 0, "2", "ATCGA"), "ATGA");
    assert_eq!(apply(&data, 0, "3", "ATCGA"), "ATCAGA");
}

#[test]
fn insertion_renumbers_downstream_positions() {
    let data = VcfData::from_text(MIXED_EDITS).unwrap();
    let positioned = codes_from_str("ATCGA")
        .unwrap()
        .into_iter()
        .enumerate()
        .map(|(index, code)| CodeAndPosition::new(code, index as u64 + 1));
    let applicator = data.applicator();
    let output: Result<Vec<_>, _> = applicator
        .using_primary_allele()
        .apply_to_positioned_sequence("3", positioned)
        .unwrap()
        .collect();
    let rendered: Vec<(char, u64)> = output
        .unwrap()
        .iter()
        .map(|pair| (pair.code.to_char(), pair.position))
        .collect();
    assert_eq!(
        rendered,
        vec![('A', 1), ('T', 2), ('C', 3), ('A', 4), ('G', 5), ('A', 6)]
    );
}

#[test]
fn colliding_heterozygous_records_split_across_alleles() {
    let data = VcfData::from_text(PER_ALLELE).unwrap();
    assert_eq!(apply(&data, 0, "1", "ATCGA"), "ATGGA");
    assert_eq!(apply(&data, 1, "1", "ATCGA"), "ATAGA");
}

#[test]
fn position_map_carries_one_edit_per_allele() {
    let data = VcfData::from_text(PER_ALLELE).unwrap();
    let applicator = data.applicator();
    let map = applicator.position_map_for_chromosome("1").unwrap();
    assert_eq!(map.len(), 1);
    let replacements = map.get(&3).unwrap();
    assert_eq!(
        replacements.for_allele(0).unwrap()[0].replacement,
        Some(NucleicAcidCode::G)
    );
    assert_eq!(
        replacements.for_allele(1).unwrap()[0].replacement,
        Some(NucleicAcidCode::A)
    );
}

#[test]
fn unresolved_genotype_fills_primary_allele_first() {
    let data = VcfData::from_text(ALLELE_SPECIFIC).unwrap();
    let applicator = data.applicator();
    let map = applicator.position_map_for_chromosome("1").unwrap();
    assert_eq!(map.len(), 2);

    let het = map.get(&3).unwrap();
    assert!(!het.has_replacement_for_allele(0));
    assert_eq!(
        het.for_allele(1).unwrap()[0].replacement,
        Some(NucleicAcidCode::G)
    );

    let unresolved = map.get(&10).unwrap();
    assert_eq!(
        unresolved.for_allele(0).unwrap()[0].replacement,
        Some(NucleicAcidCode::T)
    );
    assert!(!unresolved.has_replacement_for_allele(1));
}

#[test]
fn number_of_alleles_counts_across_chromosomes() {
    let data = VcfData::from_text(PER_ALLELE).unwrap();
    assert_eq!(data.applicator().number_of_alleles().unwrap(), 2);

    let empty = VcfData::from_text("##fileformat=VCFv4.1\n").unwrap();
    assert_eq!(
        empty.applicator().number_of_alleles(),
        Err(ApplyError::NoRecords)
    );
}

#[test]
fn reference_mismatch_names_the_locus() {
    let data = VcfData::from_text(MIXED_EDITS).unwrap();
    let applicator = data.applicator();
    // chromosome 1 models REF=C at position 3; feed a sequence with T there
    let codes = codes_from_str("ATTGA").unwrap();
    let results: Vec<_> = applicator
        .using_primary_allele()
        .apply_to_sequence("1", codes)
        .unwrap()
        .collect();
    assert_eq!(results.len(), 3);
    match &results[2] {
        Err(ApplyError::ReferenceMismatch {
            chromosome,
            position,
            expected,
            actual,
        }) => {
            assert_eq!(chromosome, "1");
            assert_eq!(*position, 3);
            assert_eq!(*expected, NucleicAcidCode::C);
            assert_eq!(*actual, NucleicAcidCode::T);
        }
        other => panic!("unexpected item: {:?}", other),
    }
}

#[test]
fn sample_metrics_resolve_uniquely() {
    let data = VcfData::from_text(SAMPLE_METRICS).unwrap();
    let record = data.records().nth(1).unwrap();
    assert_eq!(record.id(), "rs99");
    let fields = record.parse_sample_fields();
    assert_eq!(fields.unique_value("GT").unwrap().as_deref(), Some("0/1"));
    assert_eq!(fields.unique_coverage_depth().unwrap(), 4);
    assert_eq!(fields.unique_allele_depth(Allele::Reference).unwrap(), 1);
    assert_eq!(fields.unique_allele_depth(Allele::Alternative).unwrap(), 3);
}

#[test]
fn meta_info_resolves_reference_genome() {
    let data = VcfData::from_text(SAMPLE_METRICS).unwrap();
    let meta = data.meta_info();
    assert_eq!(meta.file_format(), Some("VCFv4.1"));
    assert_eq!(
        meta.parsed_human_reference_genome().as_deref(),
        Some("GRCh37")
    );
}

#[test]
fn unsupported_version_fails_with_headers() {
    match VcfData::from_text("##fileformat=VCFv3.3\n1\t3\t.\tC\tG\t.\t.\t.\n") {
        Err(ParseError::NoMatchingParser { headers }) => {
            assert_eq!(headers, vec!["##fileformat=VCFv3.3".to_string()]);
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn decodes_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE_METRICS.as_bytes()).unwrap();
    let data = VcfData::from_path(file.path()).unwrap();
    assert_eq!(data.record_count(), 2);
    assert_eq!(data.records_for_chromosome("1").len(), 2);
}

#[test]
fn written_records_decode_again() {
    let data = VcfData::from_text(SAMPLE_METRICS).unwrap();
    let mut output = Vec::new();
    vcf_applicator::formats::write_records(data.records(), &mut output).unwrap();
    let reparsed = VcfData::from_text(&String::from_utf8(output).unwrap()).unwrap();
    assert_eq!(reparsed.record_count(), data.record_count());
    let record = reparsed.records().nth(1).unwrap();
    assert_eq!(record.position_as_u64(), 3);
    assert_eq!(record.reference(), "C");
    // the writer substitutes its synthetic sample column name
    assert_eq!(record.sample_fields()[0].0, "000000001");
}

#[test]
fn writes_records_to_nested_path() {
    let data = VcfData::from_text(SAMPLE_METRICS).unwrap();
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("out").join("variants.vcf");
    vcf_applicator::formats::write_records_to_path(data.records(), &path).unwrap();
    let reparsed = VcfData::from_path(&path).unwrap();
    assert_eq!(reparsed.record_count(), 2);
}

#[test]
fn transduced_sequences_are_single_pass() {
    let data = VcfData::from_text(MIXED_EDITS).unwrap();
    let applicator = data.applicator();
    let codes = codes_from_str("ATCGA").unwrap();
    let mut stream = applicator
        .using_primary_allele()
        .apply_to_sequence("1", codes)
        .unwrap();
    let first: Vec<_> = stream.by_ref().collect();
    assert_eq!(first.len(), 5);
    assert!(stream.next().is_none());
}

#[test]
fn shared_grouping_feeds_multiple_transducers() {
    let data = VcfData::from_text(MIXED_EDITS).unwrap();
    let applicator = GenomeApplicator::from_records(data.records().cloned().collect::<Vec<_>>());
    assert_eq!(apply_with(&applicator, "1", "ATCGA"), "ATGGA");
    assert_eq!(apply_with(&applicator, "2", "ATCGA"), "ATGA");
    assert_eq!(apply_with(&applicator, "3", "ATCGA"), "ATCAGA");
}

fn apply_with(applicator: &GenomeApplicator, chromosome: &str, sequence: &str) -> String {
    let codes = codes_from_str(sequence).unwrap();
    let output: Result<Vec<_>, _> = applicator
        .using_primary_allele()
        .apply_to_sequence(chromosome, codes)
        .unwrap()
        .collect();
    codes_to_string(output.unwrap())
}
