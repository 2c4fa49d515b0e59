//! Genome application
//!
//! Folds variant records into a position-indexed, allele-aware replacement
//! model and applies that model as a one-pass transducer over a reference
//! nucleotide stream, re-numbering output positions across length-changing
//! edits.

use crate::core::error::{ApplyError, ApplyResult};
use crate::core::nucleotide::{CodeAndPosition, NucleicAcidCode};
use crate::core::record::{Genotype, VcfRecord};
use log::warn;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

/// Normalize a chromosome name for lookups.
///
/// Lookups are case-insensitive with the `chr` prefix stripped.
///
/// # Examples
/// ```
/// use vcf_applicator::core::normalize_chromosome;
///
/// assert_eq!(normalize_chromosome("chr1"), normalize_chromosome("1"));
/// assert_eq!(normalize_chromosome("CHRX"), "X");
/// assert_eq!(normalize_chromosome("mt"), "MT");
/// ```
pub fn normalize_chromosome(chromosome: &str) -> String {
    let trimmed = chromosome.trim();
    let without_prefix = if trimmed.len() > 3 && trimmed[..3].eq_ignore_ascii_case("chr") {
        &trimmed[3..]
    } else {
        trimmed
    };
    without_prefix.to_uppercase()
}

/// One edit at a single position on a single allele.
///
/// Both sides present: substitution. Reference absent: insertion of the
/// replacement before the existing code. Replacement absent: deletion of
/// the existing code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Replacement {
    pub reference: Option<NucleicAcidCode>,
    pub replacement: Option<NucleicAcidCode>,
}

impl Replacement {
    pub fn new(reference: Option<NucleicAcidCode>, replacement: Option<NucleicAcidCode>) -> Self {
        Self {
            reference,
            replacement,
        }
    }

    pub fn is_substitution(&self) -> bool {
        self.reference.is_some() && self.replacement.is_some()
    }

    pub fn is_insertion(&self) -> bool {
        self.reference.is_none()
    }

    pub fn is_deletion(&self) -> bool {
        self.reference.is_some() && self.replacement.is_none()
    }
}

/// The edits competing at one genomic position, per allele index.
///
/// Edits per (position, allele) form an insertion-ordered, duplicate-free
/// sequence, so the first-pick resolution of colliding records is
/// deterministic and reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replacements {
    allele_to_replacements: BTreeMap<usize, Vec<Replacement>>,
}

impl Replacements {
    fn add_for_allele(&mut self, allele: usize, replacement: Replacement) {
        let entries = self.allele_to_replacements.entry(allele).or_default();
        if !entries.contains(&replacement) {
            entries.push(replacement);
        }
    }

    /// The edits attached to one allele, in insertion order.
    pub fn for_allele(&self, allele: usize) -> Option<&[Replacement]> {
        self.allele_to_replacements
            .get(&allele)
            .map(|entries| entries.as_slice())
    }

    pub fn has_replacement_for_allele(&self, allele: usize) -> bool {
        self.for_allele(allele).is_some_and(|entries| !entries.is_empty())
    }

    /// The highest allele index carrying an edit at this position.
    pub fn max_allele_index(&self) -> Option<usize> {
        self.allele_to_replacements.keys().next_back().copied()
    }
}

/// Per-chromosome mapping from 1-based genomic position to its edits.
pub type PositionMap = BTreeMap<u64, Replacements>;

/// Fold one chromosome's records into its position map.
///
/// Walks REF and ALT in lockstep: at offset `i`, the missing side of the
/// shorter string yields an absent code, producing insertion or deletion
/// edits past the shorter string's end. The allele an edit attaches to follows the
/// record's genotype classification; unresolved genotypes fill allele 0
/// first, then allele 1, capped at 1.
fn build_position_map(records: &[VcfRecord]) -> ApplyResult<PositionMap> {
    let mut map = PositionMap::new();
    for record in records {
        let reference: Vec<char> = record.reference().chars().collect();
        let alternative: Vec<char> = record.alternative_alleles().chars().collect();
        let position = record.position_as_u64();
        let span = reference.len().max(alternative.len());

        let sample_fields = record.parse_sample_fields();
        let alternative_both = sample_fields.has_genotype(Genotype::AlternativeBoth);
        let reference_and_alternative =
            sample_fields.has_genotype(Genotype::ReferenceAndAlternative);
        let second_allele_alternative =
            sample_fields.has_genotype(Genotype::SecondAlleleAlternative);

        for offset in 0..span {
            let current_position = position + offset as u64;
            let left = parse_code(reference.get(offset), current_position)?;
            let right = parse_code(alternative.get(offset), current_position)?;
            let edit = Replacement::new(left, right);
            let replacements = map.entry(current_position).or_default();

            if alternative_both {
                replacements.add_for_allele(0, edit);
                replacements.add_for_allele(1, edit);
            } else if reference_and_alternative {
                if second_allele_alternative {
                    replacements.add_for_allele(1, edit);
                } else {
                    replacements.add_for_allele(0, edit);
                }
            } else {
                let allele = replacements
                    .max_allele_index()
                    .map_or(0, |max| (max + 1).min(1));
                replacements.add_for_allele(allele, edit);
            }
        }
    }
    Ok(map)
}

fn parse_code(symbol: Option<&char>, position: u64) -> ApplyResult<Option<NucleicAcidCode>> {
    match symbol {
        Some(&symbol) => NucleicAcidCode::from_char(symbol)
            .map(Some)
            .ok_or(ApplyError::InvalidCode { position, symbol }),
        None => Ok(None),
    }
}

/// Derives and caches per-chromosome replacement models from an immutable
/// record set, and hands out allele-specific transducers over them.
///
/// The record grouping is read-only after construction; position maps build
/// lazily on first request per chromosome and are shared via [`Arc`], so
/// transducers for different chromosomes can run concurrently.
pub struct GenomeApplicator {
    chromosome_to_records: Arc<BTreeMap<String, Vec<VcfRecord>>>,
    position_maps: Mutex<HashMap<String, Arc<PositionMap>>>,
}

impl GenomeApplicator {
    /// Build over an existing grouping keyed by normalized chromosome name.
    pub fn new(chromosome_to_records: Arc<BTreeMap<String, Vec<VcfRecord>>>) -> Self {
        Self {
            chromosome_to_records,
            position_maps: Mutex::new(HashMap::new()),
        }
    }

    /// Group a flat record sequence by normalized chromosome and build over
    /// the result.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = VcfRecord>,
    {
        let mut grouped: BTreeMap<String, Vec<VcfRecord>> = BTreeMap::new();
        for record in records {
            grouped
                .entry(normalize_chromosome(record.chromosome()))
                .or_default()
                .push(record);
        }
        Self::new(Arc::new(grouped))
    }

    /// The normalized chromosome names carrying records.
    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.chromosome_to_records.keys().map(String::as_str)
    }

    /// The position map for one chromosome, built on first request and
    /// cached. An unknown chromosome yields an empty map.
    pub fn position_map_for_chromosome(&self, chromosome: &str) -> ApplyResult<Arc<PositionMap>> {
        let key = normalize_chromosome(chromosome);
        {
            let cache = self
                .position_maps
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(map) = cache.get(&key) {
                return Ok(Arc::clone(map));
            }
        }
        let records = self
            .chromosome_to_records
            .get(&key)
            .map(|records| records.as_slice())
            .unwrap_or(&[]);
        let map = Arc::new(build_position_map(records)?);
        let mut cache = self
            .position_maps
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = cache.entry(key).or_insert_with(|| Arc::clone(&map));
        Ok(Arc::clone(entry))
    }

    /// 1 + the maximum allele index observed across every chromosome.
    ///
    /// Fails with [`ApplyError::NoRecords`] over an empty record set rather
    /// than returning a sentinel.
    pub fn number_of_alleles(&self) -> ApplyResult<usize> {
        let mut max_index: Option<usize> = None;
        for chromosome in self.chromosome_to_records.keys() {
            let map = self.position_map_for_chromosome(chromosome)?;
            for replacements in map.values() {
                if let Some(index) = replacements.max_allele_index() {
                    max_index = Some(max_index.map_or(index, |current| current.max(index)));
                }
            }
        }
        max_index.map(|index| index + 1).ok_or(ApplyError::NoRecords)
    }

    /// Select the allele the transducer applies. 0 = primary, 1 = secondary.
    pub fn using_allele(&self, allele: usize) -> AlleleApplicator<'_> {
        AlleleApplicator {
            applicator: self,
            allele,
        }
    }

    pub fn using_primary_allele(&self) -> AlleleApplicator<'_> {
        self.using_allele(0)
    }

    pub fn using_secondary_allele(&self) -> AlleleApplicator<'_> {
        self.using_allele(1)
    }
}

/// A [`GenomeApplicator`] bound to one allele index.
#[derive(Clone, Copy)]
pub struct AlleleApplicator<'a> {
    applicator: &'a GenomeApplicator,
    allele: usize,
}

impl<'a> AlleleApplicator<'a> {
    pub fn allele(&self) -> usize {
        self.allele
    }

    /// Transduce a positioned reference stream into the allele-specific
    /// sequence.
    ///
    /// The returned iterator is lazy, single-pass and non-restartable. A
    /// reference mismatch is yielded as an error, after which the stream
    /// fuses. Emitted codes carry sequential output positions seeded from
    /// the first input pair (clamped to at least 1).
    pub fn apply_to_positioned_sequence<I>(
        &self,
        chromosome: &str,
        sequence: I,
    ) -> ApplyResult<Transduction<I::IntoIter>>
    where
        I: IntoIterator<Item = CodeAndPosition>,
    {
        let position_map = self.applicator.position_map_for_chromosome(chromosome)?;
        Ok(Transduction {
            input: sequence.into_iter(),
            position_map,
            allele: self.allele,
            chromosome: normalize_chromosome(chromosome),
            output_position: None,
            pending: None,
            failed: false,
        })
    }

    /// Transduce a bare code stream, attaching synthetic 1-based positions
    /// internally and stripping them from the output.
    pub fn apply_to_sequence<I>(
        &self,
        chromosome: &str,
        sequence: I,
    ) -> ApplyResult<impl Iterator<Item = ApplyResult<NucleicAcidCode>>>
    where
        I: IntoIterator<Item = NucleicAcidCode>,
    {
        let positioned = sequence
            .into_iter()
            .enumerate()
            .map(|(index, code)| CodeAndPosition::new(code, index as u64 + 1));
        Ok(self
            .apply_to_positioned_sequence(chromosome, positioned)?
            .map(|item| item.map(|pair| pair.code)))
    }
}

/// Streaming application of one chromosome's replacement map to a
/// positioned code sequence. See
/// [`AlleleApplicator::apply_to_positioned_sequence`].
pub struct Transduction<I> {
    input: I,
    position_map: Arc<PositionMap>,
    allele: usize,
    chromosome: String,
    output_position: Option<u64>,
    pending: Option<NucleicAcidCode>,
    failed: bool,
}

impl<I> Transduction<I> {
    fn emit(&mut self, code: NucleicAcidCode) -> CodeAndPosition {
        let position = self.output_position.unwrap_or(1);
        self.output_position = Some(position + 1);
        CodeAndPosition::new(code, position)
    }
}

impl<I> Iterator for Transduction<I>
where
    I: Iterator<Item = CodeAndPosition>,
{
    type Item = ApplyResult<CodeAndPosition>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some(code) = self.pending.take() {
            return Some(Ok(self.emit(code)));
        }
        loop {
            let input = self.input.next()?;
            if self.output_position.is_none() {
                self.output_position = Some(input.position.max(1));
            }
            let replacements = self
                .position_map
                .get(&input.position)
                .and_then(|replacements| replacements.for_allele(self.allele));
            let Some(replacements) = replacements else {
                return Some(Ok(self.emit(input.code)));
            };
            if replacements.len() > 1 {
                warn!(
                    "More than one replacement for chromosome position and allele available: {}:{} ( allele {} )",
                    self.chromosome, input.position, self.allele
                );
            }
            let edit = replacements[0];
            match (edit.reference, edit.replacement) {
                // pure insertion: replacement first, then the original code
                (None, Some(inserted)) => {
                    self.pending = Some(input.code);
                    return Some(Ok(self.emit(inserted)));
                }
                (None, None) => {
                    return Some(Ok(self.emit(input.code)));
                }
                (Some(expected), _) if expected != input.code => {
                    self.failed = true;
                    return Some(Err(ApplyError::ReferenceMismatch {
                        chromosome: self.chromosome.clone(),
                        position: input.position,
                        expected,
                        actual: input.code,
                    }));
                }
                // deletion: no output for this input code
                (Some(_), None) => continue,
                (Some(_), Some(substituted)) => {
                    return Some(Ok(self.emit(substituted)));
                }
            }
        }
    }
}
