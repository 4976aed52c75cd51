//! Section segmentation for circulaire text.
//!
//! A circulaire opens each price table with an Arabic heading naming the
//! category (new vs. price-revision, human vs. veterinary, local vs.
//! imported). Embedded PDF text frequently stores these headings with the
//! characters in VISUAL (reversed) order, so every heading is matched by a
//! catalog of variants: plain, hamza-spelling, numbered-prefix, lenient
//! taa-marbuta spelling, and the literal reversed string. Reversed forms are
//! cataloged as-is; no general RTL reordering is attempted.
//!
//! "New" headings must not swallow their revision counterparts, so each new
//! variant carries a veto probe that disqualifies the match when a revision
//! marker follows it.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{MedType, Origin, Specialty};

/// The six heading categories a circulaire can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKey {
    NewLocalHuman,
    NewImportedHuman,
    NewVeterinary,
    RevisedLocalHuman,
    RevisedImportedHuman,
    RevisedVeterinary,
}

impl SectionKey {
    pub fn med_type(self) -> MedType {
        match self {
            Self::NewLocalHuman | Self::NewImportedHuman | Self::NewVeterinary => MedType::New,
            _ => MedType::Revised,
        }
    }

    pub fn specialty(self) -> Specialty {
        match self {
            Self::NewVeterinary | Self::RevisedVeterinary => Specialty::Veterinary,
            _ => Specialty::Human,
        }
    }

    /// Veterinary headings never spell out an origin; they fall to imported.
    pub fn origin(self) -> Origin {
        match self {
            Self::NewLocalHuman | Self::RevisedLocalHuman => Origin::Local,
            _ => Origin::Imported,
        }
    }
}

/// How a revision marker may trail a "new" heading match.
#[derive(Debug, Clone, Copy)]
enum RevisionVeto {
    /// `(مراجعة` directly after the heading (whitespace allowed).
    Adjacent,
    /// Reversed-order marker anywhere in the rest of the heading line.
    SameLine,
}

/// One heading variant: the base pattern plus an optional veto probe
/// applied at the position where the base match ends.
struct HeadingPattern {
    base: Regex,
    veto: Option<RevisionVeto>,
}

static ADJACENT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*\(مراجعة").unwrap());

static REVERSED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)راعسأ\s*ةعجارم").unwrap());

impl HeadingPattern {
    fn new(pattern: &str, veto: Option<RevisionVeto>) -> Self {
        Self {
            base: Regex::new(&format!("(?i){pattern}")).unwrap(),
            veto,
        }
    }

    /// True when the revision marker disqualifies a base match ending at
    /// `match_end`.
    fn is_vetoed(&self, text: &str, match_end: usize) -> bool {
        let tail = &text[match_end..];
        match self.veto {
            None => false,
            Some(RevisionVeto::Adjacent) => ADJACENT_MARKER.is_match(tail),
            Some(RevisionVeto::SameLine) => {
                let line_end = tail.find('\n').unwrap_or(tail.len());
                REVERSED_MARKER
                    .find(tail)
                    .is_some_and(|m| m.start() < line_end)
            }
        }
    }
}

/// Heading catalog in registration order. Registration order breaks ties
/// between candidates that start at the same offset.
static CATEGORY_CATALOG: LazyLock<Vec<(SectionKey, Vec<HeadingPattern>)>> = LazyLock::new(|| {
    use RevisionVeto::{Adjacent, SameLine};
    let plain = |p: &str| HeadingPattern::new(p, None);
    let guarded = |p: &str, v: RevisionVeto| HeadingPattern::new(p, Some(v));

    vec![
        (
            SectionKey::NewLocalHuman,
            vec![
                guarded(r"إختصاصات\s*بشرية\s*محلية", Adjacent),
                guarded(r"اختصاصات\s*بشرية\s*محلية", Adjacent),
                guarded(r"[-\d]+\s*إختصاصات\s*بشرية\s*محلية", Adjacent),
                guarded(r"[-\d]+\s*اختصاصات\s*بشرية\s*محلية", Adjacent),
                guarded(r"1[-.]?\s*إختصاصات\s*بشرية\s*محلية", Adjacent),
                guarded(r"1[-.]?\s*اختصاصات\s*بشرية\s*محلية", Adjacent),
                guarded(r"ةيلحم\s*ةيرشب\s*تاصاصتخا", SameLine),
                guarded(r"ةيلحم\s*ةيرشب\s*تاصاصتخإ", SameLine),
                guarded(r"[-]?اختصاصات\s*بشري[هة]\s*محلي[هة]", Adjacent),
            ],
        ),
        (
            SectionKey::NewImportedHuman,
            vec![
                guarded(r"إختصاصات\s*بشرية\s*مستوردة", Adjacent),
                guarded(r"اختصاصات\s*بشرية\s*مستوردة", Adjacent),
                guarded(r"[-\d]+\s*إختصاصات\s*بشرية\s*مستوردة", Adjacent),
                guarded(r"[-\d]+\s*اختصاصات\s*بشرية\s*مستوردة", Adjacent),
                guarded(r"1[-.]?\s*إختصاصات\s*بشرية\s*مستوردة", Adjacent),
                guarded(r"1[-.]?\s*اختصاصات\s*بشرية\s*مستوردة", Adjacent),
                guarded(r"ةدروتسم\s*ةيرشب\s*تاصاصتخا", SameLine),
                guarded(r"ةدروتسم\s*ةيرشب\s*تاصاصتخإ", SameLine),
                guarded(r"[-]?اختصاصات\s*بشري[هة]\s*مستورد[هة]", Adjacent),
            ],
        ),
        (
            SectionKey::NewVeterinary,
            vec![
                guarded(r"إختصاصات\s*بيطرية\s*مستوردة", Adjacent),
                guarded(r"اختصاصات\s*بيطرية\s*مستوردة", Adjacent),
                guarded(r"[-\d]+\s*إختصاصات\s*بيطرية\s*مستوردة", Adjacent),
                guarded(r"[-\d]+\s*اختصاصات\s*بيطرية\s*مستوردة", Adjacent),
                guarded(r"إختصاصات\s*بيطرية\s*محلية", Adjacent),
                guarded(r"اختصاصات\s*بيطرية\s*محلية", Adjacent),
                guarded(r"[-\d]+\s*إختصاصات\s*بيطرية\s*محلية", Adjacent),
                guarded(r"[-\d]+\s*اختصاصات\s*بيطرية\s*محلية", Adjacent),
                plain(r"ةدروتسم\s*ةيرطيب\s*تاصاصتخ[اإ]"),
                plain(r"ةيلحم\s*ةيرطيب\s*تاصاصتخ[اإ]"),
                plain(r"[-]?اختصاصات\s*بيطري[هة]"),
            ],
        ),
        (
            SectionKey::RevisedLocalHuman,
            vec![
                plain(r"إختصاصات\s*بشرية\s*محلية\s*\(مراجعة\s*أسعار\)"),
                plain(r"اختصاصات\s*بشرية\s*محلية\s*\(مراجعة\s*أسعار\)"),
                plain(r"[-\d]+\s*إختصاصات\s*بشرية\s*محلية\s*\(مراجعة"),
                plain(r"[-\d]+\s*اختصاصات\s*بشرية\s*محلية\s*\(مراجعة"),
                plain(r"1[-.]?\s*إختصاصات\s*بشرية\s*محلية\s*\(مراجعة"),
                plain(r"1[-.]?\s*اختصاصات\s*بشرية\s*محلية\s*\(مراجعة"),
                plain(r"\)راعسأ\s*ةعجارم\(\s*ةيلحم\s*ةيرشب\s*تاصاصتخ[اإ]"),
                plain(r"راعسأ\s*ةعجارم.*ةيلحم\s*ةيرشب\s*تاصاصتخ[اإ]"),
                plain(r"[-]?اختصاصات\s*بشري[هة]\s*محلي[هة]\s*\(مراجعة"),
            ],
        ),
        (
            SectionKey::RevisedImportedHuman,
            vec![
                plain(r"إختصاصات\s*بشرية\s*مستوردة\s*\(مراجعة\s*أسعار\)"),
                plain(r"اختصاصات\s*بشرية\s*مستوردة\s*\(مراجعة\s*أسعار\)"),
                plain(r"[-\d]+\s*إختصاصات\s*بشرية\s*مستوردة\s*\(مراجعة"),
                plain(r"[-\d]+\s*اختصاصات\s*بشرية\s*مستوردة\s*\(مراجعة"),
                plain(r"2[-.]?\s*إختصاصات\s*بشرية\s*مستوردة\s*\(مراجعة"),
                plain(r"2[-.]?\s*اختصاصات\s*بشرية\s*مستوردة\s*\(مراجعة"),
                plain(r"\)راعسأ\s*ةعجارم\(\s*ةدروتسم\s*ةيرشب\s*تاصاصتخ[اإ]"),
                plain(r"راعسأ\s*ةعجارم.*ةدروتسم\s*ةيرشب\s*تاصاصتخ[اإ]"),
                plain(r"[-]?اختصاصات\s*بشري[هة]\s*مستورد[هة]\s*\(مراجعة"),
            ],
        ),
        (
            SectionKey::RevisedVeterinary,
            vec![
                plain(r"إختصاصات\s*بيطرية.*\(مراجعة\s*أسعار\)"),
                plain(r"اختصاصات\s*بيطرية.*\(مراجعة\s*أسعار\)"),
                plain(r"[-\d]+\s*إختصاصات\s*بيطرية.*\(مراجعة"),
                plain(r"[-\d]+\s*اختصاصات\s*بيطرية.*\(مراجعة"),
                plain(r"\)راعسأ\s*ةعجارم\(.*ةيرطيب\s*تاصاصتخ[اإ]"),
                plain(r"راعسأ\s*ةعجارم.*ةيلحم\s*ةيرطيب\s*تاصاصتخ[اإ]"),
                plain(r"راعسأ\s*ةعجارم.*ةدروتسم\s*ةيرطيب\s*تاصاصتخ[اإ]"),
            ],
        ),
    ]
});

/// Noise notices that terminate a price table early: withdrawal decisions,
/// commercialization stops, renames, availability notices.
static SECTION_BREAK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"إعلام",
        r"قرار\s*سحب",
        r"ARRET\s*DE\s*COMMERCIALISATION",
        r"CHANGEMENT\s*DE\s*DENOMINATION",
        r"AVIS\s*DE\s*DISPONIBILITE",
        r"CHANGEMENT\s*DU\s*TABLEAU",
        r"retrait\s*du\s*commerce",
        r"Lot\s*à\s*retirer",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

/// A located section heading. `start..end` is the heading span itself;
/// the section body begins at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeading {
    pub key: SectionKey,
    pub start: usize,
    pub end: usize,
}

/// Locate all category headings, reduced to a non-overlapping sequence by a
/// greedy left-to-right scan. When candidates tie on start offset the
/// first-registered category wins.
pub fn find_category_sections(text: &str) -> Vec<SectionHeading> {
    let mut candidates = Vec::new();
    for (key, patterns) in CATEGORY_CATALOG.iter() {
        for pattern in patterns {
            for m in pattern.base.find_iter(text) {
                if pattern.is_vetoed(text, m.end()) {
                    continue;
                }
                candidates.push(SectionHeading {
                    key: *key,
                    start: m.start(),
                    end: m.end(),
                });
            }
        }
    }

    candidates.sort_by_key(|s| s.start);
    let mut filtered: Vec<SectionHeading> = Vec::new();
    for candidate in candidates {
        if filtered
            .last()
            .map_or(true, |prev| candidate.start >= prev.end)
        {
            filtered.push(candidate);
        }
    }
    filtered
}

/// Start offsets of all break notices, ascending. Overlaps are not resolved;
/// breaks only ever serve as boundaries.
pub fn find_section_breaks(text: &str) -> Vec<usize> {
    let mut breaks = Vec::new();
    for pattern in SECTION_BREAK_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            breaks.push(m.start());
        }
    }
    breaks.sort_unstable();
    breaks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_heading_is_found() {
        let text = "مقدمة\nاختصاصات بشرية محلية\nDOLIPRANE ...";
        let sections = find_category_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].key, SectionKey::NewLocalHuman);
        assert_eq!(sections[0].key.med_type(), MedType::New);
        assert_eq!(sections[0].key.origin(), Origin::Local);
    }

    #[test]
    fn revision_suffix_reclassifies_heading() {
        let text = "اختصاصات بشرية محلية (مراجعة أسعار)";
        let sections = find_category_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].key, SectionKey::RevisedLocalHuman);
    }

    #[test]
    fn reversed_heading_is_found() {
        let text = "ةيلحم ةيرشب تاصاصتخا";
        let sections = find_category_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].key, SectionKey::NewLocalHuman);
    }

    #[test]
    fn reversed_revised_heading_wins_over_embedded_new() {
        // Reversed rendering puts the revision marker before the base words;
        // the revised pattern starts earlier so the greedy scan keeps it.
        let text = ")راعسأ ةعجارم( ةيلحم ةيرشب تاصاصتخا";
        let sections = find_category_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].key, SectionKey::RevisedLocalHuman);
    }

    #[test]
    fn reversed_trailing_marker_vetoes_new_heading() {
        let text = "ةيلحم ةيرشب تاصاصتخا راعسأ ةعجارم";
        let sections = find_category_sections(text);
        assert!(sections.is_empty());
    }

    #[test]
    fn numbered_prefix_extends_heading_span() {
        let text = "1- اختصاصات بشرية محلية";
        let sections = find_category_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].key, SectionKey::NewLocalHuman);
        assert_eq!(sections[0].start, 0);
    }

    #[test]
    fn lenient_spelling_matches() {
        let text = "اختصاصات بشريه محليه";
        let sections = find_category_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].key, SectionKey::NewLocalHuman);
    }

    #[test]
    fn imported_and_local_sections_in_order() {
        let text = "اختصاصات بشرية محلية\nDOLIPRANE...\nاختصاصات بشرية مستوردة\nASPEGIC...";
        let sections = find_category_sections(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].key, SectionKey::NewLocalHuman);
        assert_eq!(sections[1].key, SectionKey::NewImportedHuman);
        assert!(sections[0].end <= sections[1].start);
    }

    #[test]
    fn veterinary_heading_maps_to_imported_origin() {
        let text = "اختصاصات بيطرية مستوردة";
        let sections = find_category_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].key.specialty(), Specialty::Veterinary);
        assert_eq!(sections[0].key.origin(), Origin::Imported);
    }

    #[test]
    fn breaks_are_sorted_ascending() {
        let text = "قرار سحب ... xxx ... ARRET DE COMMERCIALISATION ... إعلام";
        let breaks = find_section_breaks(text);
        assert_eq!(breaks.len(), 3);
        assert!(breaks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn break_matching_ignores_case() {
        let breaks = find_section_breaks("avis de disponibilite du lot");
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[0], 0);
    }
}
