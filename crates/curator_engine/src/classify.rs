use regex::{Regex, RegexBuilder};

use crate::extract::UNTITLED_AUDIO_CAPTION;
use crate::{Bucket, MediaKind};

/// Caption vocabulary marking modern/secondary context around an image:
/// contemporary contributors, exhibition and project activity, and decade
/// markers from the 1950s onward.
const MODERN_CONTEXT_PATTERN: &str = r"(?:studio|workshop|exhibition|installation|artist|researcher|rehearsal|filming|screenshot|article|opening event|scenes from|Ozioma Onuzulike|RitaDoris|Kelani Abass|Chiadikōbi Nwaubani|Paul Basu|George Agbo|Chinyere Odinukwe|Chikaogwu Kanu|Ugonna Umeike|19[5-9]\d|20\d{2}|Stills from|interview|Chike Aniakor|Usifu Jalloh|Shakalearn Mansaray|conservation|Asogwa|Photomontage|project|treatment of|stages in|fieldwork|M\. V\. Portman|Edison phonograph|selection of instruments|recent colour photograph|team members|in the lab|Art Assassins|Onyeka Igwe|Dr Janet Topp Fargion|Felix Ekhator|Raphael Anaemena|Hassan Jalloh|Presentations from|Katrina Dring|Works-in-progress)";

/// Caption vocabulary identifying images of historical documents:
/// catalogue pages, manuscripts, letters, labels, specimens.
const DOCUMENT_PATTERN: &str = r"(?:Notes and Queries|Statistical analysis|Page proofs|Letter from|Annual Report|herbarium specimens|catalogue|Kew Bulletin|pages from|excerpt from|edition of|album|labels|label|Appendix C|document|manuscript|transcription|sketch map)";

/// Caption vocabulary marking modern audio: interviews, podcasts, named
/// contemporary speakers, reworkings.
const MODERN_AUDIO_PATTERN: &str = r"(?:discussing|interview|podcast|listen to|Paul Basu|Usifu Jalloh|Chijioke Onuora|Krydz Ikwuemesi|RitaDoris|Chinyere Odinukwe|Ngozi Omeje|Nicholas Thomas|BBC Radio|Ikenna Onwuegbuna|contemporary reworking|2019)";

/// Caption vocabulary marking historical provenance of a recording: the
/// named collector, shelfmark prefixes and recording-format markers.
const HISTORICAL_AUDIO_PATTERN: &str =
    r"(?:NWT|BL C51|Northcote Thomas|cylinder|recording)";

/// A named, case-insensitive pattern group.
#[derive(Debug, Clone)]
pub struct PatternGroup {
    pub name: &'static str,
    regex: Regex,
}

impl PatternGroup {
    fn new(name: &'static str, pattern: &str) -> Self {
        // Built-in patterns only; a malformed literal is a programming error.
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .expect("built-in classifier pattern");
        Self { name, regex }
    }

    pub fn matches(&self, caption: &str) -> bool {
        self.regex.is_match(caption)
    }
}

/// One ordered classification rule: first group to match decides the bucket.
#[derive(Debug, Clone)]
pub struct ClassifyRule {
    pub group: PatternGroup,
    pub outcome: Bucket,
}

/// The content-policy rule engine separating historical/primary material
/// from modern/secondary material.
///
/// Precedence is data, not control flow: per media kind the rules form an
/// ordered list evaluated first-match-wins, with a fixed fallback.
///
/// Images (fallback `Image`):
/// 1. document vocabulary    -> `Document`
/// 2. modern-context vocabulary -> `Rejected`
///
/// Placing the document rule first encodes the override: a caption matching
/// both modern-context and document vocabulary is a `Document`.
///
/// Audio (fallback `Rejected`):
/// 1. modern-audio vocabulary -> `Rejected`
/// 2. historical-provenance vocabulary -> `Audio`
/// 3. exact placeholder caption -> `Audio`
///
/// Placing the modern rule first encodes the tie-break: a caption matching
/// both modern and historical vocabulary is `Rejected` (reject wins). Audio
/// with neither marker and a real caption is `Rejected` too; favouring
/// primary material over recall is deliberate.
#[derive(Debug, Clone)]
pub struct Classifier {
    image_rules: Vec<ClassifyRule>,
    image_fallback: Bucket,
    audio_rules: Vec<ClassifyRule>,
    audio_fallback: Bucket,
}

impl Default for Classifier {
    fn default() -> Self {
        let placeholder = format!(
            r"\A{}\z",
            regex::escape(UNTITLED_AUDIO_CAPTION)
        );
        Self {
            image_rules: vec![
                ClassifyRule {
                    group: PatternGroup::new("document", DOCUMENT_PATTERN),
                    outcome: Bucket::Document,
                },
                ClassifyRule {
                    group: PatternGroup::new("modern_context", MODERN_CONTEXT_PATTERN),
                    outcome: Bucket::Rejected,
                },
            ],
            image_fallback: Bucket::Image,
            audio_rules: vec![
                ClassifyRule {
                    group: PatternGroup::new("modern_audio", MODERN_AUDIO_PATTERN),
                    outcome: Bucket::Rejected,
                },
                ClassifyRule {
                    group: PatternGroup::new("historical_audio", HISTORICAL_AUDIO_PATTERN),
                    outcome: Bucket::Audio,
                },
                ClassifyRule {
                    group: PatternGroup::new("untitled_placeholder", &placeholder),
                    outcome: Bucket::Audio,
                },
            ],
            audio_fallback: Bucket::Rejected,
        }
    }
}

impl Classifier {
    /// Assign a bucket from caption text alone. Pure and deterministic; no
    /// network or filesystem access.
    pub fn classify(&self, caption: &str, kind: MediaKind) -> Bucket {
        let (rules, fallback) = match kind {
            MediaKind::Image => (&self.image_rules, self.image_fallback),
            MediaKind::Audio => (&self.audio_rules, self.audio_fallback),
        };
        rules
            .iter()
            .find(|rule| rule.group.matches(caption))
            .map(|rule| rule.outcome)
            .unwrap_or(fallback)
    }

    /// Name of the first matching rule group, for skip-log context.
    pub fn matched_group(&self, caption: &str, kind: MediaKind) -> Option<&'static str> {
        let rules = match kind {
            MediaKind::Image => &self.image_rules,
            MediaKind::Audio => &self.audio_rules,
        };
        rules
            .iter()
            .find(|rule| rule.group.matches(caption))
            .map(|rule| rule.group.name)
    }
}
