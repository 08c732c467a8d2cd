//! Name classification: deciding whether a piece of interface text is a
//! person's display name, and normalising it when it is.
//!
//! The rules are kept as an ordered table ([`Rule::ALL`]) so the rule set is
//! something tests can enumerate, and so a rejection can say which rule fired.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::traits::HostTree;

static CHARACTER_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z\s\-'.]+(?i:\s\((?:You|Host|Guest|Presenter)\))?$").unwrap()
});
static MEETING_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{3}-[a-z]{4}-[a-z]{3}$").unwrap());
static TITLE_CASE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+$").unwrap());
static SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\((?:You|Host|Guest|Presenter)\)$").unwrap());
static NUMBERING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]?\s*").unwrap());
static VIDEO_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)'s video.*$").unwrap());

/// Interface chrome that never appears in a real display name.
///
/// Matched as a case-insensitive substring, so short entries also reject
/// names that merely contain them ("Brendan" contains "end").
pub const UI_VOCABULARY: &[&str] = &[
    "join", "leave", "mute", "unmute", "camera", "mic", "microphone", "chat", "share",
    "screen", "record", "end", "call", "meeting", "participants", "people", "more",
    "options", "settings", "help", "turn on", "turn off", "enable", "disable", "cancel",
    "ok", "done", "video", "audio", "present", "stop", "start", "pause", "resume", "pin",
    "devices", "reframe", "background", "effects", "raising", "hand", "jump", "bottom",
    "back", "close", "search", "waiting", "pair", "contributors", "reducing", "noise",
    "mood", "info", "apps", "alarm", "gemini", "notes", "taking", "meet", "captions",
    "live", "transcription", "breakout", "rooms", "polls", "whiteboard", "jamboard",
];

/// Status lines the host renders in the same places names appear.
pub const DIAGNOSTIC_PHRASES: &[&str] =
    &["isn't taking notes", "isn\u{2019}t taking notes", "Waiting to", "Meet -"];

/// Annotation suffixes the host appends to a display name.
pub const ANNOTATION_SUFFIXES: &[&str] = &["(You)", "(Host)", "(Guest)", "(Presenter)"];

const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 100;
const MIN_SINGLE_WORD_LEN: usize = 3;
const MAX_EXTRACTED_LEN: usize = 50;

/// A single classification rule, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Length must be within `[2, 100]` characters.
    Length,
    /// Letters, spaces, `-`, `'`, `.`, optionally one annotation suffix
    /// (the suffix is matched in any case here; [`clean`] is stricter).
    CharacterClass,
    /// Must not contain any [`UI_VOCABULARY`] entry.
    UiVocabulary,
    /// Must not be a `abc-defg-hij` meeting code.
    MeetingCode,
    /// Must not contain any [`DIAGNOSTIC_PHRASES`] entry.
    DiagnosticPhrase,
    /// A lone word must be Title-Case and at least 3 characters.
    SingleWord,
}

impl Rule {
    pub const ALL: [Rule; 6] = [
        Rule::Length,
        Rule::CharacterClass,
        Rule::UiVocabulary,
        Rule::MeetingCode,
        Rule::DiagnosticPhrase,
        Rule::SingleWord,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Length => "length",
            Rule::CharacterClass => "character_class",
            Rule::UiVocabulary => "ui_vocabulary",
            Rule::MeetingCode => "meeting_code",
            Rule::DiagnosticPhrase => "diagnostic_phrase",
            Rule::SingleWord => "single_word",
        }
    }

    /// Returns true if `text` passes this rule.
    pub fn check(&self, text: &str) -> bool {
        match self {
            Rule::Length => (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&text.chars().count()),
            Rule::CharacterClass => CHARACTER_CLASS_RE.is_match(text),
            Rule::UiVocabulary => !is_ui_text(text),
            Rule::MeetingCode => !is_meeting_code(text),
            Rule::DiagnosticPhrase => !DIAGNOSTIC_PHRASES.iter().any(|p| text.contains(p)),
            Rule::SingleWord => {
                if text.split_whitespace().count() != 1 {
                    return true;
                }
                text.chars().count() >= MIN_SINGLE_WORD_LEN && TITLE_CASE_RE.is_match(text)
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of classifying one candidate string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(Rule),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Run every rule in order and report the first one that fails.
pub fn classify(text: &str) -> Verdict {
    Rule::ALL
        .iter()
        .find(|rule| !rule.check(text))
        .map_or(Verdict::Accepted, |rule| Verdict::Rejected(*rule))
}

/// Strict check used on raw text harvested without a structured source.
pub fn is_valid_name(text: &str) -> bool {
    classify(text).is_accepted()
}

/// Returns true if `text` contains any interface-chrome word, ignoring case.
pub fn is_ui_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    UI_VOCABULARY.iter().any(|ui| lower.contains(ui))
}

pub fn is_meeting_code(text: &str) -> bool {
    MEETING_CODE_RE.is_match(text)
}

/// Normalise a display string: drop one annotation suffix and one leading
/// list number, then trim.
///
/// `"1. Carol Davis"` → `"Carol Davis"`, `"Dana Lee (Host)"` → `"Dana Lee"`.
/// Suffixes are matched case-sensitively, so `"Dana Lee (host)"` is kept.
pub fn clean(text: &str) -> String {
    let without_suffix = SUFFIX_RE.replace(text.trim(), "");
    let without_number = NUMBERING_RE.replace(&without_suffix, "");
    without_number.trim().to_string()
}

/// The looser guard applied to already-cleaned names.
///
/// Structured sources (self-name attributes, whole-element text) are trusted
/// more than raw text, so only the checks that catch chrome apply here.
pub fn is_plausible_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().any(|c| c.is_ascii_alphabetic())
        && !is_ui_text(name)
        && !is_meeting_code(name)
}

/// Pull a participant name out of a single node.
///
/// Sources, first non-empty wins: the `data-self-name` attribute, the full
/// text content, the host's rendered text, then the `aria-label` with any
/// trailing "'s video" removed. Returns `None` when nothing usable is found.
pub fn extract_name<T: HostTree>(tree: &T, node: &T::Node) -> Option<String> {
    let raw = tree
        .attribute(node, "data-self-name")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| non_empty(tree.text_content(node)))
        .or_else(|| tree.rendered_text(node).and_then(non_empty))
        .or_else(|| {
            tree.attribute(node, "aria-label")
                .map(|label| VIDEO_LABEL_RE.replace(&label, "").trim().to_string())
                .filter(|s| !s.is_empty())
        })?;

    let name = clean(&raw);
    let len = name.chars().count();
    if !(MIN_NAME_LEN..=MAX_EXTRACTED_LEN).contains(&len) || !is_plausible_name(&name) {
        return None;
    }
    Some(name)
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
