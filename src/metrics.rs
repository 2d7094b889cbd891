//! Deterministic readability metrics.
//!
//! Counts sentences, words and syllables with simple tokenization heuristics
//! and derives the Flesch reading-ease score and the Flesch-Kincaid grade
//! level from those counts. Every function here is pure and total: empty or
//! non-linguistic input degrades to zero instead of failing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Raw counts for a piece of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStats {
    pub sentence_count: usize,
    pub word_count: usize,
    pub syllable_count: usize,
}

/// Scores derived from a [`TextStats`]. Both fields are 0 when the text has
/// no words or no sentences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub readability_score: f64,
    pub grade_level: f64,
}

/// Counts and scores together, as shown for live stats on raw input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextReport {
    #[serde(flatten)]
    pub stats: TextStats,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

// ---------------------------------------------------------------------------
// Coefficients
// ---------------------------------------------------------------------------

struct Coefficients {
    ease_base: f64,
    ease_asl_weight: f64,
    ease_asw_weight: f64,
    ease_min: f64,
    ease_max: f64,
    grade_asl_weight: f64,
    grade_asw_weight: f64,
    grade_offset: f64,
    grade_min: f64,
    grade_max: f64,
}

static FK: Coefficients = Coefficients {
    ease_base: 206.835,
    ease_asl_weight: 1.015,
    ease_asw_weight: 84.6,
    ease_min: 0.0,
    ease_max: 100.0,
    grade_asl_weight: 0.39,
    grade_asw_weight: 11.8,
    grade_offset: 15.59,
    grade_min: 0.0,
    grade_max: 20.0,
};

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

static SENTENCE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

static NON_ALPHA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z]").unwrap());

static VOWEL_GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[aeiouy]+").unwrap());

const VOWELS: &[u8] = b"aeiouy";

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

/// Number of non-blank fragments between runs of `.`, `!` and `?`.
///
/// Text without any terminator is a single fragment, so it counts as one
/// sentence; only blank or punctuation-only text yields zero.
pub fn count_sentences(text: &str) -> usize {
    SENTENCE_SPLIT_RE
        .split(text)
        .filter(|fragment| !fragment.trim().is_empty())
        .count()
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Sum of [`count_syllables_in_word`] over every whitespace-separated token.
pub fn count_syllables(text: &str) -> usize {
    text.split_whitespace().map(count_syllables_in_word).sum()
}

/// Vowel-group syllable estimate for a single token.
///
/// Everything but ASCII letters is stripped first, so `"don't"` is read as
/// `"dont"` and a token of only digits or punctuation has no syllables. A single
/// remaining letter is always one syllable. A silent trailing `e` is dropped
/// before counting vowel groups (`y` counts as a vowel), and a consonant
/// followed by a final `le` (`table`, `apple`) gets that syllable back.
pub fn count_syllables_in_word(word: &str) -> usize {
    let word = NON_ALPHA_RE.replace_all(word, "").to_ascii_lowercase();
    match word.len() {
        0 => return 0,
        1 => return 1,
        _ => {}
    }

    let stem = word.strip_suffix('e').unwrap_or(word.as_str());
    let vowel_groups = VOWEL_GROUP_RE.find_iter(stem).count();
    let mut syllables = vowel_groups.max(1);

    if ends_in_consonant_le(&word) {
        syllables += 1;
    }
    syllables
}

/// `word` is lowercase ASCII. Needs a letter in front of the `le`.
fn ends_in_consonant_le(word: &str) -> bool {
    let bytes = word.as_bytes();
    match bytes.len().checked_sub(3) {
        Some(before) => bytes.ends_with(b"le") && !VOWELS.contains(&bytes[before]),
        None => false,
    }
}

/// Counts for `text`, each computed independently over the trimmed input.
pub fn text_statistics(text: &str) -> TextStats {
    let text = text.trim();
    if text.is_empty() {
        return TextStats::default();
    }
    TextStats {
        sentence_count: count_sentences(text),
        word_count: count_words(text),
        syllable_count: count_syllables(text),
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

impl TextStats {
    /// Words per sentence (ASL).
    pub fn average_sentence_length(&self) -> Option<f64> {
        self.ratios().map(|(asl, _)| asl)
    }

    /// Syllables per word (ASW).
    pub fn average_syllables_per_word(&self) -> Option<f64> {
        self.ratios().map(|(_, asw)| asw)
    }

    fn ratios(&self) -> Option<(f64, f64)> {
        if self.sentence_count == 0 || self.word_count == 0 {
            return None;
        }
        let words = self.word_count as f64;
        let asl = words / self.sentence_count as f64;
        let asw = self.syllable_count as f64 / words;
        Some((asl, asw))
    }

    /// Flesch reading ease, clamped to `[0, 100]`.
    pub fn readability_score(&self) -> f64 {
        match self.ratios() {
            Some((asl, asw)) => {
                let score = FK.ease_base - FK.ease_asl_weight * asl - FK.ease_asw_weight * asw;
                score.clamp(FK.ease_min, FK.ease_max)
            }
            None => 0.0,
        }
    }

    /// Flesch-Kincaid grade level, clamped to `[0, 20]`.
    pub fn grade_level(&self) -> f64 {
        match self.ratios() {
            Some((asl, asw)) => {
                let grade = FK.grade_asl_weight * asl + FK.grade_asw_weight * asw - FK.grade_offset;
                grade.clamp(FK.grade_min, FK.grade_max)
            }
            None => 0.0,
        }
    }

    pub fn analysis(&self) -> AnalysisResult {
        AnalysisResult {
            readability_score: self.readability_score(),
            grade_level: self.grade_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn readability_score(text: &str) -> f64 {
    text_statistics(text).readability_score()
}

pub fn grade_level(text: &str) -> f64 {
    text_statistics(text).grade_level()
}

/// Both scores from a single pass over `text`.
pub fn analyze(text: &str) -> AnalysisResult {
    text_statistics(text).analysis()
}

pub fn report(text: &str) -> TextReport {
    let stats = text_statistics(text);
    TextReport {
        stats,
        result: stats.analysis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consonant_le_needs_a_preceding_letter() {
        assert!(ends_in_consonant_le("table"));
        assert!(ends_in_consonant_le("apple"));
        assert!(!ends_in_consonant_le("whale"));
        assert!(!ends_in_consonant_le("le"));
        assert!(!ends_in_consonant_le("tables"));
    }

    #[test]
    fn undefined_ratios_are_none() {
        let stats = TextStats {
            sentence_count: 0,
            word_count: 3,
            syllable_count: 4,
        };
        assert_eq!(stats.average_sentence_length(), None);
        assert_eq!(stats.average_syllables_per_word(), None);
        assert_eq!(stats.analysis(), AnalysisResult::default());
    }
}
