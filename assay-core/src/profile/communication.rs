//! Communication phase, judged from review comments.

use std::sync::LazyLock;

use regex::Regex;

use crate::scoring::Signal;

use super::types::{PhaseScore, ReviewComment};

/// Sentence length band (words) considered clear.
const CLEAR_SENTENCE_WORDS: std::ops::RangeInclusive<f64> = 5.0..=40.0;
/// Uppercase share of letters above which a comment is shouting.
const SHOUTING_UPPERCASE_SHARE: f64 = 0.7;
/// Comments with fewer letters are never treated as shouting.
const SHOUTING_MIN_LETTERS: usize = 8;

static SUGGESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(consider|suggest|could|might|perhaps|instead|recommend|maybe|prefer|try",
        r"|what about|how about|would it)\b",
    ))
    .expect("suggestion pattern is valid")
});

static SPECIFIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i:\bline\s*\d+\b|\bL\d+\b)|`[^`]+`|\b[a-z]+_[a-z0-9_]+\b",
        r"|\b[a-z]+[A-Z][A-Za-z0-9]*\b|\w+::\w+|\w+\(\)",
    ))
    .expect("specificity pattern is valid")
});

fn is_shouting(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < SHOUTING_MIN_LETTERS {
        return false;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    upper as f64 / letters.len() as f64 > SHOUTING_UPPERCASE_SHARE
}

/// 1 for readable sentence lengths, 0.5 outside the band, 0 when empty or shouting.
pub fn clarity(text: &str) -> f64 {
    let sentences: Vec<usize> = text
        .split(['.', '!', '?'])
        .map(|s| s.split_whitespace().count())
        .filter(|&words| words > 0)
        .collect();

    if sentences.is_empty() || is_shouting(text) {
        return 0.0;
    }

    let avg = sentences.iter().sum::<usize>() as f64 / sentences.len() as f64;
    if CLEAR_SENTENCE_WORDS.contains(&avg) {
        1.0
    } else {
        0.5
    }
}

/// 1 when the comment proposes something rather than only objecting.
pub fn constructiveness(text: &str) -> f64 {
    if SUGGESTION.is_match(text) { 1.0 } else { 0.0 }
}

/// 1 when the comment points at a line, a code span or an identifier.
pub fn specificity(text: &str) -> f64 {
    if SPECIFIC.is_match(text) { 1.0 } else { 0.0 }
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> f64 {
    values.sum::<f64>() / count as f64
}

/// Communication phase score.
pub fn score_communication(comments: &[ReviewComment]) -> PhaseScore {
    if comments.is_empty() {
        return PhaseScore::no_data();
    }

    let n = comments.len();
    let bodies = || comments.iter().map(|c| c.body.as_str());

    PhaseScore::from_signals(&[
        Signal::new("clarity", mean(bodies().map(clarity), n), 1.0),
        Signal::new("constructiveness", mean(bodies().map(constructiveness), n), 1.0),
        Signal::new("specificity", mean(bodies().map(specificity), n), 1.0),
    ])
}
