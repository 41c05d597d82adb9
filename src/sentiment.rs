//! # Sentiment Scorer
//! Maps a headline title to `(polarity, label)`.
//!
//! Base polarity comes from a pluggable [`PolarityEstimator`] (default: the
//! embedded word lexicon). A fixed keyword policy then pushes the polarity
//! to at least `+0.2` / at most `-0.2` when bullish or bearish market terms
//! dominate the title.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ingest::types::Headline;

static LEXICON: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, f64>>(raw).expect("valid sentiment lexicon")
});

/// Substring-matched against the lower-cased title, so "up" also hits "support".
pub const BULLISH_KEYWORDS: &[&str] = &[
    "rise", "gain", "surge", "high", "positive", "growth", "strong", "boost", "up", "rally",
    "bull", "soar", "climb", "advance", "profit",
];

pub const BEARISH_KEYWORDS: &[&str] = &[
    "fall", "drop", "decline", "low", "negative", "weak", "crash", "down", "bear", "plunge",
    "slide", "loss", "concern", "fear",
];

/// Polarity floor/ceiling applied when one keyword set dominates.
pub const KEYWORD_CLAMP: f64 = 0.2;
/// |polarity| must exceed this to leave `Neutral`.
pub const LABEL_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentLabel {
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > LABEL_THRESHOLD {
            SentimentLabel::Bullish
        } else if polarity < -LABEL_THRESHOLD {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Bullish => "Bullish",
            SentimentLabel::Bearish => "Bearish",
            SentimentLabel::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A headline after scoring. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHeadline {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    pub source: String,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
}

/// General-purpose text polarity in `[-1.0, 1.0]`. Input is already lower-cased.
pub trait PolarityEstimator: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

/// Lexicon estimator: mean of matched word polarities, with intensifiers
/// scaling the next word and nearby negators flipping it at half strength.
#[derive(Debug, Clone, Default)]
pub struct LexiconPolarity;

impl LexiconPolarity {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_polarity(&self, w: &str) -> Option<f64> {
        LEXICON.get(w).copied()
    }
}

impl PolarityEstimator for LexiconPolarity {
    fn polarity(&self, text: &str) -> f64 {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut sum = 0.0f64;
        let mut hits = 0usize;

        for i in 0..tokens.len() {
            let Some(mut p) = self.word_polarity(tokens[i].as_str()) else {
                continue;
            };

            if i >= 1 {
                if let Some(k) = intensifier(tokens[i - 1].as_str()) {
                    p *= k;
                }
            }

            // negator within the previous 1..=3 tokens
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            if negated {
                p *= -0.5;
            }

            sum += p;
            hits += 1;
        }

        if hits == 0 {
            return 0.0;
        }
        (sum / hits as f64).clamp(-1.0, 1.0)
    }
}

/// Alphanumeric tokens (apostrophes kept for contractions), lower-case.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "don't"
            | "doesn't"
            | "didn't"
            | "without"
    )
}

fn intensifier(tok: &str) -> Option<f64> {
    match tok {
        "very" | "really" | "highly" => Some(1.3),
        "extremely" | "hugely" => Some(1.5),
        "slightly" | "somewhat" | "mildly" => Some(0.6),
        _ => None,
    }
}

/// Count bullish and bearish keyword occurrences (substring semantics,
/// each keyword counted at most once).
pub fn keyword_counts(lowered: &str) -> (usize, usize) {
    let bullish = BULLISH_KEYWORDS
        .iter()
        .filter(|k| lowered.contains(*k))
        .count();
    let bearish = BEARISH_KEYWORDS
        .iter()
        .filter(|k| lowered.contains(*k))
        .count();
    (bullish, bearish)
}

/// Ties go to the even digit.
fn round3(x: f64) -> f64 {
    (x * 1000.0).round_ties_even() / 1000.0
}

#[derive(Clone)]
pub struct SentimentScorer {
    estimator: Arc<dyn PolarityEstimator>,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SentimentScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentimentScorer").finish_non_exhaustive()
    }
}

impl SentimentScorer {
    pub fn new() -> Self {
        Self::with_estimator(Arc::new(LexiconPolarity::new()))
    }

    pub fn with_estimator(estimator: Arc<dyn PolarityEstimator>) -> Self {
        Self { estimator }
    }

    /// Score a title. Empty or whitespace-only input is `(0.0, Neutral)`.
    ///
    /// The label is derived from the rounded polarity, so the returned pair
    /// always agrees with the label thresholds.
    pub fn score(&self, title: &str) -> (f64, SentimentLabel) {
        if title.trim().is_empty() {
            return (0.0, SentimentLabel::Neutral);
        }

        let lowered = title.to_lowercase();
        let mut polarity = self.estimator.polarity(&lowered);

        let (bullish, bearish) = keyword_counts(&lowered);
        if bullish > bearish {
            polarity = polarity.max(KEYWORD_CLAMP);
        } else if bearish > bullish {
            polarity = polarity.min(-KEYWORD_CLAMP);
        }

        let polarity = round3(polarity);
        (polarity, SentimentLabel::from_polarity(polarity))
    }

    pub fn score_headline(&self, h: Headline) -> ScoredHeadline {
        let (sentiment_score, sentiment_label) = self.score(&h.title);
        ScoredHeadline {
            title: h.title,
            url: h.url,
            source: h.source,
            sentiment_score,
            sentiment_label,
        }
    }
}
