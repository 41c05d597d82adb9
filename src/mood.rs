//! # Mood Aggregator
//! Pure reduction of a scored batch into a percentage-scaled mood index.
//! No I/O, suitable for unit tests.
//!
//! `mood_score = (bullish - bearish) / total * 100`, rounded to one decimal.
//! Neutral items count toward the denominator only.

use serde::{Deserialize, Serialize};

use crate::sentiment::{ScoredHeadline, SentimentLabel};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub bullish: usize,
    pub bearish: usize,
    pub neutral: usize,
}

impl SentimentCounts {
    pub fn total(&self) -> usize {
        self.bullish + self.bearish + self.neutral
    }

    fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Bullish => self.bullish += 1,
            SentimentLabel::Bearish => self.bearish += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
    }
}

/// Derived on every read; never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MoodResult {
    pub mood_score: f64,
    pub sentiment_counts: SentimentCounts,
}

pub fn aggregate(batch: &[ScoredHeadline]) -> MoodResult {
    let mut counts = SentimentCounts::default();
    for h in batch {
        counts.record(h.sentiment_label);
    }

    let total = batch.len();
    if total == 0 {
        return MoodResult::default();
    }

    let net = counts.bullish as f64 - counts.bearish as f64;
    let raw = net / total as f64 * 100.0;

    MoodResult {
        mood_score: (raw * 10.0).round_ties_even() / 10.0,
        sentiment_counts: counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(label: SentimentLabel) -> ScoredHeadline {
        ScoredHeadline {
            title: "t".into(),
            url: None,
            source: "Test".into(),
            sentiment_score: 0.0,
            sentiment_label: label,
        }
    }

    fn batch(bull: usize, bear: usize, neutral: usize) -> Vec<ScoredHeadline> {
        let mut v = Vec::new();
        v.extend((0..bull).map(|_| mk(SentimentLabel::Bullish)));
        v.extend((0..bear).map(|_| mk(SentimentLabel::Bearish)));
        v.extend((0..neutral).map(|_| mk(SentimentLabel::Neutral)));
        v
    }

    #[test]
    fn empty_batch_is_zero() {
        let r = aggregate(&[]);
        assert_eq!(r.mood_score, 0.0);
        assert_eq!(r.sentiment_counts, SentimentCounts::default());
    }

    #[test]
    fn six_two_two_is_forty() {
        let r = aggregate(&batch(6, 2, 2));
        assert_eq!(r.mood_score, 40.0);
        assert_eq!(
            r.sentiment_counts,
            SentimentCounts {
                bullish: 6,
                bearish: 2,
                neutral: 2
            }
        );
        assert_eq!(r.sentiment_counts.total(), 10);
    }

    #[test]
    fn rounds_to_one_decimal() {
        // (1 - 0) / 3 * 100 = 33.333...
        assert_eq!(aggregate(&batch(1, 0, 2)).mood_score, 33.3);
        // (0 - 2) / 3 * 100 = -66.666...
        assert_eq!(aggregate(&batch(0, 2, 1)).mood_score, -66.7);
    }

    #[test]
    fn ties_round_to_even() {
        // 1 / 16 * 100 = 6.25
        assert_eq!(aggregate(&batch(1, 0, 15)).mood_score, 6.2);
        // 3 / 16 * 100 = 18.75
        assert_eq!(aggregate(&batch(3, 0, 13)).mood_score, 18.8);
        assert_eq!(aggregate(&batch(0, 1, 15)).mood_score, -6.2);
    }

    #[test]
    fn extremes_are_bounded() {
        assert_eq!(aggregate(&batch(4, 0, 0)).mood_score, 100.0);
        assert_eq!(aggregate(&batch(0, 4, 0)).mood_score, -100.0);
        assert_eq!(aggregate(&batch(0, 0, 4)).mood_score, 0.0);
    }
}
