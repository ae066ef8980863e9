//! Journal entries: creation, tag filtering and search.

use uuid::Uuid;

use crate::content::AmplitudeKeywords;
use crate::document::{Memory, MemoryBank, QuantumState};
use crate::time::Timestamp;
use crate::tokenizer::{contains_any, words};

pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Starts at 0.5; each word containing a positive keyword adds 0.1 and each
/// containing a negative keyword subtracts 0.1. Clamped to [0, 1].
pub fn emotional_amplitude(content: &str, keywords: &AmplitudeKeywords) -> f64 {
    let mut score: f64 = 0.5;
    for word in words(content) {
        if contains_any(&word, &keywords.positive) {
            score += 0.1;
        }
        if contains_any(&word, &keywords.negative) {
            score -= 0.1;
        }
    }
    score.clamp(0.0, 1.0)
}

/// Trimmed, non-empty, first occurrence kept.
fn dedup_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

pub fn build<I, S>(content: &str, tags: I, timestamp: Timestamp, keywords: &AmplitudeKeywords) -> Memory
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Memory {
        id: Uuid::new_v4(),
        content: content.to_string(),
        tags: dedup_tags(tags),
        timestamp,
        emotional_amplitude: emotional_amplitude(content, keywords),
        quantum_state: QuantumState::of(content),
    }
}

impl MemoryBank {
    /// Insert at the front and refresh the counters.
    pub fn insert(&mut self, memory: Memory, capacity: usize) {
        self.storage.insert(0, memory);
        self.total = self.total.saturating_add(1);
        self.density = if capacity == 0 {
            1.0
        } else {
            (self.storage.len() as f64 / capacity as f64).min(1.0)
        };
    }

    /// Up to `limit` newest memories, optionally only those carrying `tag`.
    pub fn list(&self, limit: usize, tag: Option<&str>) -> Vec<&Memory> {
        self.storage
            .iter()
            .filter(|m| tag.is_none_or(|t| m.tags.iter().any(|mt| mt == t)))
            .take(limit)
            .collect()
    }

    /// Case-insensitive substring match on content or any tag, in storage order.
    pub fn search(&self, query: &str) -> Vec<&Memory> {
        let needle = query.to_lowercase();
        self.storage
            .iter()
            .filter(|m| {
                m.content.to_lowercase().contains(&needle)
                    || m.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
