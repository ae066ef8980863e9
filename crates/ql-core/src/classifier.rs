//! Keyword-bucket emotion classifier ("Neural Love Network").
//!
//! Scores text against five fixed keyword buckets, normalizes the counts
//! into a distribution, and picks a weighted arg-max. The weights move with
//! a perceptron-style rule on `train`; this is a heuristic, not a model.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;
use crate::tokenizer::{contains_any, words};

/// Lower and upper clamp for every category weight.
pub const WEIGHT_MIN: f64 = 0.1;
pub const WEIGHT_MAX: f64 = 1.0;

/// Label used when no category scores above zero.
pub const NEUTRAL: &str = "neutral";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Romantic,
    Intellectual,
    Emotional,
    Creative,
    Spiritual,
}

impl Category {
    /// Iteration order. Ties in `predict` resolve to the earliest entry.
    pub const ALL: [Category; 5] = [
        Category::Romantic,
        Category::Intellectual,
        Category::Emotional,
        Category::Creative,
        Category::Spiritual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Romantic => "romantic",
            Category::Intellectual => "intellectual",
            Category::Emotional => "emotional",
            Category::Creative => "creative",
            Category::Spiritual => "spiritual",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// One value per category, addressable by [`Category`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTable<T> {
    pub romantic: T,
    pub intellectual: T,
    pub emotional: T,
    pub creative: T,
    pub spiritual: T,
}

impl<T> CategoryTable<T> {
    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Romantic => &self.romantic,
            Category::Intellectual => &self.intellectual,
            Category::Emotional => &self.emotional,
            Category::Creative => &self.creative,
            Category::Spiritual => &self.spiritual,
        }
    }
}

/// Normalized per-category scores. Entries are in [0, 1] and sum to 1,
/// or are all zero when nothing matched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Distribution([f64; 5]);

impl Distribution {
    pub fn get(&self, category: Category) -> f64 {
        self.0[category.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|s| *s == 0.0)
    }

    /// Highest-scoring category, earliest wins on ties. `None` if all zero.
    pub fn primary(&self) -> Option<Category> {
        let mut best: Option<(Category, f64)> = None;
        for (c, s) in self.iter() {
            if s > best.map_or(0.0, |(_, b)| b) {
                best = Some((c, s));
            }
        }
        best.map(|(c, _)| c)
    }
}

/// Result of [`Classifier::predict`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPrediction {
    /// Winning category, or `None` for neutral.
    pub emotion: Option<Category>,
    /// Weighted score of the winner; 0 when neutral.
    pub confidence: f64,
    pub breakdown: Distribution,
}

impl EmotionPrediction {
    pub fn label(&self) -> &'static str {
        self.emotion.map_or(NEUTRAL, Category::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub text: String,
    pub predicted: String,
    pub expected: Category,
    pub timestamp: Timestamp,
}

/// Starting weights.
pub fn default_weights() -> CategoryTable<f64> {
    CategoryTable {
        romantic: 0.7,
        intellectual: 0.6,
        emotional: 0.8,
        creative: 0.5,
        spiritual: 0.4,
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    keywords: CategoryTable<Vec<String>>,
    weights: [f64; 5],
    learning_rate: f64,
    capacity: usize,
    training: VecDeque<TrainingRecord>,
}

impl Classifier {
    pub fn new(keywords: CategoryTable<Vec<String>>, learning_rate: f64, capacity: usize) -> Self {
        let defaults = default_weights();
        Self {
            keywords,
            weights: Category::ALL.map(|c| *defaults.get(c)),
            learning_rate,
            capacity,
            training: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    pub fn weight(&self, category: Category) -> f64 {
        self.weights[category.index()]
    }

    pub fn training_data(&self) -> &VecDeque<TrainingRecord> {
        &self.training
    }

    /// Count, per category, the words containing any of its keywords, then
    /// normalize by the total count.
    pub fn analyze(&self, text: &str) -> Distribution {
        let mut counts = [0.0f64; 5];
        for word in words(text) {
            for c in Category::ALL {
                if contains_any(&word, self.keywords.get(c)) {
                    counts[c.index()] += 1.0;
                }
            }
        }

        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            for s in counts.iter_mut() {
                *s /= total;
            }
        }
        Distribution(counts)
    }

    pub fn predict(&self, text: &str) -> EmotionPrediction {
        let breakdown = self.analyze(text);
        let mut emotion = None;
        let mut confidence = 0.0;

        for (c, score) in breakdown.iter() {
            let weighted = score * self.weight(c);
            if weighted > confidence {
                confidence = weighted;
                emotion = Some(c);
            }
        }

        EmotionPrediction {
            emotion,
            confidence,
            breakdown,
        }
    }

    /// Nudge weights toward `expected` and record the example.
    ///
    /// The expected category gains `rate * (1 - confidence)`, every other
    /// category loses `rate * confidence`; all weights are clamped to
    /// [`WEIGHT_MIN`, `WEIGHT_MAX`].
    pub fn train(&mut self, text: &str, expected: Category, now: Timestamp) -> EmotionPrediction {
        let prediction = self.predict(text);
        let confidence = prediction.confidence;

        for c in Category::ALL {
            let w = &mut self.weights[c.index()];
            if c == expected {
                *w += self.learning_rate * (1.0 - confidence);
            } else {
                *w -= self.learning_rate * confidence;
            }
            *w = w.clamp(WEIGHT_MIN, WEIGHT_MAX);
        }

        if self.capacity > 0 {
            if self.training.len() == self.capacity {
                self.training.pop_front();
            }
            self.training.push_back(TrainingRecord {
                text: text.to_string(),
                predicted: prediction.label().to_string(),
                expected,
                timestamp: now,
            });
        }

        prediction
    }
}
