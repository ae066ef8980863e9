//! Favourites, template-composed AI verses and the classical poetry matrix.

use chrono::Datelike;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::content::{ClassicPoem, ContentTables, STATE_POOL, pick};
use crate::document::{Poem, PoemAnalysis, PoetryBook};
use crate::time::Timestamp;

pub const DEFAULT_EMOTION: &str = "love";

/// Cells of the poetry matrix, one classical category each.
pub const MATRIX_CATEGORIES: [&str; 3] = ["ghalib", "faiz", "quantum"];

/// Tags on a verse saved from the matrix into the memory bank.
pub const SAVED_VERSE_TAGS: [&str; 3] = ["poetry", "favorite", "classical"];

impl PoetryBook {
    /// Append `poem` unless a favourite with the same verse exists.
    /// Returns whether it was added.
    pub fn add_favorite(&mut self, mut poem: Poem, now: Timestamp) -> bool {
        if self.favorites.iter().any(|f| f.verse == poem.verse) {
            return false;
        }
        poem.favorited_at = Some(now);
        self.favorites.push(poem);
        true
    }

    pub fn push_generated(&mut self, poem: Poem) {
        self.ai_generated.insert(0, poem);
    }
}

/// Compose a verse for `emotion` from a random template.
pub fn compose(content: &ContentTables, emotion: &str, now: Timestamp, rng: &mut impl Rng) -> Poem {
    let emotion = match emotion.trim() {
        "" => DEFAULT_EMOTION,
        e => e,
    };
    let template = pick(&content.poetry.templates, rng).to_string();
    let verse = content.fill_template(&template, rng);
    let state = content
        .poetry
        .vocabulary
        .get(STATE_POOL)
        .map(|pool| pick(pool, rng).to_string())
        .unwrap_or_default();

    Poem {
        verse,
        translation: content.poetry.translation.clone(),
        analysis: Some(PoemAnalysis {
            sentiment: vec![emotion.to_string(), "quantum".to_string(), "ai".to_string()],
            quantum_state: state,
            emotional_amplitude: 0.7 + rng.random::<f64>() * 0.3,
        }),
        era: format!("AI-{}", now.year()),
        tags: vec![
            "ai".to_string(),
            "quantum".to_string(),
            emotion.to_string(),
            "generated".to_string(),
        ],
        favorited_at: None,
    }
}

pub fn classic_to_poem(classic: &ClassicPoem) -> Poem {
    Poem {
        verse: classic.verse.clone(),
        translation: classic.translation.clone(),
        analysis: None,
        era: classic.category.clone(),
        tags: vec![classic.category.clone(), "classical".to_string()],
        favorited_at: None,
    }
}

/// A random poem of `category`, if the tables have any.
pub fn random_classic(content: &ContentTables, category: &str, rng: &mut impl Rng) -> Option<Poem> {
    content
        .classics_in(category)
        .choose(rng)
        .map(|c| classic_to_poem(c))
}

/// One random classic per matrix category; categories without poems are skipped.
pub fn matrix(content: &ContentTables, rng: &mut impl Rng) -> Vec<Poem> {
    MATRIX_CATEGORIES
        .iter()
        .filter_map(|category| random_classic(content, category, rng))
        .collect()
}
