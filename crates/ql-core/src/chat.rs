//! Companion reply selection.
//!
//! Matching runs on the whole lower-cased message, not on words, so "hi"
//! also matches inside "this". The first rule that matches decides the bank.

use rand::Rng;

use crate::content::{ChatKeywords, ContentTables, pick};
use crate::document::{ChatTurn, Companion, Role};
use crate::time::Timestamp;
use crate::tokenizer::contains_any;

pub const INTELLIGENCE_STEP: f64 = 0.1;
pub const INTELLIGENCE_CAP: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Emotion(String),
    Poetry,
    Memory,
    Future,
    Other,
}

pub fn detect_intent(keywords: &ChatKeywords, message: &str) -> Intent {
    let message = message.to_lowercase();
    if contains_any(&message, &keywords.greetings) {
        return Intent::Greeting;
    }
    if let Some(e) = keywords
        .emotions
        .iter()
        .find(|e| contains_any(&message, &e.keywords))
    {
        return Intent::Emotion(e.emotion.clone());
    }
    if contains_any(&message, &keywords.poetry) {
        Intent::Poetry
    } else if contains_any(&message, &keywords.memory) {
        Intent::Memory
    } else if contains_any(&message, &keywords.future) {
        Intent::Future
    } else {
        Intent::Other
    }
}

/// A reply for `message`: a uniform pick from the bank its intent selects.
pub fn reply(content: &ContentTables, message: &str, rng: &mut impl Rng) -> String {
    let bank = &content.responses;
    let pool = match detect_intent(&content.chat, message) {
        Intent::Greeting => &bank.greetings,
        Intent::Emotion(e) => bank.emotions.get(&e).unwrap_or(&bank.defaults),
        Intent::Poetry => &bank.poetry_suggestions,
        Intent::Memory => &bank.memory_advice,
        Intent::Future => &bank.predictions,
        Intent::Other => &bank.defaults,
    };
    pick(pool, rng).to_string()
}

impl Companion {
    pub fn push_turn(&mut self, role: Role, content: impl Into<String>, timestamp: Timestamp) {
        self.conversation_history.push(ChatTurn {
            role,
            content: content.into(),
            timestamp,
        });
    }

    pub fn nudge_intelligence(&mut self) {
        self.emotional_intelligence = (self.emotional_intelligence + INTELLIGENCE_STEP).min(INTELLIGENCE_CAP);
    }
}
