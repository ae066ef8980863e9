//! Static content tables: daily words, keyword buckets, response banks,
//! poetry templates and prediction templates.
//!
//! The tables are data, not code. A built-in set ships as a TOML asset and
//! is parsed once at engine construction; a replacement file with the same
//! shape can be loaded instead.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use rand::Rng;
use rand::seq::IndexedRandom;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classifier::CategoryTable;

const BUILTIN: &str = include_str!("../assets/content.toml");

static SLOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// Vocabulary pool the poem's decorative quantum state is drawn from.
pub const STATE_POOL: &str = "state";

#[derive(Debug)]
pub enum ContentError {
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::Parse(e) => write!(f, "content parse error: {e}"),
            ContentError::Invalid(msg) => write!(f, "invalid content: {msg}"),
        }
    }
}

impl std::error::Error for ContentError {}

impl From<toml::de::Error> for ContentError {
    fn from(e: toml::de::Error) -> Self {
        ContentError::Parse(e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub meaning: String,
    pub quantum_state: String,
    pub emoji: String,
    #[serde(default)]
    pub hints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResonanceLabel {
    pub label: String,
    pub emoji: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmplitudeKeywords {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionKeywords {
    pub emotion: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatKeywords {
    pub greetings: Vec<String>,
    /// Scanned in order; the first emotion with a matching keyword wins.
    pub emotions: Vec<EmotionKeywords>,
    pub poetry: Vec<String>,
    pub memory: Vec<String>,
    pub future: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseBank {
    pub greetings: Vec<String>,
    pub emotions: BTreeMap<String, Vec<String>>,
    pub poetry_suggestions: Vec<String>,
    pub memory_advice: Vec<String>,
    pub predictions: Vec<String>,
    pub defaults: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicPoem {
    pub category: String,
    pub verse: String,
    pub translation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoetryContent {
    pub translation: String,
    pub templates: Vec<String>,
    pub vocabulary: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub classics: Vec<ClassicPoem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    ShortTerm,
    MediumTerm,
    LongTerm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionTemplate {
    pub horizon: Horizon,
    pub text: String,
    /// Decorative confidence, in percent.
    pub confidence: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmojiRule {
    pub keywords: Vec<String>,
    pub emoji: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmojiRules {
    pub default: String,
    pub rules: Vec<EmojiRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiStrings {
    pub chamber_messages: Vec<String>,
    pub status_lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentTables {
    pub words: Vec<WordEntry>,
    pub classifier: CategoryTable<Vec<String>>,
    pub resonance: CategoryTable<ResonanceLabel>,
    pub amplitude: AmplitudeKeywords,
    pub chat: ChatKeywords,
    pub responses: ResponseBank,
    pub poetry: PoetryContent,
    pub predictions: Vec<PredictionTemplate>,
    pub prediction_emoji: EmojiRules,
    pub ui: UiStrings,
}

impl ContentTables {
    /// The tables shipped with the crate.
    pub fn builtin() -> Self {
        Self::from_toml(BUILTIN).expect("built-in content asset is valid")
    }

    pub fn from_toml(src: &str) -> Result<Self, ContentError> {
        let tables: ContentTables = toml::from_str(src)?;
        tables.validate()?;
        Ok(tables)
    }

    fn validate(&self) -> Result<(), ContentError> {
        let require = |ok: bool, what: &str| {
            if ok {
                Ok(())
            } else {
                Err(ContentError::Invalid(what.to_string()))
            }
        };

        require(!self.words.is_empty(), "word table is empty")?;
        require(
            self.words.iter().all(|w| !w.word.trim().is_empty()),
            "word table has a blank word",
        )?;
        require(
            self.words.iter().all(|w| w.word == w.word.trim().to_lowercase()),
            "daily words must be lower-case and trimmed",
        )?;
        require(!self.responses.greetings.is_empty(), "no greeting responses")?;
        require(!self.responses.poetry_suggestions.is_empty(), "no poetry suggestions")?;
        require(!self.responses.memory_advice.is_empty(), "no memory advice")?;
        require(!self.responses.predictions.is_empty(), "no prediction responses")?;
        require(!self.responses.defaults.is_empty(), "no default responses")?;
        for e in &self.chat.emotions {
            let bank = self.responses.emotions.get(&e.emotion);
            require(
                bank.is_some_and(|b| !b.is_empty()),
                &format!("no responses for detected emotion '{}'", e.emotion),
            )?;
        }

        require(!self.poetry.templates.is_empty(), "no poetry templates")?;
        for template in &self.poetry.templates {
            for cap in SLOT.captures_iter(template) {
                let slot = &cap[1];
                require(
                    self.poetry.vocabulary.get(slot).is_some_and(|v| !v.is_empty()),
                    &format!("template slot '{{{slot}}}' has no vocabulary"),
                )?;
            }
        }
        require(
            self.poetry
                .vocabulary
                .get(STATE_POOL)
                .is_some_and(|v| !v.is_empty()),
            "poetry vocabulary needs a 'state' pool",
        )?;

        require(
            self.predictions
                .iter()
                .any(|p| p.horizon == Horizon::ShortTerm),
            "no short_term prediction templates",
        )?;
        require(!self.ui.status_lines.is_empty(), "no status lines")?;
        require(!self.ui.chamber_messages.is_empty(), "no chamber messages")?;
        Ok(())
    }

    pub fn word_at(&self, index: usize) -> &WordEntry {
        &self.words[index % self.words.len()]
    }

    pub fn find_word(&self, word: &str) -> Option<&WordEntry> {
        self.words.iter().find(|w| w.word == word)
    }

    pub fn classics_in(&self, category: &str) -> Vec<&ClassicPoem> {
        self.poetry
            .classics
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    pub fn templates_for(&self, horizon: Horizon) -> Vec<&PredictionTemplate> {
        self.predictions
            .iter()
            .filter(|p| p.horizon == horizon)
            .collect()
    }

    /// Emoji for a prediction text: first rule with a matching keyword, else the default.
    pub fn prediction_emoji(&self, text: &str) -> &str {
        self.prediction_emoji
            .rules
            .iter()
            .find(|r| r.keywords.iter().any(|k| text.contains(k.as_str())))
            .map_or(self.prediction_emoji.default.as_str(), |r| r.emoji.as_str())
    }

    /// Fill every `{slot}` in `template` with an independent uniform pick from
    /// the matching vocabulary pool. Unknown slots are left untouched.
    pub fn fill_template(&self, template: &str, rng: &mut impl Rng) -> String {
        SLOT.replace_all(template, |cap: &regex::Captures| {
            self.poetry
                .vocabulary
                .get(&cap[1])
                .and_then(|pool| pool.choose(rng))
                .cloned()
                .unwrap_or_else(|| cap[0].to_string())
        })
        .into_owned()
    }
}

/// Uniform pick from a non-empty slice; empty slices yield an empty string.
pub fn pick<'a>(pool: &'a [String], rng: &mut impl Rng) -> &'a str {
    pool.choose(rng).map(String::as_str).unwrap_or("")
}
