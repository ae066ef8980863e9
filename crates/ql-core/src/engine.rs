//! The engine facade: owns the document and runs every operation.
//!
//! All mutation goes through `&mut self`, so one engine is one logical
//! thread of control. Callers that share it across tasks wrap it in a
//! single mutex. The chat delay is split out ([`Engine::begin_chat`],
//! [`Engine::chat_delay`], [`Engine::complete_chat`]) so the lock can be
//! released while the caller sleeps.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::bus::{EngineEvent, NotificationBus, Observer, SubscriptionId};
use crate::chat;
use crate::classifier::{Category, Classifier, Distribution, EmotionPrediction};
use crate::config::EngineConfig;
use crate::content::{ContentTables, WordEntry};
use crate::dashboard::{self, Chamber, Dashboard, Resonance};
use crate::document::{Memory, Poem, Prediction, Role, StateDocument};
use crate::lock::{self, UnlockOutcome, Verdict};
use crate::memory;
use crate::poetry;
use crate::predict;
use crate::store::StateStore;
use crate::time::{Clock, Timestamp, day_month_hour, local_date};
use crate::tokenizer::normalize;

pub const UNLOCK_MEMORY_TAGS: [&str; 3] = ["quantum", "achievement", "love"];

pub struct Engine {
    doc: StateDocument,
    store: Box<dyn StateStore>,
    content: ContentTables,
    classifier: Classifier,
    bus: NotificationBus,
    clock: Box<dyn Clock>,
    rng: SmallRng,
    config: EngineConfig,
    thinking: bool,
}

impl Engine {
    /// Load the stored document (counting the visit) or start fresh, then
    /// make sure today's word is set.
    pub fn new(
        config: EngineConfig,
        content: ContentTables,
        store: Box<dyn StateStore>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self::with_rng(config, content, store, clock, SmallRng::from_os_rng())
    }

    pub fn with_rng(
        config: EngineConfig,
        content: ContentTables,
        mut store: Box<dyn StateStore>,
        clock: Box<dyn Clock>,
        mut rng: SmallRng,
    ) -> Self {
        let now = clock.now();
        let doc = match store.load() {
            Some(mut doc) => {
                doc.quantum_lock.max_attempts = doc.quantum_lock.max_attempts.max(1);
                doc.record_visit(now);
                tracing::debug!(visits = doc.system.total_visits, "loaded stored state");
                doc
            }
            None => {
                tracing::info!("no stored state, starting fresh");
                StateDocument::fresh(now, config.max_attempts, &mut rng)
            }
        };
        let classifier = Classifier::new(
            content.classifier.clone(),
            config.learning_rate,
            config.training_capacity,
        );

        let mut engine = Self {
            doc,
            store,
            content,
            classifier,
            bus: NotificationBus::new(),
            clock,
            rng,
            config,
            thinking: false,
        };
        engine.ensure_todays_word();
        engine
    }

    /// Read-only view of the whole document.
    pub fn snapshot(&self) -> &StateDocument {
        &self.doc
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentTables {
        &self.content
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn subscribe(&mut self, observer: impl Observer + 'static) -> SubscriptionId {
        self.bus.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn emit(&self, event: EngineEvent) {
        self.bus.publish(&event);
    }

    /// Flush the document. Failures are logged and reported as `false`; the
    /// in-memory document stays authoritative either way.
    pub fn save(&mut self) -> bool {
        match self.store.save(&self.doc) {
            Ok(()) => {
                self.emit(EngineEvent::StateSaved);
                true
            }
            Err(e) => {
                tracing::error!("state save failed: {e}");
                false
            }
        }
    }

    // ---- quantum lock ----

    /// Derive the word from the current local day, month and hour and open
    /// a fresh round.
    pub fn generate_todays_word(&mut self) -> WordEntry {
        let now = self.now();
        let (day, month, hour) = day_month_hour(&now);
        let index = lock::word_index(day, month, hour, self.config.quantum_seed, self.content.words.len());
        let entry = self.content.word_at(index).clone();
        lock::assign(&mut self.doc.quantum_lock, &entry, local_date(&now));
        tracing::debug!(index, "generated today's word");
        self.save();
        entry
    }

    /// Regenerate only when the current word was not generated today.
    /// Returns whether a new word was drawn.
    pub fn ensure_todays_word(&mut self) -> bool {
        let today = local_date(&self.now());
        let lock = &self.doc.quantum_lock;
        if lock.generated_on == Some(today) && !lock.todays_word.is_empty() {
            return false;
        }
        self.generate_todays_word();
        true
    }

    /// The current word's hints joined into one line, or the stored hint
    /// when the word is not in the tables.
    pub fn reveal_hint(&self) -> String {
        let lock = &self.doc.quantum_lock;
        match self.content.find_word(&lock.todays_word) {
            Some(entry) if !entry.hints.is_empty() => entry.hints.join(" · "),
            _ => lock.todays_hint.clone(),
        }
    }

    pub fn attempt_unlock(&mut self, guess: &str) -> UnlockOutcome {
        let now = self.now();
        let verdict = lock::judge(&mut self.doc.quantum_lock, guess, now);

        match verdict {
            Verdict::Unlocked => {
                self.doc.metrics.apply_unlock_bonus();
                let content = format!("Quantum lock unlocked with \"{}\"", normalize(guess));
                self.add_memory_at(&content, UNLOCK_MEMORY_TAGS, now);
                self.emit(EngineEvent::QuantumUnlockSuccess);
                self.save();
            }
            Verdict::LockedOut => {
                tracing::info!(attempts = self.doc.quantum_lock.attempts, "quantum lock secured");
                self.emit(EngineEvent::QuantumLockout);
                self.save();
            }
            Verdict::Miss => {
                self.save();
            }
            Verdict::StillLocked | Verdict::Blank => {}
        }

        UnlockOutcome::from_verdict(verdict, &self.doc.quantum_lock)
    }

    // ---- memories ----

    pub fn add_memory<I, S>(&mut self, content: &str, tags: I) -> Memory
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let now = self.now();
        self.add_memory_at(content, tags, now)
    }

    pub fn add_memory_at<I, S>(&mut self, content: &str, tags: I, timestamp: Timestamp) -> Memory
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let memory = memory::build(content, tags, timestamp, &self.content.amplitude);
        self.doc
            .memories
            .insert(memory.clone(), self.config.density_capacity);
        self.emit(EngineEvent::MemoryAdded(memory.clone()));
        self.save();
        memory
    }

    pub fn list_memories(&self, limit: usize, tag: Option<&str>) -> Vec<&Memory> {
        self.doc.memories.list(limit, tag)
    }

    pub fn search_memories(&self, query: &str) -> Vec<&Memory> {
        self.doc.memories.search(query)
    }

    // ---- poetry ----

    pub fn add_favorite(&mut self, poem: Poem) -> bool {
        let now = self.now();
        let added = self.doc.poetry.add_favorite(poem, now);
        if added {
            self.save();
        }
        added
    }

    /// Favourite the AI poem at `index` (0 is newest). `None` if out of range.
    pub fn favorite_generated(&mut self, index: usize) -> Option<bool> {
        let poem = self.doc.poetry.ai_generated.get(index)?.clone();
        Some(self.add_favorite(poem))
    }

    pub fn generate_ai_poem(&mut self, emotion: &str) -> Poem {
        let now = self.now();
        let poem = poetry::compose(&self.content, emotion, now, &mut self.rng);
        self.doc.poetry.push_generated(poem.clone());
        self.save();
        poem
    }

    pub fn poetry_matrix(&mut self) -> Vec<Poem> {
        poetry::matrix(&self.content, &mut self.rng)
    }

    pub fn save_verse_to_memory(&mut self, verse: &str) -> Memory {
        self.add_memory(verse, poetry::SAVED_VERSE_TAGS)
    }

    // ---- companion chat ----

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// Record the user's turn and raise the thinking flag. Blank messages,
    /// and any message sent while a reply is still pending, are ignored and
    /// return `false`.
    pub fn begin_chat(&mut self, message: &str) -> bool {
        if self.thinking || message.trim().is_empty() {
            return false;
        }
        self.thinking = true;
        self.emit(EngineEvent::AiThinking);
        let now = self.now();
        self.doc.ai.push_turn(Role::User, message, now);
        true
    }

    /// A random delay within the configured range.
    pub fn chat_delay(&mut self) -> Duration {
        let range = self.config.chat_delay_range();
        Duration::from_millis(self.rng.random_range(range))
    }

    /// Pick the reply, record it and clear the thinking flag.
    pub fn complete_chat(&mut self, message: &str) -> String {
        let reply = chat::reply(&self.content, message, &mut self.rng);
        let now = self.now();
        self.doc.ai.push_turn(Role::Ai, reply.clone(), now);
        self.doc.ai.nudge_intelligence();
        self.thinking = false;
        self.emit(EngineEvent::AiResponse(reply.clone()));
        self.save();
        reply
    }

    /// The whole chat turn with no delay.
    pub fn respond_now(&mut self, message: &str) -> Option<String> {
        if !self.begin_chat(message) {
            return None;
        }
        Some(self.complete_chat(message))
    }

    // ---- predictions and metrics ----

    pub fn generate_predictions(&mut self) -> &[Prediction] {
        let now = self.now();
        let week = predict::week_ahead(&self.content, now, &mut self.rng);
        self.doc.predictions.replace_short_term(week, now);
        self.save();
        self.emit(EngineEvent::PredictionsUpdated);
        &self.doc.predictions.short_term
    }

    /// Recompute the oscillating metrics. Not persisted by itself.
    pub fn update_metrics(&mut self) {
        let now = self.now();
        self.doc.metrics.fluctuate(now);
        self.emit(EngineEvent::MetricsUpdated);
    }

    pub fn status_line(&mut self) -> String {
        dashboard::status_line(&self.content, &mut self.rng).to_string()
    }

    // ---- classifier ----

    pub fn analyze_text(&self, text: &str) -> Distribution {
        self.classifier.analyze(text)
    }

    pub fn predict_emotion(&self, text: &str) -> EmotionPrediction {
        self.classifier.predict(text)
    }

    pub fn resonance(&self, text: &str) -> Resonance {
        dashboard::resonance(&self.content, self.classifier.analyze(text))
    }

    pub fn train(&mut self, text: &str, expected: Category) -> EmotionPrediction {
        let now = self.now();
        self.classifier.train(text, expected, now)
    }

    // ---- views ----

    pub fn chamber(&mut self) -> Chamber {
        dashboard::chamber(&self.doc, &self.content, &mut self.rng)
    }

    pub fn dashboard(&self) -> Dashboard {
        dashboard::dashboard(&self.doc, self.now())
    }

    /// Replace the document with a fresh one and persist it.
    pub fn reset(&mut self) -> bool {
        let now = self.now();
        self.doc = StateDocument::fresh(now, self.config.max_attempts, &mut self.rng);
        self.thinking = false;
        tracing::info!("state reset");
        self.ensure_todays_word();
        self.save()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("quantum_id", &self.doc.user.quantum_id)
            .field("memories", &self.doc.memories.storage.len())
            .field("bus", &self.bus)
            .field("thinking", &self.thinking)
            .finish()
    }
}
