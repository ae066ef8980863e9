//! Read-only views derived from the document: the dashboard panel, the
//! post-unlock chamber, resonance previews and rotating status lines.

use rand::Rng;
use serde::Serialize;

use crate::classifier::{Category, Distribution};
use crate::content::{ContentTables, pick};
use crate::document::{Poem, StateDocument};
use crate::moon::{MoonPhase, moon_phase};
use crate::poetry::random_classic;
use crate::time::{Timestamp, days_between, local_date};

pub const NEUTRAL_RESONANCE: &str = "Neutral quantum field";
pub const NEUTRAL_EMOJI: &str = "💭";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resonance {
    pub category: Option<Category>,
    pub label: String,
    pub emoji: String,
    pub breakdown: Distribution,
}

/// Label the primary category of `breakdown`, or the neutral label when empty.
pub fn resonance(content: &ContentTables, breakdown: Distribution) -> Resonance {
    match breakdown.primary() {
        Some(c) => {
            let r = content.resonance.get(c);
            Resonance {
                category: Some(c),
                label: r.label.clone(),
                emoji: r.emoji.clone(),
                breakdown,
            }
        }
        None => Resonance {
            category: None,
            label: NEUTRAL_RESONANCE.to_string(),
            emoji: NEUTRAL_EMOJI.to_string(),
            breakdown,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chamber {
    pub message: String,
    pub poem: Option<Poem>,
    /// `round(loveAmplitude * 100)`, percent.
    pub emotion_match: u32,
    pub temporal_alignment: String,
    pub entanglement: &'static str,
}

pub fn chamber(doc: &StateDocument, content: &ContentTables, rng: &mut impl Rng) -> Chamber {
    Chamber {
        message: pick(&content.ui.chamber_messages, rng).to_string(),
        poem: random_classic(content, "quantum", rng),
        emotion_match: percent(doc.metrics.love_amplitude),
        temporal_alignment: doc.metrics.temporal_alignment.clone(),
        entanglement: doc.metrics.entanglement_label(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub days_together: i64,
    /// `round(total * 0.01)` terabytes.
    pub memory_bank_tb: u64,
    pub ai_intimacy: u32,
    pub entanglement: u32,
    pub coherence: String,
    pub superposition: u32,
    pub attempts_remaining: u32,
    pub unlock_streak: u32,
    pub memory_density: u32,
    pub moon: MoonPhase,
}

pub fn dashboard(doc: &StateDocument, now: Timestamp) -> Dashboard {
    Dashboard {
        days_together: days_between(doc.user.anniversary, local_date(&now)),
        memory_bank_tb: (doc.memories.total as f64 * 0.01).round() as u64,
        ai_intimacy: doc.ai.emotional_intelligence.round().max(0.0) as u32,
        entanglement: percent(doc.metrics.entanglement),
        coherence: doc.metrics.coherence_clock(),
        superposition: doc.metrics.superposition,
        attempts_remaining: doc.quantum_lock.remaining(),
        unlock_streak: doc.quantum_lock.unlock_streak,
        memory_density: percent(doc.memories.density),
        moon: moon_phase(now),
    }
}

pub fn status_line<'a>(content: &'a ContentTables, rng: &mut impl Rng) -> &'a str {
    pick(&content.ui.status_lines, rng)
}

fn percent(fraction: f64) -> u32 {
    (fraction * 100.0).round().max(0.0) as u32
}
