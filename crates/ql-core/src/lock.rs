//! The daily quantum lock: word derivation and guess evaluation.
//!
//! The word index folds the hour into the seed, so the chosen word can move
//! within a single day when it is regenerated. Once `attempts` reaches
//! `max_attempts` no further guess is evaluated or counted until a new word
//! is assigned.

use chrono::NaiveDate;
use serde::Serialize;

use crate::content::WordEntry;
use crate::document::QuantumLock;
use crate::time::Timestamp;
use crate::tokenizer::normalize;

pub const UNLOCK_MESSAGE: &str = "Quantum entanglement achieved! Chamber opening...";
pub const LOCKOUT_MESSAGE: &str = "Quantum lock secured. Try again tomorrow.";

/// `(day * seed + month * hour) mod len`.
pub fn word_index(day: u32, month: u32, hour: u32, seed: u32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let raw = u64::from(day) * u64::from(seed) + u64::from(month) * u64::from(hour);
    (raw % len as u64) as usize
}

pub fn hint_for(entry: &WordEntry) -> String {
    format!(
        "Relates to \"{}\" | Quantum state: {}",
        entry.meaning, entry.quantum_state
    )
}

/// Install `entry` as the current word and open a fresh round.
pub fn assign(lock: &mut QuantumLock, entry: &WordEntry, today: NaiveDate) {
    lock.todays_word = entry.word.clone();
    lock.todays_hint = hint_for(entry);
    lock.attempts = 0;
    lock.generated_on = Some(today);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Correct guess; streak bumped, attempts cleared.
    Unlocked,
    /// Wrong guess with attempts to spare.
    Miss,
    /// Wrong guess that used the last attempt; streak reset.
    LockedOut,
    /// The round was already locked out; nothing changed.
    StillLocked,
    /// Blank input; nothing changed.
    Blank,
}

/// Evaluate one guess against the lock, mutating attempts and streak.
pub fn judge(lock: &mut QuantumLock, guess: &str, now: Timestamp) -> Verdict {
    if lock.is_locked_out() {
        return Verdict::StillLocked;
    }
    let guess = normalize(guess);
    if guess.is_empty() {
        return Verdict::Blank;
    }

    if guess == lock.todays_word {
        lock.last_unlock = Some(now);
        lock.unlock_streak = lock.unlock_streak.saturating_add(1);
        lock.attempts = 0;
        return Verdict::Unlocked;
    }

    lock.attempts += 1;
    if lock.is_locked_out() {
        lock.unlock_streak = 0;
        Verdict::LockedOut
    } else {
        Verdict::Miss
    }
}

/// What a caller gets back from an unlock attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnlockOutcome {
    Unlocked {
        message: String,
        streak: u32,
    },
    Retry {
        message: String,
        attempts: u32,
        hint: String,
    },
    Locked {
        message: String,
        attempts: u32,
    },
}

impl UnlockOutcome {
    pub fn success(&self) -> bool {
        matches!(self, UnlockOutcome::Unlocked { .. })
    }

    pub fn locked(&self) -> bool {
        matches!(self, UnlockOutcome::Locked { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            UnlockOutcome::Unlocked { message, .. }
            | UnlockOutcome::Retry { message, .. }
            | UnlockOutcome::Locked { message, .. } => message,
        }
    }

    /// Build the response for a verdict from the lock's post-judgement state.
    pub fn from_verdict(verdict: Verdict, lock: &QuantumLock) -> Self {
        match verdict {
            Verdict::Unlocked => UnlockOutcome::Unlocked {
                message: UNLOCK_MESSAGE.to_string(),
                streak: lock.unlock_streak,
            },
            Verdict::LockedOut | Verdict::StillLocked => UnlockOutcome::Locked {
                message: LOCKOUT_MESSAGE.to_string(),
                attempts: lock.attempts,
            },
            Verdict::Miss => UnlockOutcome::Retry {
                message: format!("Incorrect. Attempts remaining: {}", lock.remaining()),
                attempts: lock.attempts,
                hint: lock.todays_hint.clone(),
            },
            Verdict::Blank => UnlockOutcome::Retry {
                message: "Enter a word to attempt the lock.".to_string(),
                attempts: lock.attempts,
                hint: lock.todays_hint.clone(),
            },
        }
    }
}
