//! Week-ahead predictions drawn from the short-term template table.

use chrono::Duration;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::content::{ContentTables, Horizon};
use crate::document::{Prediction, PredictionBoard};
use crate::time::{Timestamp, utc_date};

pub const HORIZON_DAYS: i64 = 7;

/// One prediction for each of the next [`HORIZON_DAYS`] local dates.
pub fn week_ahead(content: &ContentTables, now: Timestamp, rng: &mut impl Rng) -> Vec<Prediction> {
    let templates = content.templates_for(Horizon::ShortTerm);
    let today = utc_date(&now);

    (1..=HORIZON_DAYS)
        .filter_map(|offset| {
            let template = templates.choose(rng)?;
            Some(Prediction {
                date: today + Duration::days(offset),
                text: template.text.clone(),
                emoji: content.prediction_emoji(&template.text).to_string(),
                confidence: template.confidence,
            })
        })
        .collect()
}

impl PredictionBoard {
    pub fn replace_short_term(&mut self, predictions: Vec<Prediction>, now: Timestamp) {
        self.short_term = predictions;
        self.last_updated = Some(now);
    }
}
