use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::card::DeckId;
use crate::scheduler::SchedulerConfig;

/// Tally of one sitting with a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub deck_id: DeckId,
    pub cards_studied: u32,
    pub correct_answers: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl StudySession {
    pub fn start(deck_id: DeckId, now: DateTime<Utc>) -> Self {
        Self {
            deck_id,
            cards_studied: 0,
            correct_answers: 0,
            start_time: now,
            end_time: None,
        }
    }

    pub fn record(&mut self, quality: u8, config: &SchedulerConfig) {
        self.cards_studied += 1;
        if quality >= config.pass_threshold {
            self.correct_answers += 1;
        }
    }

    /// The first call wins; later calls keep the original end time.
    pub fn end(&mut self, now: DateTime<Utc>) {
        self.end_time.get_or_insert(now);
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn accuracy(&self) -> f64 {
        if self.cards_studied == 0 {
            0.0
        } else {
            self.correct_answers as f64 / self.cards_studied as f64
        }
    }
}
