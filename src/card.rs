use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::scheduler::{ReviewState, SchedulerConfig};

pub type DeckId = Uuid;
pub type CardId = Uuid;

/// Languages a deck can be tagged with.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum Language {
    #[serde(rename = "sk")]
    #[strum(serialize = "sk")]
    Slovak,
    #[serde(rename = "en")]
    #[strum(serialize = "en")]
    English,
}

/// Self-assessed difficulty label shown next to a card. It does not affect scheduling.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Exclusive classification of a single card, derived from its scheduling fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
pub enum CardStatus {
    New,
    Reviewing,
    Learned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub ease_factor: f64,
    pub interval_days: u32,
    /// Consecutive successful reviews since the last failure.
    pub repetitions: u32,
    pub next_review_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// Bumped on every applied review; used to detect lost updates.
    #[serde(default)]
    pub version: u64,
}

impl Card {
    /// A fresh card is due immediately.
    pub(crate) fn new(
        front: String,
        back: String,
        config: &SchedulerConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            front,
            back,
            difficulty: Difficulty::default(),
            ease_factor: config.initial_ease_factor,
            interval_days: config.initial_interval,
            repetitions: 0,
            next_review_at: now,
            created_at: now,
            last_reviewed_at: None,
            version: 0,
        }
    }

    pub fn review_state(&self) -> ReviewState {
        ReviewState {
            repetitions: self.repetitions,
            ease_factor: self.ease_factor,
            interval: self.interval_days,
        }
    }

    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.next_review_at <= as_of
    }

    pub fn is_new(&self) -> bool {
        self.repetitions == 0
    }

    pub fn is_learned(&self, config: &SchedulerConfig) -> bool {
        self.repetitions > 0
            && self.ease_factor > config.learned_ease_factor
            && self.interval_days > config.learned_interval
    }

    pub fn status(&self, config: &SchedulerConfig) -> CardStatus {
        if self.is_new() {
            CardStatus::New
        } else if self.is_learned(config) {
            CardStatus::Learned
        } else {
            CardStatus::Reviewing
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub description: String,
    pub language: Language,
    pub category: String,
    pub created_at: DateTime<Utc>,
    /// Insertion order; never reordered.
    pub cards: Vec<Card>,
}

impl Deck {
    pub(crate) fn new(
        name: String,
        description: String,
        language: Language,
        category: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            language,
            category,
            created_at: now,
            cards: Vec::new(),
        }
    }

    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    pub(crate) fn card_mut(&mut self, card_id: CardId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|card| card.id == card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
