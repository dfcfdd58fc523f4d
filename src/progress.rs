use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::card::{Card, CardId, Deck, DeckId};
use crate::scheduler::SchedulerConfig;

/// Summary counts over a card population.
///
/// `cards_reviewing` overlaps with `cards_learned`: a learned card whose review date has
/// passed is counted in both. The counts therefore need not add up to `total_cards`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub total_cards: usize,
    pub cards_learned: usize,
    pub cards_reviewing: usize,
    pub cards_new: usize,
    /// Always 0; there is no study history to derive a streak from.
    pub streak_days: u32,
    pub last_study_date: Option<DateTime<Utc>>,
}

impl Progress {
    pub fn mastery_percentage(&self) -> f64 {
        percentage(self.cards_learned, self.total_cards)
    }

    pub fn reviewing_percentage(&self) -> f64 {
        percentage(self.cards_reviewing, self.total_cards)
    }

    pub fn new_percentage(&self) -> f64 {
        percentage(self.cards_new, self.total_cards)
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

pub fn summarize<'a, I>(cards: I, config: &SchedulerConfig, now: DateTime<Utc>) -> Progress
where
    I: IntoIterator<Item = &'a Card>,
{
    cards.into_iter().fold(Progress::default(), |mut progress, card| {
        progress.total_cards += 1;
        if card.is_new() {
            progress.cards_new += 1;
        }
        if card.is_learned(config) {
            progress.cards_learned += 1;
        }
        if !card.is_new() && card.is_due(now) {
            progress.cards_reviewing += 1;
        }
        progress.last_study_date = progress.last_study_date.max(card.last_reviewed_at);
        progress
    })
}

/// Per-deck counts for the progress screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckProgress {
    pub deck_id: DeckId,
    pub total_cards: usize,
    /// Cards reviewed at least once.
    pub studied_cards: usize,
    pub mastered_cards: usize,
    /// Mastered share of studied cards, as a whole percentage.
    pub accuracy: u32,
}

pub fn deck_progress(deck: &Deck, config: &SchedulerConfig) -> DeckProgress {
    let studied_cards = deck
        .cards
        .iter()
        .filter(|card| card.last_reviewed_at.is_some())
        .count();
    let mastered_cards = deck
        .cards
        .iter()
        .filter(|card| card.is_learned(config))
        .count();
    DeckProgress {
        deck_id: deck.id,
        total_cards: deck.cards.len(),
        studied_cards,
        mastered_cards,
        accuracy: percentage(mastered_cards, studied_cards).round() as u32,
    }
}

/// A reviewed card together with the deck it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub card_id: CardId,
    pub card_front: String,
    pub deck_id: DeckId,
    pub deck_name: String,
    pub reviewed_at: DateTime<Utc>,
}

/// The `limit` most recently reviewed cards, newest first. Equal review times keep deck
/// order and then insertion order.
pub fn recent_activity<'a, I>(decks: I, limit: usize) -> Vec<RecentActivity>
where
    I: IntoIterator<Item = &'a Deck>,
{
    decks
        .into_iter()
        .flat_map(|deck| {
            deck.cards.iter().filter_map(move |card| {
                card.last_reviewed_at.map(|reviewed_at| RecentActivity {
                    card_id: card.id,
                    card_front: card.front.clone(),
                    deck_id: deck.id,
                    deck_name: deck.name.clone(),
                    reviewed_at,
                })
            })
        })
        .sorted_by(|a, b| b.reviewed_at.cmp(&a.reviewed_at))
        .take(limit)
        .collect_vec()
}
