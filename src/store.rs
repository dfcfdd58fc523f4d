use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use snafu::OptionExt;

use crate::card::{Card, CardId, Deck, DeckId, Language};
use crate::due::{DueOrder, select_due};
use crate::error::{CardNotFoundSnafu, DeckNotFoundSnafu, Result, VersionConflictSnafu};
use crate::progress::{
    DeckProgress, Progress, RecentActivity, deck_progress, recent_activity, summarize,
};
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::session::StudySession;

/// Owns every deck, and through them every card.
///
/// Scheduling fields only change through the review methods. Readers get shared references
/// or cloned snapshots, never mutable access to a card. Methods without an `_at` suffix use
/// the current time.
#[derive(Debug, Clone, Default)]
pub struct DeckStore {
    pub(crate) decks: Vec<Deck>,
    pub(crate) scheduler: Scheduler,
    progress: Progress,
}

impl DeckStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SchedulerConfig) -> Result<Self> {
        Ok(Self {
            scheduler: Scheduler::new(config)?,
            ..Self::default()
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn deck(&self, deck_id: DeckId) -> Option<&Deck> {
        self.decks.iter().find(|deck| deck.id == deck_id)
    }

    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        self.all_cards().find(|card| card.id == card_id)
    }

    /// Every card, in deck order and then insertion order.
    pub fn all_cards(&self) -> impl Iterator<Item = &Card> {
        self.decks.iter().flat_map(|deck| deck.cards.iter())
    }

    /// Summary as of the last mutation.
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn summarize_at(&self, now: DateTime<Utc>) -> Progress {
        summarize(self.all_cards(), self.scheduler.config(), now)
    }

    pub fn deck_progress(&self, deck_id: DeckId) -> Result<DeckProgress> {
        let deck = self.deck(deck_id).context(DeckNotFoundSnafu { id: deck_id })?;
        Ok(deck_progress(deck, self.scheduler.config()))
    }

    /// The `limit` most recently reviewed cards across every deck, newest first.
    pub fn recent_activity(&self, limit: usize) -> Vec<RecentActivity> {
        recent_activity(&self.decks, limit)
    }

    pub fn create_deck(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        language: Language,
        category: impl Into<String>,
    ) -> DeckId {
        self.create_deck_at(name, description, language, category, Utc::now())
    }

    pub fn create_deck_at(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        language: Language,
        category: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DeckId {
        let deck = Deck::new(
            name.into(),
            description.into(),
            language,
            category.into(),
            now,
        );
        let deck_id = deck.id;
        info!("created deck {deck_id} ({})", deck.name);
        self.decks.push(deck);
        self.refresh_progress(now);
        deck_id
    }

    pub fn add_card(
        &mut self,
        deck_id: DeckId,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<CardId> {
        self.add_card_at(deck_id, front, back, Utc::now())
    }

    pub fn add_card_at(
        &mut self,
        deck_id: DeckId,
        front: impl Into<String>,
        back: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<CardId> {
        let deck = self
            .decks
            .iter_mut()
            .find(|deck| deck.id == deck_id)
            .context(DeckNotFoundSnafu { id: deck_id })?;
        let card = Card::new(front.into(), back.into(), self.scheduler.config(), now);
        let card_id = card.id;
        deck.cards.push(card);
        info!("added card {card_id} to deck {deck_id}");
        self.refresh_progress(now);
        Ok(card_id)
    }

    pub fn review_card(&mut self, deck_id: DeckId, card_id: CardId, quality: u8) -> Result<Card> {
        self.review_card_at(deck_id, card_id, quality, Utc::now())
    }

    /// Applies one review and returns a snapshot of the updated card.
    pub fn review_card_at(
        &mut self,
        deck_id: DeckId,
        card_id: CardId,
        quality: u8,
        now: DateTime<Utc>,
    ) -> Result<Card> {
        self.apply_review(deck_id, card_id, quality, None, now)
    }

    /// Like [`DeckStore::review_card_at`], but only if nobody reviewed the card since
    /// `expected_version` was read.
    pub fn review_card_checked(
        &mut self,
        deck_id: DeckId,
        card_id: CardId,
        quality: u8,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> Result<Card> {
        self.apply_review(deck_id, card_id, quality, Some(expected_version), now)
    }

    pub fn review_card_by_id(&mut self, card_id: CardId, quality: u8) -> Result<Card> {
        self.review_card_by_id_at(card_id, quality, Utc::now())
    }

    /// Reviews a card without knowing its deck.
    pub fn review_card_by_id_at(
        &mut self,
        card_id: CardId,
        quality: u8,
        now: DateTime<Utc>,
    ) -> Result<Card> {
        let Some(deck_id) = self
            .decks
            .iter()
            .find(|deck| deck.card(card_id).is_some())
            .map(|deck| deck.id)
        else {
            warn!("card {card_id} not found in any deck");
            return CardNotFoundSnafu { id: card_id }.fail();
        };
        self.apply_review(deck_id, card_id, quality, None, now)
    }

    fn apply_review(
        &mut self,
        deck_id: DeckId,
        card_id: CardId,
        quality: u8,
        expected_version: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<Card> {
        let deck = self
            .decks
            .iter_mut()
            .find(|deck| deck.id == deck_id)
            .context(DeckNotFoundSnafu { id: deck_id })?;
        let card = deck
            .card_mut(card_id)
            .context(CardNotFoundSnafu { id: card_id })?;
        if let Some(expected) = expected_version {
            if card.version != expected {
                return VersionConflictSnafu {
                    id: card_id,
                    expected,
                    actual: card.version,
                }
                .fail();
            }
        }
        let next = self.scheduler.next_state(quality, card.review_state())?;

        card.repetitions = next.repetitions;
        card.ease_factor = next.ease_factor;
        card.interval_days = next.interval;
        card.next_review_at = due_after(now, next.interval);
        card.last_reviewed_at = Some(now);
        card.version += 1;
        let reviewed = card.clone();
        info!(
            "reviewed card {card_id} with quality {quality}: interval {} days, ease {:.2}, repetitions {}",
            reviewed.interval_days, reviewed.ease_factor, reviewed.repetitions
        );
        self.refresh_progress(now);
        Ok(reviewed)
    }

    pub fn delete_deck(&mut self, deck_id: DeckId) -> Result<Deck> {
        self.delete_deck_at(deck_id, Utc::now())
    }

    /// Removes the deck together with its cards and hands it back.
    pub fn delete_deck_at(&mut self, deck_id: DeckId, now: DateTime<Utc>) -> Result<Deck> {
        let index = self
            .decks
            .iter()
            .position(|deck| deck.id == deck_id)
            .context(DeckNotFoundSnafu { id: deck_id })?;
        let deck = self.decks.remove(index);
        info!("deleted deck {deck_id} with {} cards", deck.cards.len());
        self.refresh_progress(now);
        Ok(deck)
    }

    pub fn due_cards(&self, deck_id: DeckId, as_of: DateTime<Utc>) -> Result<Vec<Card>> {
        self.due_cards_ordered(deck_id, as_of, DueOrder::Insertion)
    }

    pub fn due_cards_ordered(
        &self,
        deck_id: DeckId,
        as_of: DateTime<Utc>,
        order: DueOrder,
    ) -> Result<Vec<Card>> {
        let deck = self
            .deck(deck_id)
            .context(DeckNotFoundSnafu { id: deck_id })?;
        Ok(select_due(&deck.cards, as_of, order))
    }

    /// Due cards across every deck.
    pub fn all_due_cards(&self, as_of: DateTime<Utc>) -> Vec<Card> {
        select_due(self.all_cards(), as_of, DueOrder::Insertion)
    }

    pub fn start_session(&self, deck_id: DeckId, now: DateTime<Utc>) -> Result<StudySession> {
        self.deck(deck_id)
            .context(DeckNotFoundSnafu { id: deck_id })?;
        debug!("starting study session for deck {deck_id}");
        Ok(StudySession::start(deck_id, now))
    }

    /// Reviews a card of the session's deck and tallies the answer once it is applied.
    pub fn review_in_session(
        &mut self,
        session: &mut StudySession,
        card_id: CardId,
        quality: u8,
        now: DateTime<Utc>,
    ) -> Result<Card> {
        let reviewed = self.review_card_at(session.deck_id, card_id, quality, now)?;
        session.record(quality, self.scheduler.config());
        Ok(reviewed)
    }

    pub(crate) fn refresh_progress(&mut self, now: DateTime<Utc>) {
        self.progress = self.summarize_at(now);
        debug!("progress updated: {:?}", self.progress);
    }
}

fn due_after(now: DateTime<Utc>, interval: u32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::days(i64::from(interval)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
