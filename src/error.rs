use snafu::Snafu;

use crate::card::{CardId, DeckId};

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum DeckError {
    #[snafu(display("deck {id} does not exist"))]
    DeckNotFound { id: DeckId },
    #[snafu(display("card {id} does not exist"))]
    CardNotFound { id: CardId },
    #[snafu(display("quality must be between 0 and 5, got {quality}"))]
    InvalidQuality { quality: u8 },
    #[snafu(display("invalid scheduler configuration: {reason}"))]
    InvalidConfig { reason: String },
    #[snafu(display("invalid collection: {reason}"))]
    InvalidCollection { reason: String },
    #[snafu(display("card {id} is at version {actual}, expected {expected}"))]
    VersionConflict {
        id: CardId,
        expected: u64,
        actual: u64,
    },
    #[snafu(display("{key:?} cannot be used as a storage key"))]
    InvalidKey { key: String },
    #[snafu(display("storage error: {source}"))]
    Storage { source: std::io::Error },
    #[snafu(display("could not encode or decode collection: {source}"))]
    Serialization { source: serde_json::Error },
}

impl DeckError {
    /// True for both missing decks and missing cards.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DeckError::DeckNotFound { .. } | DeckError::CardNotFound { .. }
        )
    }
}

pub type Result<T, E = DeckError> = std::result::Result<T, E>;
