use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, ensure};

use crate::card::Deck;
use crate::error::{DeckError, InvalidKeySnafu, Result, SerializationSnafu, StorageSnafu};
use crate::store::DeckStore;

/// Serializable snapshot of every deck and card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub decks: Vec<Deck>,
}

impl Collection {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context(SerializationSnafu)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context(SerializationSnafu)
    }

    /// Checks the invariants a restored collection must satisfy.
    pub fn validate(&self, minimum_ease_factor: f64) -> Result<()> {
        let mut deck_ids = HashSet::new();
        let mut card_ids = HashSet::new();
        for deck in &self.decks {
            if !deck_ids.insert(deck.id) {
                return invalid(format!("duplicate deck id {}", deck.id));
            }
            for card in &deck.cards {
                if !card_ids.insert(card.id) {
                    return invalid(format!("duplicate card id {}", card.id));
                }
                if !card.ease_factor.is_finite() || card.ease_factor < minimum_ease_factor {
                    return invalid(format!(
                        "card {} has ease factor {}, not a finite value >= {minimum_ease_factor}",
                        card.id, card.ease_factor
                    ));
                }
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> Result<()> {
    Err(DeckError::InvalidCollection { reason })
}

/// Durable home for collections, addressed by a caller-chosen key.
pub trait Repository {
    /// `Ok(None)` when nothing was saved under `key`.
    fn load(&self, key: &str) -> Result<Option<Collection>>;
    fn save(&mut self, key: &str, collection: &Collection) -> Result<()>;
}

/// Keeps encoded collections in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    entries: HashMap<String, String>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for MemoryRepository {
    fn load(&self, key: &str) -> Result<Option<Collection>> {
        self.entries
            .get(key)
            .map(|json| Collection::from_json(json))
            .transpose()
    }

    fn save(&mut self, key: &str, collection: &Collection) -> Result<()> {
        self.entries.insert(key.to_string(), collection.to_json()?);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory. Keys are plain file stems: empty
/// keys, `.`, `..` and keys containing a path separator are rejected.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        ensure!(
            !key.is_empty() && key != "." && key != ".." && !key.contains(['/', '\\']),
            InvalidKeySnafu { key }
        );
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Repository for JsonFileRepository {
    fn load(&self, key: &str) -> Result<Option<Collection>> {
        let path = self.path(key)?;
        let json = match fs::read_to_string(&path) {
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            result => result.context(StorageSnafu)?,
        };
        debug!("loaded collection from {}", path.display());
        Collection::from_json(&json).map(Some)
    }

    fn save(&mut self, key: &str, collection: &Collection) -> Result<()> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.dir).context(StorageSnafu)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, collection.to_json()?).context(StorageSnafu)?;
        fs::rename(&tmp, &path).context(StorageSnafu)?;
        debug!("saved collection to {}", path.display());
        Ok(())
    }
}

impl DeckStore {
    pub fn snapshot(&self) -> Collection {
        Collection {
            decks: self.decks.clone(),
        }
    }

    /// Replaces every deck with the collection's, after validating it.
    pub fn restore(&mut self, collection: Collection, now: DateTime<Utc>) -> Result<()> {
        collection.validate(self.scheduler.config().minimum_ease_factor)?;
        self.decks = collection.decks;
        self.refresh_progress(now);
        Ok(())
    }

    pub fn save_to<R: Repository>(&self, repository: &mut R, key: &str) -> Result<()> {
        repository.save(key, &self.snapshot())?;
        info!("saved {} decks under {key}", self.decks.len());
        Ok(())
    }

    /// Returns `Ok(false)` and leaves the store as is when `key` holds nothing.
    pub fn load_from<R: Repository>(
        &mut self,
        repository: &R,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(collection) = repository.load(key)? else {
            return Ok(false);
        };
        self.restore(collection, now)?;
        info!("restored {} decks from {key}", self.decks.len());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Language;
    use crate::test_helpers::fixed_now;
    use chrono::Duration;

    fn populated_store() -> Result<DeckStore> {
        let mut store = DeckStore::new();
        let now = fixed_now();
        let deck_id = store.create_deck_at(
            "English Grammar",
            "Common English grammar rules",
            Language::English,
            "Grammar",
            now,
        );
        let went = store.add_card_at(deck_id, "Past tense of \"go\"", "went", now)?;
        store.add_card_at(deck_id, "Plural of \"child\"", "children", now)?;
        store.review_card_at(
            deck_id,
            went,
            4,
            now + Duration::milliseconds(1234) + Duration::nanoseconds(5),
        )?;
        Ok(store)
    }

    #[test]
    fn memory_round_trip_keeps_timestamps() -> Result<()> {
        let store = populated_store()?;
        let mut repository = MemoryRepository::new();
        store.save_to(&mut repository, "decks")?;

        let mut restored = DeckStore::new();
        assert!(restored.load_from(&repository, "decks", fixed_now())?);
        assert_eq!(restored.decks(), store.decks());
        assert_eq!(restored.progress(), store.progress());
        Ok(())
    }

    #[test]
    fn missing_key_loads_nothing() -> Result<()> {
        let repository = MemoryRepository::new();
        let mut store = populated_store()?;
        assert!(!store.load_from(&repository, "absent", fixed_now())?);
        assert_eq!(store.decks().len(), 1);
        Ok(())
    }

    #[test]
    fn file_round_trip() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let mut repository = JsonFileRepository::new(dir.path().join("nested"));
        assert!(repository.load("decks")?.is_none());

        let store = populated_store()?;
        store.save_to(&mut repository, "decks")?;
        assert!(repository.dir().join("decks.json").exists());

        let mut restored = DeckStore::new();
        assert!(restored.load_from(&repository, "decks", fixed_now())?);
        assert_eq!(restored.snapshot(), store.snapshot());
        Ok(())
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("decks.json"), "{not json").unwrap();
        let repository = JsonFileRepository::new(dir.path());
        assert!(matches!(
            repository.load("decks"),
            Err(DeckError::Serialization { .. })
        ));
    }

    #[test]
    fn unreadable_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("decks.json")).unwrap();
        let repository = JsonFileRepository::new(dir.path());
        let err = repository.load("decks").unwrap_err();
        assert!(matches!(err, DeckError::Storage { .. }));
        assert!(err.to_string().starts_with("storage error"));
    }

    #[test]
    fn restore_rejects_broken_invariants() -> Result<()> {
        let store = populated_store()?;
        let mut target = DeckStore::new();

        let mut low_ease = store.snapshot();
        low_ease.decks[0].cards[0].ease_factor = 1.0;
        assert!(matches!(
            target.restore(low_ease, fixed_now()),
            Err(DeckError::InvalidCollection { .. })
        ));

        let mut duplicated = store.snapshot();
        let card = duplicated.decks[0].cards[0].clone();
        duplicated.decks[0].cards.push(card);
        assert!(target.restore(duplicated, fixed_now()).is_err());

        let mut duplicated_deck = store.snapshot();
        let mut deck = duplicated_deck.decks[0].clone();
        deck.cards.clear();
        duplicated_deck.decks.push(deck);
        assert!(target.restore(duplicated_deck, fixed_now()).is_err());

        assert!(target.decks().is_empty());
        Ok(())
    }

    #[test]
    fn restore_rejects_non_finite_ease() -> Result<()> {
        let store = populated_store()?;
        let mut target = DeckStore::new();
        for ease_factor in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let mut collection = store.snapshot();
            collection.decks[0].cards[1].ease_factor = ease_factor;
            assert!(matches!(
                target.restore(collection, fixed_now()),
                Err(DeckError::InvalidCollection { .. })
            ));
        }
        assert!(target.decks().is_empty());
        Ok(())
    }

    #[test]
    fn keys_must_stay_inside_the_directory() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let mut repository = JsonFileRepository::new(dir.path().join("decks"));
        let store = populated_store()?;
        for key in ["../escaped", "nested/decks", "nested\\decks", "..", ".", ""] {
            assert!(matches!(
                store.save_to(&mut repository, key),
                Err(DeckError::InvalidKey { .. })
            ));
            assert!(matches!(
                repository.load(key),
                Err(DeckError::InvalidKey { .. })
            ));
        }
        assert!(!dir.path().join("escaped.json").exists());
        assert!(!repository.dir().exists());

        store.save_to(&mut repository, "decks.v2")?;
        assert!(repository.load("decks.v2")?.is_some());
        Ok(())
    }

    #[test]
    fn missing_version_defaults_to_zero() -> Result<()> {
        let store = populated_store()?;
        let mut value = serde_json::to_value(store.snapshot()).unwrap();
        for card in value["decks"][0]["cards"].as_array_mut().unwrap() {
            card.as_object_mut().unwrap().remove("version");
        }
        let collection = Collection::from_json(&value.to_string())?;
        assert!(collection.decks[0].cards.iter().all(|card| card.version == 0));
        Ok(())
    }
}
