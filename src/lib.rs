mod card;
mod due;
mod error;
mod progress;
mod scheduler;
mod session;
mod storage;
mod store;
#[cfg(test)]
mod test_helpers;

pub use card::{Card, CardId, CardStatus, Deck, DeckId, Difficulty, Language};
pub use due::{DueOrder, select_due};
pub use error::{DeckError, Result};
pub use progress::{
    DeckProgress, Progress, RecentActivity, deck_progress, recent_activity, summarize,
};
pub use scheduler::{
    MAX_QUALITY, NextStates, ReviewState, Scheduler, SchedulerConfig, next_ease_factor,
    next_interval, next_state,
};
pub use session::StudySession;
pub use storage::{Collection, JsonFileRepository, MemoryRepository, Repository};
pub use store::DeckStore;
