use serde::{Deserialize, Serialize};

use crate::error::{DeckError, Result};

pub const MAX_QUALITY: u8 = 5;

/// Tunable constants of the SM-2 variant. The defaults are the classic values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub initial_ease_factor: f64,
    pub minimum_ease_factor: f64,
    /// Interval stored on a card that has never been reviewed.
    pub initial_interval: u32,
    /// Lowest quality that counts as a successful recall.
    pub pass_threshold: u8,
    pub first_interval: u32,
    pub second_interval: u32,
    /// A card is learned once its ease factor is strictly above this value...
    pub learned_ease_factor: f64,
    /// ...and its interval is strictly above this many days.
    pub learned_interval: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_ease_factor: 2.5,
            minimum_ease_factor: 1.3,
            initial_interval: 1,
            pass_threshold: 3,
            first_interval: 1,
            second_interval: 6,
            learned_ease_factor: 2.5,
            learned_interval: 7,
        }
    }
}

impl SchedulerConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        let reason = if !self.minimum_ease_factor.is_finite() || self.minimum_ease_factor <= 0.0 {
            Some("minimum ease factor must be positive")
        } else if !self.initial_ease_factor.is_finite()
            || self.initial_ease_factor < self.minimum_ease_factor
        {
            Some("initial ease factor must not be below the minimum")
        } else if !self.learned_ease_factor.is_finite() {
            Some("learned ease factor must be finite")
        } else if self.pass_threshold > MAX_QUALITY {
            Some("pass threshold must be a valid quality")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(DeckError::InvalidConfig {
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// The scheduling fields of a card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub repetitions: u32,
    pub ease_factor: f64,
    /// Days until the next review.
    pub interval: u32,
}

/// The state a card would move to for each possible quality, indexed by quality.
#[derive(Debug, Clone, PartialEq)]
pub struct NextStates {
    states: [ReviewState; MAX_QUALITY as usize + 1],
}

impl NextStates {
    pub fn get(&self, quality: u8) -> Option<&ReviewState> {
        self.states.get(quality as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &ReviewState)> {
        (0..=MAX_QUALITY).zip(self.states.iter())
    }
}

/// SM-2 review calculator. Pure: it never looks at a clock.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn is_success(&self, quality: u8) -> bool {
        quality >= self.config.pass_threshold
    }

    pub fn next_state(&self, quality: u8, state: ReviewState) -> Result<ReviewState> {
        if quality > MAX_QUALITY {
            return Err(DeckError::InvalidQuality { quality });
        }
        let (repetitions, interval) = if self.is_success(quality) {
            let interval = match state.repetitions {
                0 => self.config.first_interval,
                1 => self.config.second_interval,
                _ => next_interval(state.interval, state.ease_factor),
            };
            (state.repetitions.saturating_add(1), interval)
        } else {
            (0, self.config.first_interval)
        };
        let ease_factor = next_ease_factor(state.ease_factor, quality)
            .max(self.config.minimum_ease_factor);
        Ok(ReviewState {
            repetitions,
            ease_factor,
            interval,
        })
    }

    /// Previews every possible answer without applying any of them.
    pub fn next_states(&self, state: ReviewState) -> Result<NextStates> {
        let mut states = [state; MAX_QUALITY as usize + 1];
        for (quality, slot) in (0..=MAX_QUALITY).zip(states.iter_mut()) {
            *slot = self.next_state(quality, state)?;
        }
        Ok(NextStates { states })
    }
}

/// Applies one review with the default configuration.
pub fn next_state(
    quality: u8,
    repetitions: u32,
    ease_factor: f64,
    interval: u32,
) -> Result<ReviewState> {
    Scheduler::default().next_state(
        quality,
        ReviewState {
            repetitions,
            ease_factor,
            interval,
        },
    )
}

/// Unclamped SM-2 ease update.
pub fn next_ease_factor(ease_factor: f64, quality: u8) -> f64 {
    let q = f64::from(MAX_QUALITY - quality.min(MAX_QUALITY));
    ease_factor + (0.1 - q * (0.08 + q * 0.02))
}

pub fn next_interval(interval: u32, ease_factor: f64) -> u32 {
    (interval as f64 * ease_factor).round() as u32
}
