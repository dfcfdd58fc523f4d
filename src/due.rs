use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::card::Card;

/// How due cards are presented.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DueOrder {
    /// Deck insertion order.
    #[default]
    Insertion,
    /// Earliest `next_review_at` first; ties keep insertion order.
    MostOverdue,
}

/// Clones every card with `next_review_at <= as_of`, so later store mutations do not
/// affect the returned list.
pub fn select_due<'a, I>(cards: I, as_of: DateTime<Utc>, order: DueOrder) -> Vec<Card>
where
    I: IntoIterator<Item = &'a Card>,
{
    let due = cards.into_iter().filter(|card| card.is_due(as_of)).cloned();
    match order {
        DueOrder::Insertion => due.collect_vec(),
        DueOrder::MostOverdue => due.sorted_by_key(|card| card.next_review_at).collect_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SchedulerConfig;
    use crate::test_helpers::fixed_now;
    use chrono::Duration;
    use std::str::FromStr;

    fn card_due_at(front: &str, next_review_at: DateTime<Utc>) -> Card {
        Card {
            next_review_at,
            ..Card::new(
                front.into(),
                String::new(),
                &SchedulerConfig::default(),
                fixed_now(),
            )
        }
    }

    fn fronts(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|card| card.front.as_str()).collect()
    }

    #[test]
    fn inclusive_boundary() {
        let now = fixed_now();
        let cards = [card_due_at("a", now)];
        assert!(select_due(&cards, now - Duration::seconds(1), DueOrder::Insertion).is_empty());
        assert_eq!(select_due(&cards, now, DueOrder::Insertion).len(), 1);
    }

    #[test]
    fn insertion_order_is_kept() {
        let now = fixed_now();
        let cards = [
            card_due_at("a", now - Duration::days(1)),
            card_due_at("b", now + Duration::days(1)),
            card_due_at("c", now - Duration::days(5)),
            card_due_at("d", now),
        ];
        let due = select_due(&cards, now, DueOrder::Insertion);
        assert_eq!(fronts(&due), ["a", "c", "d"]);
    }

    #[test]
    fn most_overdue_first_with_stable_ties() {
        let now = fixed_now();
        let cards = [
            card_due_at("a", now - Duration::days(1)),
            card_due_at("b", now - Duration::days(5)),
            card_due_at("c", now - Duration::days(1)),
            card_due_at("d", now + Duration::days(2)),
        ];
        let due = select_due(&cards, now, DueOrder::MostOverdue);
        assert_eq!(fronts(&due), ["b", "a", "c"]);
    }

    #[test]
    fn order_names() {
        assert_eq!(DueOrder::MostOverdue.to_string(), "most_overdue");
        assert_eq!(DueOrder::from_str("insertion").unwrap(), DueOrder::Insertion);
    }
}
