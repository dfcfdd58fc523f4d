use chrono::{Duration, Utc};
use flashdeck::{DeckStore, Language, MemoryRepository};

fn setup_logging() -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()
}

fn study_a_deck() -> Result<(), Box<dyn std::error::Error>> {
    let mut store = DeckStore::new();
    let mut now = Utc::now();

    // Create a deck with a few cards
    let deck_id = store.create_deck_at(
        "Basic Slovak Vocabulary",
        "Essential Slovak words for beginners",
        Language::Slovak,
        "Language Learning",
        now,
    );
    for (front, back) in [
        ("Hello", "Ahoj"),
        ("Thank you", "Ďakujem"),
        ("Good morning", "Dobré ráno"),
    ] {
        store.add_card_at(deck_id, front, back, now)?;
    }

    // Preview what each answer would do to a fresh card
    let first = store.decks()[0].cards[0].review_state();
    for (quality, state) in store.scheduler().next_states(first)?.iter() {
        println!("quality {quality}: next review in {} days", state.interval);
    }

    // Study every due card for two weeks, always recalling the first card perfectly
    for _ in 0..14 {
        let mut session = store.start_session(deck_id, now)?;
        for card in store.due_cards(deck_id, now)? {
            let quality = if card.front == "Hello" { 5 } else { 3 };
            store.review_in_session(&mut session, card.id, quality, now)?;
        }
        session.end(now);
        if session.cards_studied > 0 {
            println!(
                "{}: studied {} cards, accuracy {:.0}%",
                now.date_naive(),
                session.cards_studied,
                session.accuracy() * 100.0
            );
        }
        now += Duration::days(1);
    }

    let progress = store.progress();
    println!(
        "total {}, new {}, reviewing {}, learned {} ({:.0}% mastered)",
        progress.total_cards,
        progress.cards_new,
        progress.cards_reviewing,
        progress.cards_learned,
        progress.mastery_percentage()
    );

    let deck_progress = store.deck_progress(deck_id)?;
    println!(
        "deck: {} studied, {} mastered, accuracy {}%",
        deck_progress.studied_cards, deck_progress.mastered_cards, deck_progress.accuracy
    );
    for entry in store.recent_activity(5) {
        println!("{} ({}) at {}", entry.card_front, entry.deck_name, entry.reviewed_at);
    }

    // Persist and restore
    let mut repository = MemoryRepository::new();
    store.save_to(&mut repository, "sk")?;
    let mut restored = DeckStore::new();
    restored.load_from(&repository, "sk", now)?;
    println!("restored {} decks", restored.decks().len());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging()?;
    study_a_deck()
}
