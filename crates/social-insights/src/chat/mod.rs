//! Chat widget: a transcript-backed session over the analysis workflow

mod session;

pub use session::{ChatSession, PendingTurn, TurnOutcome, TurnState};

/// Starter questions offered to the user, as (label, question)
pub const SAMPLE_QUESTIONS: [(&str, &str); 3] = [
    (
        "Best performing post type?",
        "Which post type has the highest engagement rate?",
    ),
    (
        "Content strategy",
        "What content strategy would you recommend?",
    ),
    (
        "Engagement trends",
        "Show me engagement trends over time",
    ),
];
