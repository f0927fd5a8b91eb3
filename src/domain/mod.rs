pub mod card;
pub mod review;

pub use card::{Card, CardSrsState, Deck};
pub use review::{ReviewChannel, ReviewEvent, ReviewLogEntry, ReviewOutcome};
