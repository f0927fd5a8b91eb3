pub mod card_selector;
pub mod engine;
pub mod normalizer;

pub use card_selector::{due_order, select_next, DueCandidate};
pub use engine::{compute_next_state, compute_next_state_for_code, InvalidRatingError, MIN_EASE_FACTOR};
pub use normalizer::{normalize, ChannelResult, UnknownRatingError};
