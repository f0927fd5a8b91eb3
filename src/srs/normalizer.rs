//! Maps what each delivery channel collects onto [`ReviewOutcome`].

use crate::domain::ReviewOutcome;

/// Raw result reported by a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelResult<'a> {
  /// Web client button label: "Again", "Hard", "Good" or "Easy"
  Web(&'a str),
  /// Chat reply already graded as right or wrong
  Chat { is_correct: bool },
  /// Bot-reported outcome string: "correct" or "incorrect"
  ChatOutcome(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rating '{0}'")]
pub struct UnknownRatingError(pub String);

/// Normalize a channel result into a canonical outcome.
///
/// The chat channel is binary: a correct reply becomes `Good` and a wrong
/// one `Again`. It cannot express `Hard` or `Easy`, so chat reviews never
/// produce them.
pub fn normalize(result: ChannelResult<'_>) -> Result<ReviewOutcome, UnknownRatingError> {
  match result {
    ChannelResult::Web(label) => {
      ReviewOutcome::from_label(label).ok_or_else(|| UnknownRatingError(label.to_string()))
    }
    ChannelResult::Chat { is_correct } => Ok(from_correctness(is_correct)),
    ChannelResult::ChatOutcome(outcome) => match outcome {
      "correct" => Ok(from_correctness(true)),
      "incorrect" => Ok(from_correctness(false)),
      other => Err(UnknownRatingError(other.to_string())),
    },
  }
}

fn from_correctness(is_correct: bool) -> ReviewOutcome {
  if is_correct {
    ReviewOutcome::Good
  } else {
    ReviewOutcome::Again
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_web_labels() {
    assert_eq!(normalize(ChannelResult::Web("Again")), Ok(ReviewOutcome::Again));
    assert_eq!(normalize(ChannelResult::Web("Hard")), Ok(ReviewOutcome::Hard));
    assert_eq!(normalize(ChannelResult::Web("Good")), Ok(ReviewOutcome::Good));
    assert_eq!(normalize(ChannelResult::Web("Easy")), Ok(ReviewOutcome::Easy));
  }

  #[test]
  fn test_web_unknown_label() {
    assert_eq!(
      normalize(ChannelResult::Web("Perfect")),
      Err(UnknownRatingError("Perfect".to_string()))
    );
    assert!(normalize(ChannelResult::Web("")).is_err());
    assert!(normalize(ChannelResult::Web("good")).is_err());
  }

  #[test]
  fn test_chat_is_binary() {
    assert_eq!(normalize(ChannelResult::Chat { is_correct: true }), Ok(ReviewOutcome::Good));
    assert_eq!(normalize(ChannelResult::Chat { is_correct: false }), Ok(ReviewOutcome::Again));
  }

  #[test]
  fn test_chat_outcome_strings() {
    assert_eq!(normalize(ChannelResult::ChatOutcome("correct")), Ok(ReviewOutcome::Good));
    assert_eq!(normalize(ChannelResult::ChatOutcome("incorrect")), Ok(ReviewOutcome::Again));
    assert_eq!(
      normalize(ChannelResult::ChatOutcome("partial")),
      Err(UnknownRatingError("partial".to_string()))
    );
  }
}
