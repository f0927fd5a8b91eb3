//! Per-user chat review sessions.
//!
//! Each chat user has a queue of card ids waiting to be asked and at most
//! one prompt in flight (asked, answer not yet received). The manager is
//! owned by `AppState` and shared by handle between the dispatcher and the
//! bot-facing handlers.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A prompt that was sent to the user and awaits an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPrompt {
  pub card_id: i64,
  pub asked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ChatSession {
  queue: VecDeque<i64>,
  in_flight: Option<PendingPrompt>,
}

impl ChatSession {
  fn contains(&self, card_id: i64) -> bool {
    self.in_flight.is_some_and(|p| p.card_id == card_id) || self.queue.contains(&card_id)
  }

  fn is_idle(&self) -> bool {
    self.queue.is_empty() && self.in_flight.is_none()
  }
}

#[derive(Debug, Clone, Default)]
pub struct ChatSessions {
  inner: Arc<Mutex<HashMap<String, ChatSession>>>,
}

impl ChatSessions {
  pub fn new() -> Self {
    Self::default()
  }

  // Every update leaves the map consistent, so poisoning is ignored
  fn lock(&self) -> MutexGuard<'_, HashMap<String, ChatSession>> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Queue a card for a user. Returns false if it is already queued or in flight.
  pub fn enqueue(&self, chat_user_id: &str, card_id: i64) -> bool {
    let mut sessions = self.lock();
    let session = sessions.entry(chat_user_id.to_string()).or_default();
    if session.contains(card_id) {
      return false;
    }
    session.queue.push_back(card_id);
    true
  }

  /// The card to ask next.
  ///
  /// An unanswered prompt is returned again; otherwise the head of the
  /// queue becomes the new in-flight prompt.
  pub fn next_prompt(&self, chat_user_id: &str, now: DateTime<Utc>) -> Option<PendingPrompt> {
    let mut sessions = self.lock();
    let session = sessions.get_mut(chat_user_id)?;
    if let Some(pending) = session.in_flight {
      return Some(pending);
    }
    let card_id = session.queue.pop_front()?;
    let pending = PendingPrompt { card_id, asked_at: now };
    session.in_flight = Some(pending);
    Some(pending)
  }

  pub fn in_flight(&self, chat_user_id: &str) -> Option<PendingPrompt> {
    self.lock().get(chat_user_id).and_then(|s| s.in_flight)
  }

  /// Clear the in-flight prompt if it is for `card_id`. Returns whether it was cleared.
  pub fn complete(&self, chat_user_id: &str, card_id: i64) -> bool {
    let mut sessions = self.lock();
    match sessions.get_mut(chat_user_id) {
      Some(session) if session.in_flight.is_some_and(|p| p.card_id == card_id) => {
        session.in_flight = None;
        true
      }
      _ => false,
    }
  }

  /// Claim the in-flight prompt for answering, leaving the slot empty.
  ///
  /// Only one caller gets the prompt, so a reply delivered twice is applied once.
  pub fn take_in_flight(&self, chat_user_id: &str) -> Option<PendingPrompt> {
    self.lock().get_mut(chat_user_id).and_then(|s| s.in_flight.take())
  }

  /// Give back a prompt claimed with [`take_in_flight`](Self::take_in_flight)
  /// whose answer could not be recorded. If another prompt went out in the
  /// meantime, the card is asked next instead.
  pub fn restore_in_flight(&self, chat_user_id: &str, pending: PendingPrompt) {
    let mut sessions = self.lock();
    let session = sessions.entry(chat_user_id.to_string()).or_default();
    if session.contains(pending.card_id) {
      return;
    }
    if session.in_flight.is_none() {
      session.in_flight = Some(pending);
    } else {
      session.queue.push_front(pending.card_id);
    }
  }

  pub fn queue_len(&self, chat_user_id: &str) -> usize {
    self.lock().get(chat_user_id).map_or(0, |s| s.queue.len())
  }

  /// Forget users with nothing queued and nothing in flight
  pub fn prune_idle(&self) -> usize {
    let mut sessions = self.lock();
    let before = sessions.len();
    sessions.retain(|_, session| !session.is_idle());
    before - sessions.len()
  }
}
