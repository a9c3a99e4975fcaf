//! The single-slot question/answer channel between the game task and the UI.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::PromptError;

/// Answer that backs out of a selection.
pub const CANCEL_OPTION: i64 = -1;

/// Shared handle to the pending-answer slot. The game task opens the slot and
/// awaits the receiver; the UI side resolves it through [`submit_answer`].
///
/// [`submit_answer`]: AnswerHandle::submit_answer
#[derive(Clone, Default)]
pub struct AnswerHandle {
    slot: Arc<Mutex<Option<oneshot::Sender<String>>>>,
}

impl AnswerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<oneshot::Sender<String>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens the slot. Fails while another question is still waiting.
    pub fn open(&self) -> Result<oneshot::Receiver<String>, PromptError> {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(PromptError::AlreadyPending);
        }
        let (tx, rx) = oneshot::channel();
        *slot = Some(tx);
        Ok(rx)
    }

    /// Resolves the pending question. Returns `false` when nothing is waiting.
    pub fn submit_answer(&self, value: impl Into<String>) -> bool {
        match self.slot().take() {
            Some(tx) => tx.send(value.into()).is_ok(),
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.slot().as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Drops the pending sender; the waiting side observes a cancellation.
    pub fn close(&self) {
        self.slot().take();
    }
}

/// Awaits an opened slot, mapping a dropped sender to a cancellation.
pub async fn wait_for_answer(rx: oneshot::Receiver<String>) -> Result<String, PromptError> {
    rx.await.map_err(|_| PromptError::Cancelled)
}

/// `Some(Some(i))` for a valid 0-based index, `Some(None)` for the cancel
/// sentinel, `None` for anything that should be asked again.
pub fn parse_option_answer(input: &str, option_count: usize) -> Option<Option<usize>> {
    let value: i64 = input.trim().parse().ok()?;
    if value == CANCEL_OPTION {
        return Some(None);
    }
    usize::try_from(value)
        .ok()
        .filter(|index| *index < option_count)
        .map(Some)
}

pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submitted_answer_reaches_the_waiter() {
        let handle = AnswerHandle::new();
        let rx = handle.open().unwrap();
        assert!(handle.has_pending());

        assert!(handle.submit_answer("2"));
        assert_eq!(wait_for_answer(rx).await, Ok("2".to_string()));
        assert!(!handle.has_pending());
    }

    #[test]
    fn submit_without_question_is_a_noop() {
        let handle = AnswerHandle::new();
        assert!(!handle.submit_answer("hello"));
    }

    #[test]
    fn second_open_is_rejected_while_pending() {
        let handle = AnswerHandle::new();
        let _rx = handle.open().unwrap();
        assert_eq!(handle.open().unwrap_err(), PromptError::AlreadyPending);
    }

    #[test]
    fn abandoned_slot_can_be_reopened() {
        let handle = AnswerHandle::new();
        drop(handle.open().unwrap());
        assert!(!handle.has_pending());
        assert!(handle.open().is_ok());
    }

    #[tokio::test]
    async fn close_cancels_the_waiter() {
        let handle = AnswerHandle::new();
        let rx = handle.open().unwrap();
        handle.close();
        assert_eq!(wait_for_answer(rx).await, Err(PromptError::Cancelled));
        assert!(!handle.submit_answer("late"));
    }

    #[test]
    fn option_answers() {
        assert_eq!(parse_option_answer("0", 3), Some(Some(0)));
        assert_eq!(parse_option_answer(" 2 ", 3), Some(Some(2)));
        assert_eq!(parse_option_answer("-1", 3), Some(None));
        assert_eq!(parse_option_answer("3", 3), None);
        assert_eq!(parse_option_answer("-2", 3), None);
        assert_eq!(parse_option_answer("two", 3), None);
        assert_eq!(parse_option_answer("", 3), None);
    }

    #[test]
    fn yes_no_answers() {
        assert_eq!(parse_yes_no("Y"), Some(true));
        assert_eq!(parse_yes_no("yes"), Some(true));
        assert_eq!(parse_yes_no(" n "), Some(false));
        assert_eq!(parse_yes_no("NO"), Some(false));
        assert_eq!(parse_yes_no("maybe"), None);
    }
}
