//! The daily-entry flow — the one meaningful state machine in the system.
//!
//! `Loading → (New | AskEdit) → Editing → Done`. `AskEdit` is entered only
//! when today's report already exists; `Done` is terminal and is reached
//! after a successful save or after declining to edit an existing report.

use serde::Serialize;
use thiserror::Error;

/// The minute pair a finished or pre-existing entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SavedEntry {
  pub bible_minutes:  u32,
  pub prayer_minutes: u32,
}

/// Current state of the daily-entry flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntryFlow {
  /// Today's report has not been looked up yet.
  Loading,
  /// No report exists for today; the form is blank.
  New,
  /// A report already exists; the user is asked whether to edit it.
  AskEdit { existing: SavedEntry },
  /// The form is open for input.
  Editing,
  /// Terminal display state.
  Done { entry: SavedEntry },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid entry-flow transition")]
pub struct InvalidTransition;

impl EntryFlow {
  /// `Loading → New` when no report exists today, `Loading → AskEdit`
  /// otherwise.
  pub fn loaded(self, existing: Option<SavedEntry>) -> Result<Self, InvalidTransition> {
    match self {
      EntryFlow::Loading => Ok(match existing {
        None        => EntryFlow::New,
        Some(entry) => EntryFlow::AskEdit { existing: entry },
      }),
      _ => Err(InvalidTransition),
    }
  }

  /// Open the form: directly from `New`, or by explicit choice from
  /// `AskEdit` or `Done`.
  pub fn edit(self) -> Result<Self, InvalidTransition> {
    match self {
      EntryFlow::New | EntryFlow::AskEdit { .. } | EntryFlow::Done { .. } => {
        Ok(EntryFlow::Editing)
      }
      _ => Err(InvalidTransition),
    }
  }

  /// Decline to edit the existing report; show it as-is.
  pub fn decline(self) -> Result<Self, InvalidTransition> {
    match self {
      EntryFlow::AskEdit { existing } => Ok(EntryFlow::Done { entry: existing }),
      _ => Err(InvalidTransition),
    }
  }

  /// A save succeeded while editing.
  pub fn saved(self, entry: SavedEntry) -> Result<Self, InvalidTransition> {
    match self {
      EntryFlow::Editing => Ok(EntryFlow::Done { entry }),
      _ => Err(InvalidTransition),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ENTRY: SavedEntry = SavedEntry { bible_minutes: 135, prayer_minutes: 45 };

  #[test]
  fn fresh_day_goes_straight_to_new() {
    let flow = EntryFlow::Loading.loaded(None).unwrap();
    assert_eq!(flow, EntryFlow::New);
    assert_eq!(flow.edit().unwrap(), EntryFlow::Editing);
  }

  #[test]
  fn existing_report_asks_before_editing() {
    let flow = EntryFlow::Loading.loaded(Some(ENTRY)).unwrap();
    assert_eq!(flow, EntryFlow::AskEdit { existing: ENTRY });
    assert_eq!(flow.edit().unwrap(), EntryFlow::Editing);
  }

  #[test]
  fn declining_shows_the_existing_entry() {
    let flow = EntryFlow::Loading.loaded(Some(ENTRY)).unwrap();
    assert_eq!(flow.decline().unwrap(), EntryFlow::Done { entry: ENTRY });
  }

  #[test]
  fn saving_finishes_and_done_can_reopen() {
    let done = EntryFlow::Editing.saved(ENTRY).unwrap();
    assert_eq!(done, EntryFlow::Done { entry: ENTRY });
    assert_eq!(done.edit().unwrap(), EntryFlow::Editing);
  }

  #[test]
  fn out_of_order_transitions_are_rejected() {
    assert!(EntryFlow::Loading.edit().is_err());
    assert!(EntryFlow::New.decline().is_err());
    assert!(EntryFlow::New.saved(ENTRY).is_err());
    assert!(EntryFlow::Editing.loaded(None).is_err());
    assert!(EntryFlow::Done { entry: ENTRY }.decline().is_err());
  }
}
