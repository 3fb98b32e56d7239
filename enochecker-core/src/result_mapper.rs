//! Outcome to result-code mapping
//!
//! First match wins:
//!
//! | condition                         | result           | message    |
//! |-----------------------------------|------------------|------------|
//! | task cancelled or deadline passed | `OFFLINE`        | null       |
//! | mumble                            | `MUMBLE`         | diagnostic |
//! | offline                           | `OFFLINE`        | diagnostic |
//! | any other error                   | `INTERNAL_ERROR` | null       |
//! | success                           | `OK`             | null       |

use crate::checker::CheckerOutcome;
use crate::error::{EnoError, EnoResult};
use crate::types::ResultMessage;

/// Map a finished operation to the message reported to the scheduler
///
/// Cancellation wins over everything, including success: a task that ran
/// past its deadline is reported as offline.
pub fn map_outcome(outcome: &EnoResult<CheckerOutcome>, cancelled: bool) -> ResultMessage {
    if cancelled {
        return ResultMessage::offline(None);
    }

    match outcome {
        Ok(CheckerOutcome::Mumble(message)) | Err(EnoError::Mumble { message }) => {
            ResultMessage::mumble(message.clone())
        }
        Ok(CheckerOutcome::Offline(message)) | Err(EnoError::Offline { message }) => {
            ResultMessage::offline(Some(message.clone()))
        }
        Err(_) => ResultMessage::internal_error(),
        Ok(CheckerOutcome::Success { attack_info }) => ResultMessage::ok(attack_info.clone()),
    }
}
