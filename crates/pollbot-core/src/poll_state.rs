use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// State key of the pending poll record.
pub const POLL_STATE_KEY: &str = "poll-state";
/// State key of the last-seen update id.
pub const UPDATE_CURSOR_KEY: &str = "update-cursor";

/// The poll currently awaiting evaluation, if any.
///
/// All fields are `None` when no poll is pending. A failed creation leaves only
/// `polling_date` set; see [`PersistentPollState::is_pending`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistentPollState {
    #[serde(default)]
    pub poll_message_id: Option<i64>,
    #[serde(default)]
    pub poll_id: Option<String>,
    #[serde(default)]
    pub polling_date: Option<NaiveDate>,
}

impl PersistentPollState {
    /// Record of a poll created for `polling_date`. Identifiers are `None`
    /// when the poll could not be delivered.
    pub fn pending(
        poll_message_id: Option<i64>,
        poll_id: Option<String>,
        polling_date: NaiveDate,
    ) -> Self {
        Self {
            poll_message_id,
            poll_id,
            polling_date: Some(polling_date),
        }
    }

    /// A poll counts as pending once its date is recorded, even when the
    /// identifiers are missing because creation failed.
    pub fn is_pending(&self) -> bool {
        self.polling_date.is_some()
    }

    /// True when no field is set, i.e. the state after a reset.
    pub fn is_empty(&self) -> bool {
        self.poll_message_id.is_none() && self.poll_id.is_none() && self.polling_date.is_none()
    }
}
