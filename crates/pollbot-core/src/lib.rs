//! Foundational building blocks shared across pollbot crates.
//!
//! Provides the keyed JSON state store with atomic writes, the persisted poll
//! record, and weekday arithmetic used to schedule poll creation and
//! evaluation.

pub mod atomic_io;
pub mod dates;
pub mod poll_state;
pub mod state_store;

pub use atomic_io::write_text_atomic;
pub use dates::{
    evaluation_date, next_occurrence_of_weekday, polling_date_for, previous_occurrence_of_weekday,
    today, EVALUATION_WEEKDAY, EVENT_WEEKDAY,
};
pub use poll_state::{PersistentPollState, POLL_STATE_KEY, UPDATE_CURSOR_KEY};
pub use state_store::{Loaded, StateStore, StateStoreError, StateStoreResult};
