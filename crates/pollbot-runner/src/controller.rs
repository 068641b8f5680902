//! Weekly poll state machine.
//!
//! One [`PollController::step`] per invocation: with no pending poll a new one
//! is created for the next event day whose evaluation day is still ahead; a
//! pending poll is closed and tallied on the evaluation day before its event
//! (or later, when a scheduled run was missed); otherwise nothing happens.
//! State is persisted after every step.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use pollbot_core::{
    evaluation_date, polling_date_for, Loaded, PersistentPollState, StateStore, StateStoreError,
    POLL_STATE_KEY, UPDATE_CURSOR_KEY,
};
use pollbot_telegram::{ChatGateway, GatewayError, PollAnswer, SentPoll, Update};

use crate::config::PollSettings;

/// Offset used when evaluating: the most recent 100 updates, regardless of
/// the stored update cursor.
pub const EVALUATION_UPDATE_OFFSET: i64 = -100;

/// One counted vote of a closed poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub voter: String,
    pub option: String,
}

impl Vote {
    pub fn line(&self) -> String {
        format!("User {} voted {}", self.voter, self.option)
    }
}

/// What a single [`PollController::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Created {
        polling_date: NaiveDate,
        sent: Option<SentPoll>,
    },
    Waiting {
        polling_date: NaiveDate,
        evaluation_date: NaiveDate,
    },
    Evaluated {
        polling_date: NaiveDate,
        votes: Vec<Vote>,
    },
}

/// Drives poll creation and evaluation against a [`ChatGateway`].
pub struct PollController<G> {
    settings: PollSettings,
    gateway: G,
    store: StateStore,
    state: PersistentPollState,
}

impl<G: ChatGateway> PollController<G> {
    /// Loads the persisted poll state, writing a fresh empty record when
    /// none exists or the stored one cannot be decoded.
    pub fn open(settings: PollSettings, gateway: G, store: StateStore) -> Result<Self> {
        let state = match store.load::<PersistentPollState>(POLL_STATE_KEY) {
            Ok(Loaded::Found(state)) => Some(state),
            Ok(Loaded::Absent) => None,
            Err(StateStoreError::Decode { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "stored poll state is unreadable, starting over"
                );
                None
            }
            Err(error) => return Err(error).context("failed to load poll state"),
        };
        let controller = Self {
            settings,
            gateway,
            store,
            state: state.clone().unwrap_or_default(),
        };
        if state.is_none() {
            controller.persist()?;
        }
        Ok(controller)
    }

    pub fn state(&self) -> &PersistentPollState {
        &self.state
    }

    /// Runs one transition for `today` and persists the resulting state.
    ///
    /// Tally lines of an evaluated poll are written to `out`.
    pub fn step<W: Write>(&mut self, today: NaiveDate, out: &mut W) -> Result<StepOutcome> {
        let outcome = match self.state.polling_date {
            None => self.create_poll(today)?,
            Some(polling_date) => {
                let evaluation_date = evaluation_date(polling_date);
                if today < evaluation_date {
                    tracing::info!(%polling_date, %evaluation_date, "nothing to evaluate yet");
                    StepOutcome::Waiting {
                        polling_date,
                        evaluation_date,
                    }
                } else {
                    if today > evaluation_date {
                        tracing::warn!(
                            %polling_date,
                            %evaluation_date,
                            "evaluation day was missed, evaluating now"
                        );
                    }
                    self.evaluate_poll(polling_date, out)?
                }
            }
        };
        self.persist()?;
        Ok(outcome)
    }

    /// Fetches updates since the stored cursor and advances the cursor to
    /// the last returned update. An empty batch leaves the cursor untouched.
    pub fn latest_updates(&self) -> Result<Vec<Update>> {
        let cursor = self
            .store
            .load_or_default::<Option<i64>>(UPDATE_CURSOR_KEY)
            .context("failed to load update cursor")?;
        let updates = swallow_transient(self.gateway.get_updates(cursor))?.unwrap_or_default();
        let Some(last) = updates.last() else {
            tracing::info!("no new updates");
            return Ok(updates);
        };
        self.store
            .save(UPDATE_CURSOR_KEY, &last.update_id)
            .context("failed to store update cursor")?;
        Ok(updates)
    }

    fn create_poll(&mut self, today: NaiveDate) -> Result<StepOutcome> {
        let polling_date = polling_date_for(today);
        tracing::info!(%polling_date, "creating new poll");
        let question = format!("{} {polling_date}", self.settings.question_prefix);
        let sent = swallow_transient(self.gateway.send_poll(
            &self.settings.group_id,
            &question,
            &self.settings.options,
        ))
        .context("failed to send poll")?;

        // A transiently failed send still records the date, leaving a pending
        // poll without identifiers until its evaluation day.
        self.state = PersistentPollState::pending(
            sent.as_ref().map(|poll| poll.message_id),
            sent.as_ref().map(|poll| poll.poll_id.clone()),
            polling_date,
        );
        Ok(StepOutcome::Created { polling_date, sent })
    }

    fn evaluate_poll<W: Write>(
        &mut self,
        polling_date: NaiveDate,
        out: &mut W,
    ) -> Result<StepOutcome> {
        tracing::info!(%polling_date, "evaluating poll");
        let (Some(message_id), Some(poll_id)) =
            (self.state.poll_message_id, self.state.poll_id.clone())
        else {
            tracing::warn!(
                %polling_date,
                "pending poll was never delivered, nothing to evaluate"
            );
            self.state = PersistentPollState::default();
            return Ok(StepOutcome::Evaluated {
                polling_date,
                votes: Vec::new(),
            });
        };

        self.gateway
            .stop_poll(&self.settings.group_id, message_id)
            .with_context(|| format!("failed to stop poll message {message_id}"))?;

        // The poll is closed from here on, so the evaluation has to complete.
        let updates = match self.gateway.get_updates(Some(EVALUATION_UPDATE_OFFSET)) {
            Ok(updates) => updates,
            Err(error) => {
                tracing::warn!(%error, "failed to fetch answers of stopped poll, tallying none");
                Vec::new()
            }
        };

        let mut votes = Vec::new();
        let mut latest_by_user = BTreeMap::new();
        for answer in updates
            .iter()
            .filter_map(|update| update.poll_answer.as_ref())
            .filter(|answer| answer.poll_id == poll_id)
        {
            if let Some(user) = &answer.user {
                latest_by_user.insert(user.id, answer.option_ids.first().copied());
            }
            let Some(vote) = self.vote_from(answer) else {
                continue;
            };
            writeln!(out, "{}", vote.line()).context("failed to write poll result")?;
            votes.push(vote);
        }

        if self.settings.announce_results {
            self.announce(polling_date, latest_by_user.values().flatten().copied());
        }

        self.state = PersistentPollState::default();
        Ok(StepOutcome::Evaluated {
            polling_date,
            votes,
        })
    }

    fn vote_from(&self, answer: &PollAnswer) -> Option<Vote> {
        let Some(&option_index) = answer.option_ids.first() else {
            tracing::debug!(poll_id = %answer.poll_id, "skipping retracted vote");
            return None;
        };
        let Some(option) = self.settings.options.get(option_index) else {
            tracing::warn!(option_index, "poll answer refers to an unknown option");
            return None;
        };
        let voter = answer
            .user
            .as_ref()
            .map(|user| user.display_name())
            .unwrap_or_else(|| "unknown".to_string());
        Some(Vote {
            voter,
            option: option.clone(),
        })
    }

    fn announce(&self, polling_date: NaiveDate, final_choices: impl Iterator<Item = usize>) {
        let mut counts = vec![0usize; self.settings.options.len()];
        for index in final_choices {
            if let Some(count) = counts.get_mut(index) {
                *count += 1;
            }
        }
        let total = counts.iter().sum::<usize>();
        let breakdown = self
            .settings
            .options
            .iter()
            .zip(&counts)
            .map(|(option, count)| format!("{option}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        let text = format!(
            "{} {polling_date}: {total} votes ({breakdown})",
            self.settings.question_prefix
        );
        if let Err(error) = self.gateway.send_message(&self.settings.group_id, &text) {
            tracing::warn!(%error, "failed to announce poll results");
        }
    }

    fn persist(&self) -> Result<()> {
        self.store
            .save(POLL_STATE_KEY, &self.state)
            .context("failed to store poll state")
    }
}

/// Maps a transient gateway failure to `None`; other failures propagate.
fn swallow_transient<T>(result: Result<T, GatewayError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) if error.is_transient() => {
            tracing::info!(%error, "caught transient chat gateway failure");
            Ok(None)
        }
        Err(error) => Err(anyhow!(error)),
    }
}
