//! Weekly poll automation: configuration, the poll state machine, and the
//! single-run entry point used by the `pollbot` binary.

mod bootstrap_helpers;
pub mod config;
pub mod controller;

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pollbot_core::StateStore;
use pollbot_telegram::TelegramGateway;

pub use bootstrap_helpers::init_tracing;
pub use config::{ConfigError, PollBotConfig, PollSettings};
pub use controller::{PollController, StepOutcome, Vote, EVALUATION_UPDATE_OFFSET};

/// Performs one scheduled invocation for `today` against the Telegram API.
pub fn run_once<W: Write>(
    config: &PollBotConfig,
    today: NaiveDate,
    out: &mut W,
) -> Result<StepOutcome> {
    let gateway = TelegramGateway::new(config.gateway_config())
        .context("failed to initialize telegram gateway")?;
    let store = StateStore::new(config.state_dir.clone());
    let mut controller = PollController::open(config.poll.clone(), gateway, store)?;
    controller.step(today, out)
}
