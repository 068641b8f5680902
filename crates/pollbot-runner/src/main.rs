use anyhow::Result;
use pollbot_core::today;
use pollbot_runner::{init_tracing, run_once, PollBotConfig};

fn main() -> Result<()> {
    let config = PollBotConfig::from_env()?;
    init_tracing();
    tracing::debug!(?config, "configuration loaded");
    let mut stdout = std::io::stdout().lock();
    run_once(&config, today(), &mut stdout)?;
    Ok(())
}
