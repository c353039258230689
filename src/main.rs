// Entrypoint for the CLI application.
// - Resolve configuration from the environment, set up logging, then hand
//   over to the interactive loop, which blocks until the user quits.

use anyhow::Context;
use curl_assistant::{config::Config, logging::init_logging, ui::interactive_mode};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_logging(&config.log_level);

    interactive_mode(config)?;
    Ok(())
}
