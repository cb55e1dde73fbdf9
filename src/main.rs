// This is the entry point of the archaeology agent.
//
// **Architecture Overview:**
// - `core/` = Business logic (pipeline stages, drive selection, speech, slides)
// - `infra/` = Implementations of core traits (model APIs, Google Drive, TTS, converters)
// - `cli/` = Command line adapter (flags, environment, the run flow)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize logging
// 3. Hand control to the CLI layer

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "cli/cli_layer.rs"]
mod cli;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use clap::Parser;
use cli::CliArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let args = CliArgs::parse();

    cli::run(args).await
}
