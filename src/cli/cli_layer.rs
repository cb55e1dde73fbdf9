// CLI layer - argument parsing, environment settings and the run flow.

#[path = "args.rs"]
pub mod args;

#[path = "settings.rs"]
pub mod settings;

#[path = "run.rs"]
pub mod run;

pub use args::CliArgs;
pub use run::run;
