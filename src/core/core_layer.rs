// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "pipeline/mod.rs"]
pub mod pipeline;

#[path = "drive/mod.rs"]
pub mod drive;

#[path = "speech/mod.rs"]
pub mod speech;

#[path = "presentation/mod.rs"]
pub mod presentation;
