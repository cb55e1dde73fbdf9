// The infra module contains implementations of core traits.
// Each external system gets its own submodule.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "google_drive/mod.rs"]
pub mod google_drive;

#[path = "converters/mod.rs"]
pub mod converters;

#[path = "speech/mod.rs"]
pub mod speech;

#[path = "browser.rs"]
pub mod browser;
