//! Tick-driven timer scheduling
//!
//! This module provides:
//! - **Scheduler**: registers callbacks to fire after N seconds, optionally
//!   repeating, and fires everything due once per update cycle via `tick`
//! - **Handles**: generation-tagged identifiers safe to hold across frames
//! - **Definitions**: timer templates loaded from TOML config files
//!
//! # Model
//!
//! The clock is logical: it only advances when the host calls
//! [`TimerScheduler::tick`] with a delta. Callbacks may freely mutate the
//! timer set from inside a firing, including clearing or replacing their
//! own timer. Looping timers that fall behind catch up by firing once per
//! missed period in a single tick.
//!
//! Everything is single-threaded by design; cross-thread use is not
//! supported.

mod callback;
mod context;
mod definition;
mod error;
mod handle;
mod heap;
mod loader;
mod manager;
mod record;
mod slots;
mod tick;


pub use callback::{OwnerKey, OwnerRef, TimerCallback, TimerFn, TimerOwner};
pub use context::{ContextSwitch, ContextTag};
pub use definition::{TimerConfig, TimerDefinition};
pub use error::DefinitionError;
pub use handle::TimerHandle;
pub use loader::{load_definitions_from_dir, load_definitions_from_file};
pub use manager::TimerScheduler;
