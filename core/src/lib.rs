pub mod timers;

// Re-exports for convenience
pub use timers::{
    ContextSwitch, ContextTag, DefinitionError, OwnerKey, OwnerRef, TimerCallback, TimerConfig,
    TimerDefinition, TimerFn, TimerHandle, TimerOwner, TimerScheduler,
    load_definitions_from_dir, load_definitions_from_file,
};
