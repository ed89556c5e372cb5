//! Background Tasks Module
//!
//! Long-running tasks spawned at startup.

mod sweeper;

pub use sweeper::spawn_sweeper_task;
