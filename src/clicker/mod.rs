pub mod controller;
pub mod scheduler;

pub use controller::{ChannelSnapshot, ToggleController};
pub use scheduler::Scheduler;
