pub mod clock;
pub mod manager;

#[cfg(test)]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use manager::ThreadManager;
