pub mod logging;
pub mod queue;
pub mod runner;

pub use logging::init_logging;
pub use queue::{UiEvent, UiReceiver, UiSender, ui_queue};
pub use runner::DacApp;
