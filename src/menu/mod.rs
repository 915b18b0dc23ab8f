pub mod commands;
pub mod console;
pub mod layout;

pub use commands::{PanelCommand, binding_from_key, channel_from_key, term_to_key};
pub use console::{ControlPanel, Flow, PANEL_TICK};
pub use layout::{Align, BoxDrawing, DoubleBox, DoubleMenu, MenuBuilder, SingleBox, SingleMenu};
