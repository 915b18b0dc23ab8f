pub mod error;
pub mod keys;
pub mod types;

pub use error::{DacError, DacResult};
pub use keys::KeyCode;
pub use types::{
    BackendKind, BindingTarget, CaptureTarget, ChannelId, ChannelKind, ChannelStatus, ChannelTarget,
    MouseButton,
};
