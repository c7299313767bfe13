pub mod release;
pub mod watermark;
pub mod message;

pub use release::{Category, ReleaseRecord};
pub use watermark::WatermarkState;
pub use message::{OutboundMessage, NEUTRAL_COLOR};
