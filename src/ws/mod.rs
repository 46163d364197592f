//! WebSocket frame codec (RFC 6455).
pub mod close;
pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod mask;
pub mod utf8;

pub use close::{ClosingState, SharedClosingState};
pub use decoder::{AutoReply, Decoder, FrameResult};
pub use encoder::Encoder;
pub use frame::{FrameHead, OpCode};
