//! HTTP/1.1 message codec (RFC 9112).
pub mod chunked;
pub mod decoder;
pub mod encoder;
pub mod limits;

pub use chunked::{ChunkedDecoder, ChunkedEncoder, ChunkedEvent};
pub use decoder::{DecodedHead, Decoder, Role};
pub use encoder::{Encoder, HeadOut};
pub use limits::Limits;
