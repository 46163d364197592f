//! HTTP message primitives: method, version, status code, and the
//! request/response start-line-plus-headers structs the `h1` codec
//! produces and consumes.
mod message;
mod method;
mod status;
mod version;

pub use message::{RequestHead, ResponseHead};
pub use method::Method;
pub use status::StatusCode;
pub use version::Version;
