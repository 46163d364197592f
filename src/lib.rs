//! # HTTP/1.1 and WebSocket codecs
//!
//! This library provides non-blocking, allocation-frugal codecs for
//! HTTP/1.1 request/response messages and for WebSocket frames
//! ([RFC 6455]). It performs no I/O: callers own the sockets, buffering,
//! and timers, and feed byte buffers in and out of the codecs here.
//!
//! ## Layering
//!
//! - [`buf`] cursor and overflow-spool primitives shared by both codecs
//! - [`fields`] typed HTTP field-value converters
//! - [`headers`] case-insensitive, ordered header multimap
//! - [`http`] method/version/status and message head types
//! - [`h1`] the HTTP/1.1 message decoder and encoder
//! - [`ws`] the WebSocket frame decoder and encoder
//! - [`upgrade`] pluggable protocol-switch strategies (WebSocket shipped)
//! - [`engine`] pairs a decoder with an encoder for one connection
//!
//! [RFC 6455]: <https://www.rfc-editor.org/rfc/rfc6455>
#![warn(missing_debug_implementations)]

mod log;

pub mod buf;
pub mod error;
pub mod fields;
pub mod headers;
pub mod http;
pub mod result;

pub mod h1;
pub mod ws;

pub mod upgrade;
pub mod engine;

pub use error::{Error, ErrorKind};
pub use result::{CodecResult, DecoderResult};
