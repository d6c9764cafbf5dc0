//! The browser native-messaging host.
//!
//! This module provides:
//! - Length-prefixed stdio framing (`framing`)
//! - Browser message and response types (`message`)
//! - The relay loop that dials the vault per request (`bridge`)

pub mod bridge;
pub mod framing;
pub mod message;

pub use bridge::NativeHost;
pub use message::{NativeMessage, NativeRequest, NativeResponse};
