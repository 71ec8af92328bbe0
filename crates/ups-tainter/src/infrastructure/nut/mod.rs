//! Network UPS Tools client.
//!
//! Speaks just enough of the `upsd` line protocol to authenticate, enumerate
//! UPS devices and read their variables.

pub mod client;
pub mod error;
mod protocol;

pub use client::NutClient;
pub use client::DEFAULT_NUT_PORT;
pub use error::NutError;
