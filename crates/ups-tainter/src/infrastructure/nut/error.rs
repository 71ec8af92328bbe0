//! Error types for the NUT client.

use core::error::Error;

use derive_more::Display;

/// Errors that can occur while talking to a NUT server.
#[derive(Debug, Display)]
pub enum NutError {
    /// The server could not be reached
    #[display("Failed to connect to NUT server at {address}")]
    Connect { address: String },

    /// Reading from or writing to the connection failed
    #[display("NUT connection error: {message}")]
    Io { message: String },

    /// The server did not answer in time
    #[display("NUT request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The server answered with something unexpected
    #[display("Unexpected NUT response: {message}")]
    Protocol { message: String },

    /// The server answered `ERR <code>`
    #[display("NUT server error: {code}")]
    Server { code: String },
}

impl Error for NutError {}
