//! Student summaries generated by a local chat-completion server.
//!
//! - [`prompt`]: Prompt text built from a student record
//! - [`stream`]: Newline-delimited JSON decoding and fragment assembly
//! - [`client`]: The outbound request to the chat endpoint

pub mod client;
pub mod prompt;
pub mod stream;
