//! student-summary: in-memory student records with LLM-generated summaries.
//!
//! Serves CRUD over a process-local student store and relays a summary
//! prompt to a local Ollama chat endpoint, reassembling its streamed reply.

pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod summary;
