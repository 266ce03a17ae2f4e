//! In-memory student store.
//!
//! - [`student`]: Student record and its field validation
//! - [`registry`]: The keyed, insertion-ordered record store

pub mod registry;
pub mod student;
