//! HTTP server for the student records API.
//!
//! - [`student_api`]: Router, shared state and route handlers

pub mod student_api;
