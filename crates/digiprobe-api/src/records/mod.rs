// Session/result store client
//
// Thin client for a PostgREST-style store holding one `test_sessions` row
// per configured test and one `test_results` row per completed run.

pub mod client;
pub mod models;

pub use client::RecordsClient;
pub use models::{NewResult, NewSession, ResultRow, SessionRow};
