//! Ask questions about a MySQL database in plain language.
//!
//! Each turn asks a language model for SQL, runs it, and asks the model
//! again to phrase the result.

pub mod chain;
pub mod cli;
pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub mod llm;
pub mod message;
pub mod prompt;
pub mod session;
pub mod telemetry;
pub mod text_to_sql_chain;

pub use chain::{Chain, TurnReply};
pub use session::Session;
pub use text_to_sql_chain::{SqlGeneration, TextToSqlChain};
