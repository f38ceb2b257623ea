use async_trait::async_trait;

use crate::database::SqlDatabase;
use crate::error::TurnError;
use crate::message::ChatHistory;

/// What a completed turn shows the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub answer: String,
    pub sql: String,
}

/// One question → answer pipeline over a database handle.
///
/// `history` already ends with the question being asked.
#[async_trait]
pub trait Chain: Send + Sync {
    async fn run(
        &self,
        db: &dyn SqlDatabase,
        history: &ChatHistory,
        question: &str,
    ) -> Result<TurnReply, TurnError>;
}
