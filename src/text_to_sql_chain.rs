use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::chain::{Chain, TurnReply};
use crate::database::SqlDatabase;
use crate::error::TurnError;
use crate::llm::{CompletionClient, CompletionRequest};
use crate::message::ChatHistory;
use crate::prompt::{explain_prompt, sql_prompt, EXPLAIN_TEMPERATURE, SQL_TEMPERATURE};

/// Prefix of the text form of a failed generation. It is a SQL comment so
/// it can never be mistaken for an executable statement.
pub const ERROR_SENTINEL: &str = "-- ERROR generating SQL";

/// Outcome of asking the model for SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlGeneration {
    Generated(String),
    Failed(String),
}

impl SqlGeneration {
    pub fn is_generated(&self) -> bool {
        matches!(self, SqlGeneration::Generated(_))
    }
}

impl fmt::Display for SqlGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlGeneration::Generated(sql) => write!(f, "{sql}"),
            SqlGeneration::Failed(reason) => write!(f, "{ERROR_SENTINEL}: {reason}"),
        }
    }
}

/// Text-to-SQL over a completion backend: generate, execute, explain.
pub struct TextToSqlChain {
    client: Box<dyn CompletionClient>,
    max_tokens: u32,
}

impl TextToSqlChain {
    pub fn new(client: Box<dyn CompletionClient>, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Ask the model for a query. Never fails; errors become
    /// [`SqlGeneration::Failed`].
    pub async fn generate_sql(
        &self,
        schema: &str,
        history: &ChatHistory,
        question: &str,
    ) -> SqlGeneration {
        let request = CompletionRequest {
            prompt: sql_prompt(schema, history, question),
            temperature: SQL_TEMPERATURE,
            max_tokens: self.max_tokens,
        };

        debug!(prompt = %request.prompt, "generating SQL");

        match self.client.complete(&request).await {
            Ok(sql) if sql.trim().is_empty() => {
                SqlGeneration::Failed("model returned an empty response".to_string())
            }
            Ok(sql) => SqlGeneration::Generated(sql.trim().to_string()),
            Err(e) => {
                warn!(error = %e, "SQL generation failed");
                SqlGeneration::Failed(e.to_string())
            }
        }
    }

    /// Phrase the result for the user. Errors become an apology.
    pub async fn explain(&self, schema: &str, question: &str, sql: &str, result: &str) -> String {
        let request = CompletionRequest {
            prompt: explain_prompt(schema, question, sql, result),
            temperature: EXPLAIN_TEMPERATURE,
            max_tokens: self.max_tokens,
        };

        match self.client.complete(&request).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "explanation failed");
                format!("Sorry, couldn't explain the result due to: {e}")
            }
        }
    }
}

#[async_trait]
impl Chain for TextToSqlChain {
    async fn run(
        &self,
        db: &dyn SqlDatabase,
        history: &ChatHistory,
        question: &str,
    ) -> Result<TurnReply, TurnError> {
        let schema = db.table_info().await.map_err(TurnError::Schema)?;

        let sql = match self.generate_sql(&schema, history, question).await {
            SqlGeneration::Generated(sql) => sql,
            SqlGeneration::Failed(reason) => return Err(TurnError::Generation(reason)),
        };

        info!(sql = %sql, "executing generated SQL");

        let result = match db.run(&sql).await {
            Ok(result) => result,
            Err(source) => return Err(TurnError::Execution { sql, source }),
        };

        let answer = self.explain(&schema, question, &sql, &result).await;

        Ok(TurnReply { answer, sql })
    }
}
