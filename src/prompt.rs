//! Prompt templates for the two completion calls of a turn.

use crate::message::ChatHistory;

/// Sampling temperature for SQL generation. Fixed so that repeated turns
/// over the same schema and history produce the same query.
pub const SQL_TEMPERATURE: f32 = 0.0;

/// Sampling temperature for the natural-language explanation.
pub const EXPLAIN_TEMPERATURE: f32 = 0.5;

pub fn sql_prompt(schema: &str, history: &ChatHistory, question: &str) -> String {
    format!(
        "You are an AI data analyst writing MySQL queries. Based on the schema and the \
conversation so far, write a single SQL query that answers the user's question.

Here is the context:

Schema:
{schema}

Chat History:
{history}

Question: {question}

Only return SQL query, no explanation or formatting.",
        history = history.render_for_prompt(),
    )
}

pub fn explain_prompt(schema: &str, question: &str, sql: &str, result: &str) -> String {
    format!(
        "You are an AI data analyst. Based on the schema, SQL query, and the SQL result, \
explain the result in a simple and clear way.

If the result includes several rows (like items with prices, names, etc.), present them as a \
clean Markdown table with column headers.

If the result is a number, summary, or count, then just respond with a clear sentence.

Schema:
{schema}

User Question:
{question}

SQL Query:
{sql}

SQL Result:
{result}

Give only a helpful, natural language response."
    )
}
