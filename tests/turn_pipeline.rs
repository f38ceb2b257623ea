use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mysql_chat::database::SqlDatabase;
use mysql_chat::error::{DbError, TurnError};
use mysql_chat::llm::{CompletionClient, CompletionRequest, LlmError, OpenAiClient};
use mysql_chat::message::Role;
use mysql_chat::{Session, TextToSqlChain};

const ITEMS_SCHEMA: &str = "CREATE TABLE items(name, price)";
const CHEAPEST_SQL: &str = "SELECT name, price FROM items ORDER BY price ASC LIMIT 1";

/// Database with a single `items` table. Records every statement it runs.
#[derive(Clone, Default)]
struct ItemsDb {
    executed: Arc<Mutex<Vec<String>>>,
    fail_with: Option<&'static str>,
}

#[async_trait]
impl SqlDatabase for ItemsDb {
    async fn table_info(&self) -> Result<String, DbError> {
        Ok(ITEMS_SCHEMA.to_string())
    }

    async fn run(&self, sql: &str) -> Result<String, DbError> {
        self.executed.lock().unwrap().push(sql.to_string());
        match self.fail_with {
            Some(message) => Err(DbError::Other(message.to_string())),
            None => Ok("{ name: Pear, price: 0.90 }".to_string()),
        }
    }
}

/// Stands in for the hosted model: writes the cheapest-item query for SQL
/// prompts and turns the result row into a sentence for explanation prompts.
#[derive(Clone, Default)]
struct FakeAnalyst {
    prompts: Arc<Mutex<Vec<CompletionRequest>>>,
    fail_sql: bool,
    fail_explain: bool,
}

impl FakeAnalyst {
    fn explain(prompt: &str) -> String {
        let row = prompt
            .split("SQL Result:\n")
            .nth(1)
            .and_then(|rest| rest.lines().next())
            .unwrap_or_default();
        let fields: Vec<&str> = row
            .trim_matches(|c| c == '{' || c == '}' || c == ' ')
            .split(", ")
            .filter_map(|pair| pair.split(": ").nth(1))
            .collect();
        format!("The cheapest item is {}, priced at {}.", fields[0], fields[1])
    }
}

#[async_trait]
impl CompletionClient for FakeAnalyst {
    fn model(&self) -> &str {
        "fake-analyst"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(request.clone());

        if request.prompt.contains("Only return SQL query") {
            if self.fail_sql {
                return Err(LlmError::Status {
                    status: 500,
                    message: "upstream unavailable".into(),
                });
            }
            Ok(format!("\n{CHEAPEST_SQL}\n"))
        } else {
            if self.fail_explain {
                return Err(LlmError::EmptyResponse);
            }
            Ok(Self::explain(&request.prompt))
        }
    }
}

fn connected_session(db: &ItemsDb) -> Session {
    let mut session = Session::new();
    session.attach(Box::new(db.clone()));
    session
}

#[tokio::test]
async fn cheapest_item_end_to_end() {
    let db = ItemsDb::default();
    let model = FakeAnalyst::default();
    let chain = TextToSqlChain::new(Box::new(model.clone()), 500);
    let mut session = connected_session(&db);

    let reply = session
        .handle_turn(&chain, "What is the cheapest item?")
        .await
        .unwrap();

    assert!(reply.sql.starts_with("SELECT"));
    assert!(reply.sql.contains("ORDER BY price"));
    assert!(reply.sql.ends_with("LIMIT 1"));
    assert_eq!(*db.executed.lock().unwrap(), vec![CHEAPEST_SQL.to_string()]);
    assert_eq!(reply.answer, "The cheapest item is Pear, priced at 0.90.");

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].temperature, 0.0);
    assert!(prompts[0].prompt.contains(ITEMS_SCHEMA));
    assert!(prompts[1].prompt.contains(&format!("SQL Query:\n{CHEAPEST_SQL}\n")));
    assert!(prompts[1].temperature > 0.0);

    let transcript: Vec<(Role, &str)> = session
        .history()
        .iter()
        .map(|m| (m.role(), m.content()))
        .collect();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1], (Role::Human, "What is the cheapest item?"));
    assert_eq!(transcript[2], (Role::Ai, "The cheapest item is Pear, priced at 0.90."));
}

#[tokio::test]
async fn question_without_connection_is_rejected_gracefully() {
    let model = FakeAnalyst::default();
    let chain = TextToSqlChain::new(Box::new(model.clone()), 500);
    let mut session = Session::new();

    let err = session
        .handle_turn(&chain, "What is the cheapest item?")
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::NotConnected));
    assert_eq!(session.history().len(), 1);
    assert!(model.prompts.lock().unwrap().is_empty());

    // The session stays usable once a handle is attached.
    session.attach(Box::new(ItemsDb::default()));
    assert!(session.handle_turn(&chain, "What is the cheapest item?").await.is_ok());
}

#[tokio::test]
async fn execution_failure_does_not_record_an_answer() {
    let db = ItemsDb {
        fail_with: Some("Table 'shop.items' doesn't exist"),
        ..ItemsDb::default()
    };
    let model = FakeAnalyst::default();
    let chain = TextToSqlChain::new(Box::new(model.clone()), 500);
    let mut session = connected_session(&db);

    let err = session
        .handle_turn(&chain, "What is the cheapest item?")
        .await
        .unwrap_err();

    match err {
        TurnError::Execution { sql, source } => {
            assert_eq!(sql, CHEAPEST_SQL);
            assert!(source.to_string().contains("doesn't exist"));
        }
        other => panic!("expected execution error, got {other:?}"),
    }
    assert_eq!(session.history().last().unwrap().role(), Role::Human);
    // Only the SQL prompt was sent; no explanation was attempted.
    assert_eq!(model.prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn generation_failure_never_executes_anything() {
    let db = ItemsDb::default();
    let model = FakeAnalyst {
        fail_sql: true,
        ..FakeAnalyst::default()
    };
    let chain = TextToSqlChain::new(Box::new(model), 500);
    let mut session = connected_session(&db);

    let err = session.handle_turn(&chain, "anything").await.unwrap_err();

    assert!(matches!(err, TurnError::Generation(ref reason) if reason.contains("upstream unavailable")));
    assert!(db.executed.lock().unwrap().is_empty());
    assert_eq!(session.history().last().unwrap().role(), Role::Human);
}

#[tokio::test]
async fn explanation_failure_answers_with_apology() {
    let db = ItemsDb::default();
    let model = FakeAnalyst {
        fail_explain: true,
        ..FakeAnalyst::default()
    };
    let chain = TextToSqlChain::new(Box::new(model), 500);
    let mut session = connected_session(&db);

    let reply = session
        .handle_turn(&chain, "What is the cheapest item?")
        .await
        .unwrap();

    assert!(reply.answer.starts_with("Sorry, couldn't explain the result due to:"));
    assert_eq!(reply.sql, CHEAPEST_SQL);
    assert_eq!(session.history().last().unwrap().content(), reply.answer);
}

#[tokio::test]
async fn earlier_turns_are_replayed_into_sql_prompt() {
    let db = ItemsDb::default();
    let model = FakeAnalyst::default();
    let chain = TextToSqlChain::new(Box::new(model.clone()), 500);
    let mut session = connected_session(&db);

    session.handle_turn(&chain, "What is the cheapest item?").await.unwrap();
    session.handle_turn(&chain, "And the most expensive?").await.unwrap();

    let prompts = model.prompts.lock().unwrap();
    let second_sql_prompt = &prompts[2].prompt;
    let expected = "User: What is the cheapest item?\n\
                    AI: The cheapest item is Pear, priced at 0.90.\n\
                    User: And the most expensive?";
    assert!(second_sql_prompt.contains(expected));
}

#[tokio::test]
async fn missing_api_key_surfaces_as_generation_failure() {
    let db = ItemsDb::default();
    let client = OpenAiClient::new(None, "http://127.0.0.1:1/v1", "gpt-3.5-turbo");
    let chain = TextToSqlChain::new(Box::new(client), 500);
    let mut session = connected_session(&db);

    let err = session.handle_turn(&chain, "How many items?").await.unwrap_err();

    assert!(matches!(err, TurnError::Generation(ref reason) if reason.contains("OPENAI_API_KEY")));
    assert!(db.executed.lock().unwrap().is_empty());
}
