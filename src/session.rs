//! Per-process chat session: transcript plus connection state.

use tracing::info;

use crate::chain::{Chain, TurnReply};
use crate::connection::ConnectionParams;
use crate::database::{MySqlDatabase, SqlDatabase};
use crate::error::{ConnectError, TurnError};
use crate::message::{ChatHistory, Message};

pub enum ConnectionState {
    Disconnected,
    Connected(Box<dyn SqlDatabase>),
}

pub struct Session {
    history: ChatHistory,
    state: ConnectionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A disconnected session whose history holds the greeting.
    pub fn new() -> Self {
        Self {
            history: ChatHistory::with_greeting(),
            state: ConnectionState::Disconnected,
        }
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Open a MySQL handle. On failure the current state, including any
    /// earlier connection, is left as it was.
    pub async fn connect(
        &mut self,
        params: &ConnectionParams,
        sample_rows: u32,
    ) -> Result<(), ConnectError> {
        let db = MySqlDatabase::connect(params, sample_rows).await?;
        self.attach(Box::new(db));
        Ok(())
    }

    /// Move to `Connected` with an already-open handle, replacing any
    /// previous one.
    pub fn attach(&mut self, db: Box<dyn SqlDatabase>) {
        self.state = ConnectionState::Connected(db);
    }

    /// Run one turn. The question is recorded before the chain runs; the
    /// answer is recorded only if the whole chain succeeds.
    pub async fn handle_turn(
        &mut self,
        chain: &dyn Chain,
        question: &str,
    ) -> Result<TurnReply, TurnError> {
        let db = match &self.state {
            ConnectionState::Connected(db) => db.as_ref(),
            ConnectionState::Disconnected => return Err(TurnError::NotConnected),
        };

        self.history.push(Message::human(question));

        let reply = chain.run(db, &self.history, question).await?;

        info!(history_len = self.history.len() + 1, "turn complete");
        self.history.push(Message::ai(reply.answer.clone()));
        Ok(reply)
    }
}
