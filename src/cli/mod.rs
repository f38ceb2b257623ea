//! Interactive chat loop.

pub mod commands;
pub mod form;
pub mod render;

use std::io::{stdin, stdout, Write};

use tracing::info;

use crate::config::AppConfig;
use crate::connection::ConnectionParams;
use crate::session::Session;
use crate::text_to_sql_chain::TextToSqlChain;

use self::commands::ChatCommand;
use self::render::Renderer;

/// Run the session until `/exit` or end of input.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let chain = TextToSqlChain::new(config.completion_client(), config.max_tokens);
    let renderer = Renderer::new();
    let mut session = Session::new();
    let mut last_params = config.connection_defaults.clone();

    renderer.print_banner(config.provider_name(), chain.model());
    renderer.print_history(session.history());

    connect(
        &mut session,
        &renderer,
        &mut last_params,
        config.sample_rows,
        form::prompt_connection,
    )
    .await;

    while let Some(line) = read_question()? {
        if line.is_empty() {
            continue;
        }

        if let Some(command) = commands::parse(&line) {
            match command {
                ChatCommand::Connect => {
                    connect(
                        &mut session,
                        &renderer,
                        &mut last_params,
                        config.sample_rows,
                        form::prompt_connection,
                    )
                    .await;
                }
                ChatCommand::History => renderer.print_history(session.history()),
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Exit => break,
                ChatCommand::Unknown(cmd) => {
                    renderer.print_error(&format!("Unknown command {cmd}; try /help"))
                }
            }
            continue;
        }

        match session.handle_turn(&chain, &line).await {
            Ok(reply) => renderer.print_reply(&reply),
            Err(e) => renderer.print_error(&format!("Error processing: {e}")),
        }
    }

    info!(messages = session.history().len(), "session ended");
    Ok(())
}

/// Show the connection form and try to connect. Any failure, including
/// the form itself, is reported and leaves the session as it was. Returns
/// whether a new handle was attached.
async fn connect<F>(
    session: &mut Session,
    renderer: &Renderer,
    last_params: &mut ConnectionParams,
    sample_rows: u32,
    prompt: F,
) -> bool
where
    F: FnOnce(&ConnectionParams) -> dialoguer::Result<ConnectionParams>,
{
    let params = match prompt(last_params) {
        Ok(params) => params,
        Err(e) => {
            renderer.print_error(&format!("Connection failed: {e}"));
            return false;
        }
    };

    println!("Connecting...");
    let connected = match session.connect(&params, sample_rows).await {
        Ok(()) => {
            renderer.print_success("Connected!");
            true
        }
        Err(e) => {
            renderer.print_error(&format!("Connection failed: {e}"));
            false
        }
    };

    *last_params = params;
    connected
}

/// Read one line of input. `None` at end of input.
fn read_question() -> std::io::Result<Option<String>> {
    print!("\nAsk a question about your database: ");
    stdout().flush()?;

    let mut input = String::new();
    if stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}
