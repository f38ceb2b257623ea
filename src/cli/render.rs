//! Transcript rendering. Answers are Markdown (the explainer may produce
//! tables), so they go through `termimad`.

use console::style;
use termimad::MadSkin;

use crate::chain::TurnReply;
use crate::message::{ChatHistory, Message, Role};

pub struct Renderer {
    skin: MadSkin,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        let mut skin = MadSkin::default();
        skin.inline_code
            .set_fg(termimad::crossterm::style::Color::Yellow);
        Self { skin }
    }

    pub fn print_banner(&self, provider: &str, model: &str) {
        println!();
        println!("  {}", style("Chat with MySQL").cyan().bold());
        println!("  {}  {} ({})", style("Model:").bold(), style(model).dim(), provider);
        println!();
        println!("  {}", style("Type /help for commands, /exit to leave").dim());
        println!("  {}", style("---").dim());
    }

    pub fn print_history(&self, history: &ChatHistory) {
        for message in history.iter() {
            self.print_message(message);
        }
    }

    pub fn print_message(&self, message: &Message) {
        let label = match message.role() {
            Role::Human => style(message.role().to_string()).green().bold(),
            Role::Ai => style(message.role().to_string()).cyan().bold(),
        };
        println!();
        println!("{label}");
        print!("{}", self.skin.term_text(message.content()));
    }

    pub fn print_reply(&self, reply: &TurnReply) {
        println!();
        println!("{}", style("AI").cyan().bold());
        print!("{}", self.skin.term_text(&reply.answer));
        println!("{}", style(format!("SQL Used: `{}`", reply.sql)).dim());
    }

    pub fn print_success(&self, text: &str) {
        println!("{}", style(text).green());
    }

    pub fn print_error(&self, text: &str) {
        eprintln!("{}", style(text).red());
    }
}
