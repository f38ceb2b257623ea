//! Interactive connection form.

use console::style;
use dialoguer::{Input, Password};
use secrecy::{ExposeSecret, SecretString};

use crate::connection::ConnectionParams;

/// Ask for the five connection fields, pre-filled from `defaults`.
///
/// Nothing is validated here. An empty password keeps the default one.
pub fn prompt_connection(defaults: &ConnectionParams) -> dialoguer::Result<ConnectionParams> {
    println!();
    println!("  {}", style("MySQL Connection").bold());

    let host = text_field("Host", &defaults.host)?;
    let port = text_field("Port", &defaults.port)?;
    let user = text_field("User", &defaults.user)?;

    let password_prompt = if defaults.password.expose_secret().is_empty() {
        "Password".to_string()
    } else {
        "Password (empty keeps the configured one)".to_string()
    };
    let entered = Password::new()
        .with_prompt(password_prompt)
        .allow_empty_password(true)
        .interact()?;
    let password = if entered.is_empty() {
        defaults.password.clone()
    } else {
        SecretString::from(entered)
    };

    let database = text_field("Database", &defaults.database)?;

    Ok(ConnectionParams {
        host,
        port,
        user,
        password,
        database,
    })
}

fn text_field(label: &str, default: &str) -> dialoguer::Result<String> {
    let mut input = Input::<String>::new().with_prompt(label).allow_empty(true);
    if !default.is_empty() {
        input = input.default(default.to_string());
    }
    input.interact_text()
}
