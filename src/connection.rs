//! Credentials entered in the connection form.

use secrecy::{ExposeSecret, SecretString};
use sqlx::mysql::MySqlConnectOptions;

use crate::error::ConnectError;

/// The five connection fields, exactly as typed. Nothing is checked until
/// [`ConnectionParams::connect_options`] runs at connect time.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: SecretString,
    pub database: String,
}

impl ConnectionParams {
    pub fn connect_options(&self) -> Result<MySqlConnectOptions, ConnectError> {
        let port: u16 = self
            .port
            .trim()
            .parse()
            .map_err(|_| ConnectError::InvalidPort(self.port.clone()))?;

        let mut options = MySqlConnectOptions::new()
            .host(self.host.trim())
            .port(port)
            .username(&self.user);

        let database = self.database.trim();
        if !database.is_empty() {
            options = options.database(database);
        }
        let password = self.password.expose_secret();
        if !password.is_empty() {
            options = options.password(password);
        }
        Ok(options)
    }

    /// `mysql://user@host:port/database`, safe to log.
    pub fn redacted_url(&self) -> String {
        format!(
            "mysql://{}@{}:{}/{}",
            self.user,
            self.host.trim(),
            self.port.trim(),
            self.database.trim()
        )
    }
}
