//! Handles settings for the application. Configuration is written in
//! `settings.toml`; any key can be overridden with a `HAMTDAA_` prefixed
//! environment variable, e.g. `HAMTDAA_SERVER__PORT=8080`.
//!
//! See `settings.toml` for the configuration.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    /// bcrypt cost for new passwords; the engine default when absent.
    pub password_cost: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .add_source(
                Environment::with_prefix("HAMTDAA")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn sqlite_database_is_a_path() {
        let settings = parse(
            r#"
            [app]
            level = "info"

            [server]
            port = 3000
            database = { sqlite = "hamtdaa.db" }
            "#,
        );
        let server = settings.server.unwrap();
        assert!(matches!(server.database, Database::Sqlite(ref p) if p == "hamtdaa.db"));
        assert_eq!(server.bind, None);
    }

    #[test]
    fn memory_database_and_no_server() {
        let settings = parse(
            r#"
            [app]
            level = "debug"
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert!(settings.server.is_none());

        let settings = parse(
            r#"
            [app]
            level = "debug"
            [server]
            port = 1
            database = "memory"
            "#,
        );
        assert!(matches!(settings.server.unwrap().database, Database::Memory));
    }
}
