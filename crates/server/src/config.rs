use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    /// Account created at startup when no administrator exists
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub institute: InstituteSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Institute-wide settings shown on the settings page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstituteSettings {
    pub institute_name: String,
    pub institute_code: String,
    pub academic_year: String,
    pub current_semester: i32,
    pub nba_threshold: f64,
    pub co_attainment_threshold: f64,
    pub po_attainment_threshold: f64,
    pub email_notifications: bool,
    pub mark_entry_reminders: bool,
    pub nba_compliance_alerts: bool,
    pub session_timeout: u32,
    pub password_policy: String,
    pub two_factor_auth: bool,
    pub backup_frequency: String,
    pub maintenance_mode: bool,
    pub debug_mode: bool,
}

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 20,
            run_migrations: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_days: 7,
        }
    }
}

impl Default for InstituteSettings {
    fn default() -> Self {
        Self {
            institute_name: "College of Engineering".to_string(),
            institute_code: "COE".to_string(),
            academic_year: "2023-24".to_string(),
            current_semester: 3,
            nba_threshold: models::analytics::DEFAULT_NBA_THRESHOLD,
            co_attainment_threshold: 60.0,
            po_attainment_threshold: 50.0,
            email_notifications: true,
            mark_entry_reminders: true,
            nba_compliance_alerts: true,
            session_timeout: 30,
            password_policy: "medium".to_string(),
            two_factor_auth: false,
            backup_frequency: "daily".to_string(),
            maintenance_mode: false,
            debug_mode: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, `portal.toml` and `PORTAL__*` variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        config = config.add_source(config::File::with_name("portal").required(false));

        // e.g. PORTAL__DATABASE__MAX_CONNECTIONS=10
        config = config.add_source(
            config::Environment::with_prefix("PORTAL")
                .prefix_separator("__")
                .separator("__"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Get the database URL from config or environment
    pub fn database_url(&self) -> anyhow::Result<String> {
        if let Some(url) = &self.database.url {
            return Ok(url.clone());
        }

        std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("database.url or DATABASE_URL must be set"))
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert_eq!(config.auth.token_ttl_days, 7);
        assert!(config.database.run_migrations);
        assert!(config.bootstrap_admin.is_none());
        assert_eq!(config.institute.nba_threshold, 52.0);
    }

    #[test]
    fn test_explicit_database_url_wins() {
        let mut config = AppConfig::default();
        config.database.url = Some("postgres://localhost/portal".to_string());
        assert_eq!(
            config.database_url().unwrap(),
            "postgres://localhost/portal"
        );
    }
}
