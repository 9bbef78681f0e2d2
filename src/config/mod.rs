use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub sites: SitesConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub min_connections: u32,
    pub max_connections: u32,
    /// Seconds to wait when opening or acquiring a connection
    pub connection_timeout: u64,
    /// Seconds an idle connection is kept before being closed
    pub idle_timeout: u64,
    /// Upper bound for a single database operation, in milliseconds
    pub query_timeout_ms: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    /// Number of issued bearer tokens remembered per user
    pub max_tokens_per_user: u32,
    pub password_reset_expiry_minutes: i64,
    pub bootstrap_admin_username: Option<String>,
    #[serde(skip_serializing)]
    pub bootstrap_admin_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitesConfig {
    pub known_sites: Vec<String>,
    pub default_maximum_pob: i32,
}

const DEFAULT_KNOWN_SITES: &[&str] = &[
    "Main Base",
    "Heliport",
    "Platform Alpha",
    "Platform Bravo",
    "Platform Charlie",
    "Drilling Rig",
];

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MIN_CONNECTIONS") {
            self.database.min_connections = v.parse().unwrap_or(self.database.min_connections);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_IDLE_TIMEOUT") {
            self.database.idle_timeout = v.parse().unwrap_or(self.database.idle_timeout);
        }
        if let Ok(v) = env::var("DATABASE_QUERY_TIMEOUT_MS") {
            self.database.query_timeout_ms = v.parse().unwrap_or(self.database.query_timeout_ms);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            if !v.trim().is_empty() {
                self.security.jwt_secret = v;
            }
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("SECURITY_MAX_TOKENS_PER_USER") {
            self.security.max_tokens_per_user = v.parse().unwrap_or(self.security.max_tokens_per_user);
        }
        if let Ok(v) = env::var("SECURITY_PASSWORD_RESET_EXPIRY_MINUTES") {
            self.security.password_reset_expiry_minutes =
                v.parse().unwrap_or(self.security.password_reset_expiry_minutes);
        }
        self.security.bootstrap_admin_username = non_empty_var("BOOTSTRAP_ADMIN_USERNAME");
        self.security.bootstrap_admin_password = non_empty_var("BOOTSTRAP_ADMIN_PASSWORD");

        // Site overrides
        if let Ok(v) = env::var("SITES_KNOWN") {
            let sites = split_list(&v);
            if !sites.is_empty() {
                self.sites.known_sites = sites;
            }
        }
        if let Ok(v) = env::var("SITES_DEFAULT_MAXIMUM_POB") {
            self.sites.default_maximum_pob = v
                .parse()
                .ok()
                .filter(|max: &i32| *max > 0)
                .unwrap_or(self.sites.default_maximum_pob);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                min_connections: 1,
                max_connections: 10,
                connection_timeout: 30,
                idle_timeout: 300,
                query_timeout_ms: 10_000,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                bcrypt_cost: 8,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                max_tokens_per_user: 10,
                password_reset_expiry_minutes: 60,
                bootstrap_admin_username: None,
                bootstrap_admin_password: None,
            },
            sites: SitesConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                min_connections: 2,
                max_connections: 20,
                connection_timeout: 10,
                idle_timeout: 300,
                query_timeout_ms: 5_000,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                cors_origins: vec!["https://staging.example.com".to_string()],
                max_tokens_per_user: 10,
                password_reset_expiry_minutes: 60,
                bootstrap_admin_username: None,
                bootstrap_admin_password: None,
            },
            sites: SitesConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                min_connections: 2,
                max_connections: 50,
                connection_timeout: 5,
                idle_timeout: 600,
                query_timeout_ms: 5_000,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                cors_origins: vec!["https://app.example.com".to_string()],
                max_tokens_per_user: 5,
                password_reset_expiry_minutes: 30,
                bootstrap_admin_username: None,
                bootstrap_admin_password: None,
            },
            sites: SitesConfig::default(),
        }
    }
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            known_sites: DEFAULT_KNOWN_SITES.iter().map(|s| s.to_string()).collect(),
            default_maximum_pob: 150,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

// Helper macros for common checks
#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.environment, Environment::Development);
        assert!(!config.security.jwt_secret.is_empty());
        assert!(config.database.run_migrations);
        assert_eq!(config.sites.default_maximum_pob, 150);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        // Production must be given a secret explicitly
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.database.run_migrations);
        assert!(config.database.min_connections <= config.database.max_connections);
    }

    #[test]
    fn split_list_trims_and_drops_empty_entries() {
        assert_eq!(
            split_list(" Heliport , ,Platform Alpha,"),
            vec!["Heliport".to_string(), "Platform Alpha".to_string()]
        );
    }

    #[test]
    fn known_sites_default_is_not_empty() {
        let sites = SitesConfig::default();
        assert!(sites.known_sites.contains(&"Main Base".to_string()));
        assert!(sites.default_maximum_pob > 0);
    }
}
