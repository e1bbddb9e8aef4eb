use orgauth_core::config::AuthConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Authorization engine configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Organizations, clients and users seeded at startup
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Auth validation
        self.auth
            .validate()
            .map_err(|e| format!("auth config error: {e}"))?;
        // Bootstrap validation
        self.bootstrap.validate()
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Data seeded into the in-memory stores at startup.
///
/// ```toml
/// [[bootstrap.organizations]]
/// name = "acme"
///
/// [[bootstrap.organizations.applications]]
/// name = "Web"
/// client_id = "c1"
/// client_secret = "s1"
/// redirect_uris = ["https://app/cb"]
///
/// [[bootstrap.organizations.users]]
/// username = "alice"
/// email = "alice@example.com"
/// password = "change-me"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub organizations: Vec<OrganizationSeed>,
}

impl BootstrapConfig {
    fn validate(&self) -> Result<(), String> {
        let mut names = HashSet::new();
        for org in &self.organizations {
            if org.name.is_empty() {
                return Err("bootstrap.organizations[].name must not be empty".into());
            }
            if !names.insert(org.name.as_str()) {
                return Err(format!("bootstrap organization '{}' is defined twice", org.name));
            }
            let mut client_ids = HashSet::new();
            for app in &org.applications {
                if app.client_id.is_empty() {
                    return Err(format!(
                        "bootstrap organization '{}': client_id must not be empty",
                        org.name
                    ));
                }
                if !client_ids.insert(app.client_id.as_str()) {
                    return Err(format!(
                        "bootstrap organization '{}': client_id '{}' is defined twice",
                        org.name, app.client_id
                    ));
                }
            }
            for user in &org.users {
                if user.username.is_empty() {
                    return Err(format!(
                        "bootstrap organization '{}': username must not be empty",
                        org.name
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationSeed {
    pub name: String,
    #[serde(default)]
    pub applications: Vec<ApplicationSeed>,
    #[serde(default)]
    pub users: Vec<UserSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSeed {
    #[serde(default)]
    pub name: String,
    pub client_id: String,
    /// Plain text; hashed before it is stored.
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSeed {
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Plain text; hashed before it is stored.
    /// Prefer ORGAUTH__BOOTSTRAP__... env overrides over committing it.
    pub password: String,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("orgauth.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., ORGAUTH__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("ORGAUTH")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.addr().port(), 8080);
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().unwrap_err().contains("logging.level"));
    }

    #[test]
    fn test_rejects_duplicate_bootstrap_clients() {
        let mut cfg = AppConfig::default();
        let app = ApplicationSeed {
            name: "Web".into(),
            client_id: "c1".into(),
            client_secret: "s1".into(),
            redirect_uris: vec![],
        };
        cfg.bootstrap.organizations.push(OrganizationSeed {
            name: "acme".into(),
            applications: vec![app.clone(), app],
            users: vec![],
        });
        assert!(cfg.validate().unwrap_err().contains("defined twice"));
    }
}
