use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::account::errors::AuthError;
use crate::domain::account::seed::AdminSeed;
use crate::domain::account::service::AuthPolicy;
use crate::domain::action_token::service::ActionTokenTtl;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub action_tokens: ActionTokenConfig,
    pub policy: PolicyConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_minutes: i64,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_minutes", &self.expiration_minutes)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

#[derive(Deserialize, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// STARTTLS when true, plaintext (local relays such as MailHog) otherwise
    pub smtp_tls: bool,
    pub from_address: String,
    pub from_name: String,
    /// Base URL of the front end that renders the verify/reset pages
    pub frontend_base_url: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"<redacted>")
            .field("smtp_tls", &self.smtp_tls)
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("frontend_base_url", &self.frontend_base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ActionTokenConfig {
    pub verification_ttl_minutes: i64,
    pub reset_ttl_minutes: i64,
    pub purge_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PolicyConfig {
    pub require_verified_email: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    pub admin: Option<AdminSeedConfig>,
}

#[derive(Deserialize, Clone)]
pub struct AdminSeedConfig {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeedConfig")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        Self::from_configuration(configuration)
    }

    fn from_configuration(configuration: ConfigBuilder) -> Result<Self, ConfigError> {
        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.action_tokens.verification_ttl_minutes <= 0 {
            return Err(ConfigError::Message(
                "action_tokens.verification_ttl_minutes must be positive".to_string(),
            ));
        }
        if self.action_tokens.reset_ttl_minutes <= 0 {
            return Err(ConfigError::Message(
                "action_tokens.reset_ttl_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Token issuer settings derived from the `jwt` section.
    pub fn token_settings(&self) -> auth::TokenSettings {
        auth::TokenSettings {
            secret: self.jwt.secret.as_bytes().to_vec(),
            ttl: chrono::Duration::minutes(self.jwt.expiration_minutes),
            issuer: self.jwt.issuer.clone(),
            audience: self.jwt.audience.clone(),
            leeway: chrono::Duration::seconds(self.jwt.leeway_seconds),
        }
    }

    /// Lifetimes of verification and reset tokens.
    pub fn action_token_ttl(&self) -> ActionTokenTtl {
        ActionTokenTtl {
            verify_email: chrono::Duration::minutes(self.action_tokens.verification_ttl_minutes),
            reset_password: chrono::Duration::minutes(self.action_tokens.reset_ttl_minutes),
        }
    }

    pub fn auth_policy(&self) -> AuthPolicy {
        AuthPolicy {
            require_verified_email: self.policy.require_verified_email,
        }
    }

    /// Validated admin seed, if one is configured.
    ///
    /// # Errors
    /// * Validation errors - A configured field is invalid
    pub fn admin_seed(&self) -> Result<Option<AdminSeed>, AuthError> {
        self.seed
            .admin
            .as_ref()
            .map(|admin| {
                AdminSeed::new(
                    admin.name.clone(),
                    admin.surname.clone(),
                    admin.username.clone(),
                    admin.email.clone(),
                    admin.password.clone(),
                )
            })
            .transpose()
    }
}
