#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::Authenticator;
use auth::TokenSettings;
use auth_service::domain::account::errors::AuthError;
use auth_service::domain::account::errors::EmailSendError;
use auth_service::domain::account::management::UserManagementService;
use auth_service::domain::account::models::Account;
use auth_service::domain::account::models::AccountStatus;
use auth_service::domain::account::models::EmailAddress;
use auth_service::domain::account::models::Role;
use auth_service::domain::account::models::UserId;
use auth_service::domain::account::ports::AccountRepository;
use auth_service::domain::account::ports::EmailSender;
use auth_service::domain::account::seed::AccountSeeder;
use auth_service::domain::account::seed::AdminSeed;
use auth_service::domain::account::seed::SeedOutcome;
use auth_service::domain::account::service::AuthPolicy;
use auth_service::domain::account::service::AuthService;
use auth_service::domain::action_token::errors::ActionTokenError;
use auth_service::domain::action_token::models::ActionPurpose;
use auth_service::domain::action_token::models::ActionToken;
use auth_service::domain::action_token::models::ActionTokenSecret;
use auth_service::domain::action_token::ports::ActionTokenRepository;
use auth_service::domain::action_token::service::ActionTokenService;
use auth_service::domain::action_token::service::ActionTokenTtl;
use auth_service::domain::clock::Clock;
use auth_service::inbound::http::router::create_router;
use chrono::DateTime;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;
use serde_json::json;
use serde_json::Value;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::Connection;
use sqlx::Executor;
use sqlx::PgConnection;
use sqlx::PgPool;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "Admin1234!";
pub const JWT_TTL_MINUTES: i64 = 60;
pub const JWT_LEEWAY_SECONDS: i64 = 5;
pub const RESET_TTL_MINUTES: i64 = 60;

/// Test application that spawns a real server over in-memory adapters
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub accounts: Arc<InMemoryAccountRepository>,
    pub action_tokens: Arc<InMemoryActionTokenRepository>,
    pub emails: Arc<RecordingEmailSender>,
    pub clock: Arc<ManualClock>,
    seeder: AccountSeeder<InMemoryAccountRepository, ManualClock>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with_policy(AuthPolicy::default()).await
    }

    pub async fn spawn_with_policy(policy: AuthPolicy) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let accounts = Arc::new(InMemoryAccountRepository::default());
        let action_tokens = Arc::new(InMemoryActionTokenRepository::default());
        let emails = Arc::new(RecordingEmailSender::default());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        ));

        let authenticator = Arc::new(
            Authenticator::new(TokenSettings {
                secret: b"test-secret-key-for-jwt-signing-at-least-32-bytes".to_vec(),
                ttl: Duration::minutes(JWT_TTL_MINUTES),
                issuer: Some("auth-service".to_string()),
                audience: Some("auth-service-tests".to_string()),
                leeway: Duration::seconds(JWT_LEEWAY_SECONDS),
            })
            .expect("Failed to create authenticator"),
        );

        let token_store = Arc::new(ActionTokenService::new(
            Arc::clone(&action_tokens),
            ActionTokenTtl {
                verify_email: Duration::hours(24),
                reset_password: Duration::minutes(RESET_TTL_MINUTES),
            },
        ));

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&accounts),
            token_store,
            Arc::clone(&emails),
            Arc::clone(&clock),
            Arc::clone(&authenticator),
            policy,
        ));
        let user_management = Arc::new(UserManagementService::new(
            Arc::clone(&accounts),
            Arc::clone(&clock),
        ));

        let admin = AdminSeed::new(
            "Admin".to_string(),
            "User".to_string(),
            "admin".to_string(),
            ADMIN_EMAIL.to_string(),
            ADMIN_PASSWORD.to_string(),
        )
        .expect("Invalid admin seed");
        let seeder = AccountSeeder::new(
            Arc::clone(&accounts),
            Arc::clone(&clock),
            Arc::clone(&authenticator),
            Some(admin),
        );

        let router = create_router(auth_service, user_management, authenticator, clock.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::builder()
                .build()
                .expect("Failed to create reqwest client"),
            accounts,
            action_tokens,
            emails,
            clock,
            seeder,
        }
    }

    pub async fn seed_admin(&self) -> SeedOutcome {
        self.seeder.ensure_seeded().await.expect("Seeding failed")
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PATCH request with Bearer token
    pub fn patch_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .patch(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register an account through the API
    pub async fn register(&self, username: &str, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/v1/auth/register")
            .json(&json!({
                "name": "Test",
                "surname": "User",
                "username": username,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/v1/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn verify_email(&self, token: &str) -> reqwest::Response {
        self.post("/api/v1/auth/verify-email")
            .json(&json!({ "token": token }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register, verify and log in; returns (user id, access token)
    pub async fn verified_user(&self, username: &str, email: &str, password: &str) -> (String, String) {
        let response = self.register(username, email, password).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: Value = response.json().await.expect("Failed to parse response");
        let user_id = body["data"]["id"].as_str().unwrap().to_string();

        let token = self
            .emails
            .wait_for_secret(email, ActionPurpose::VerifyEmail, 1)
            .await;
        assert_eq!(self.verify_email(&token).await.status(), reqwest::StatusCode::OK);

        (user_id, self.access_token(email, password).await)
    }

    pub async fn access_token(&self, email: &str, password: &str) -> String {
        let response = self.login(email, password).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["access_token"].as_str().unwrap().to_string()
    }
}

/// Test database helper
pub struct TestDb {
    pub pool: PgPool,
    pub db_name: String,
    server_url: String,
}

impl TestDb {
    /// Create a new migrated database with a unique name on the server at
    /// `DATABASE_URL`
    ///
    /// Returns `None` when `DATABASE_URL` is not set.
    pub async fn new() -> Option<Self> {
        let Ok(server_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping PostgreSQL test");
            return None;
        };

        let db_name = format!(
            "test_auth_service_{}",
            uuid::Uuid::new_v4().to_string().replace('-', "_")
        );

        let mut conn = PgConnection::connect(&server_url)
            .await
            .expect("Failed to connect to Postgres");

        conn.execute(format!(r#"CREATE DATABASE "{}";"#, db_name).as_str())
            .await
            .expect("Failed to create test database");

        let options = server_url
            .parse::<PgConnectOptions>()
            .expect("Failed to parse DATABASE_URL")
            .database(&db_name);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Some(Self {
            pool,
            db_name,
            server_url,
        })
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        // Database cleanup happens asynchronously
        let db_name = self.db_name.clone();
        let server_url = self.server_url.clone();
        tokio::spawn(async move {
            if let Ok(mut conn) = PgConnection::connect(&server_url).await {
                let _ = conn
                    .execute(
                        format!(
                            r#"SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}';"#,
                            db_name
                        )
                        .as_str(),
                    )
                    .await;

                let _ = conn
                    .execute(format!(r#"DROP DATABASE IF EXISTS "{}";"#, db_name).as_str())
                    .await;
            }
        });
    }
}

/// Clock whose instant only moves when a test advances it
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: Mutex<HashMap<UserId, Account>>,
}

impl InMemoryAccountRepository {
    pub fn get(&self, id: &UserId) -> Option<Account> {
        self.accounts.lock().unwrap().get(id).cloned()
    }

    fn modify<F>(&self, id: &UserId, change: F) -> Result<Account, AuthError>
    where
        F: FnOnce(&mut Account),
    {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| AuthError::NotFound(id.to_string()))?;
        change(account);
        Ok(account.clone())
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, AuthError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.values().any(|a| a.email == account.email) {
            return Err(AuthError::EmailTaken(account.email.to_string()));
        }
        if accounts.values().any(|a| a.username == account.username) {
            return Err(AuthError::UsernameTaken(account.username.to_string()));
        }
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, AuthError> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AuthError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| &a.email == email)
            .cloned())
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.modify(id, |a| {
            a.password_hash = password_hash.to_string();
            a.updated_at = updated_at;
        })
        .map(|_| ())
    }

    async fn mark_email_verified(
        &self,
        id: &UserId,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.modify(id, |a| {
            a.email_verified = true;
            a.updated_at = updated_at;
        })
        .map(|_| ())
    }

    async fn update_role(
        &self,
        id: &UserId,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, AuthError> {
        self.modify(id, |a| {
            a.role = role;
            a.updated_at = updated_at;
        })
    }

    async fn update_status(
        &self,
        id: &UserId,
        status: AccountStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, AuthError> {
        self.modify(id, |a| {
            a.status = status;
            a.updated_at = updated_at;
        })
    }
}

/// Token table guarded by one lock, so upsert and consume are atomic
#[derive(Default)]
pub struct InMemoryActionTokenRepository {
    tokens: Mutex<Vec<ActionToken>>,
}

impl InMemoryActionTokenRepository {
    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }
}

#[async_trait]
impl ActionTokenRepository for InMemoryActionTokenRepository {
    async fn upsert_outstanding(&self, token: ActionToken) -> Result<ActionToken, ActionTokenError> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(outstanding) = tokens.iter_mut().find(|t| {
            t.user_id == token.user_id && t.purpose == token.purpose && !t.is_consumed()
        }) {
            outstanding.token_hash = token.token_hash;
            outstanding.created_at = token.created_at;
            outstanding.expires_at = token.expires_at;
            return Ok(outstanding.clone());
        }
        tokens.push(token.clone());
        Ok(token)
    }

    async fn consume(
        &self,
        token_hash: &str,
        purpose: ActionPurpose,
        now: DateTime<Utc>,
    ) -> Result<UserId, ActionTokenError> {
        let mut tokens = self.tokens.lock().unwrap();
        let token = tokens
            .iter_mut()
            .find(|t| t.token_hash == token_hash && t.purpose == purpose)
            .ok_or(ActionTokenError::NotFound)?;
        token.check_consumable(now)?;
        token.consumed_at = Some(now);
        Ok(token.user_id)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, ActionTokenError> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|t| !t.is_expired(now));
        Ok((before - tokens.len()) as u64)
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub purpose: ActionPurpose,
    pub secret: String,
}

/// Email sender that records every message instead of delivering it
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait until `count` messages to `to` for `purpose` were delivered and
    /// return the most recent secret
    ///
    /// Delivery happens on a detached task, so it can trail the HTTP response.
    pub async fn wait_for_secret(&self, to: &str, purpose: ActionPurpose, count: usize) -> String {
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
        loop {
            let mut secrets: Vec<String> = self
                .sent
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.to == to && m.purpose == purpose)
                .map(|m| m.secret.clone())
                .collect();
            if secrets.len() >= count {
                return secrets.pop().expect("No matching email");
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "Timed out waiting for {} email to {}",
                purpose,
                to
            );
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    fn record(&self, to: &EmailAddress, purpose: ActionPurpose, token: &ActionTokenSecret) {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.as_str().to_string(),
            purpose,
            secret: token.expose().to_string(),
        });
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_verification_email(
        &self,
        to: &EmailAddress,
        token: &ActionTokenSecret,
    ) -> Result<(), EmailSendError> {
        self.record(to, ActionPurpose::VerifyEmail, token);
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        to: &EmailAddress,
        token: &ActionTokenSecret,
    ) -> Result<(), EmailSendError> {
        self.record(to, ActionPurpose::ResetPassword, token);
        Ok(())
    }
}
