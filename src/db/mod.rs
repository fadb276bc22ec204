use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{profiles, session_flags, users};

pub mod gateway;
pub mod migrator;
pub mod repositories;

pub use gateway::{GatewayError, Page};
pub use repositories::user::NewUser;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    // ========== Credential Store ==========

    pub async fn user_exists_with_email_or_username(
        &self,
        email: &str,
        username: Option<&str>,
    ) -> Result<bool, GatewayError> {
        self.user_repo()
            .exists_with_email_or_username(email, username)
            .await
    }

    pub async fn create_user_with_profile(
        &self,
        data: NewUser,
        security: &SecurityConfig,
    ) -> Result<(users::Model, profiles::Model), GatewayError> {
        self.user_repo().create_with_profile(data, security).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<users::Model>, GatewayError> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_id_or_err(&self, id: i32) -> Result<users::Model, GatewayError> {
        self.user_repo().get_by_id_or_err(id).await
    }

    pub async fn get_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<users::Model>, GatewayError> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_with_profile(
        &self,
        id: i32,
    ) -> Result<Option<(users::Model, Option<profiles::Model>)>, GatewayError> {
        self.user_repo().get_with_profile(id).await
    }

    pub async fn verify_user_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, GatewayError> {
        self.user_repo()
            .verify_password(password, password_hash)
            .await
    }

    pub async fn update_user_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<(), GatewayError> {
        self.user_repo()
            .update_password(id, new_password, security)
            .await
    }

    pub async fn list_users_paginated(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<Page<users::Model>, GatewayError> {
        self.user_repo().list_paginated(page, limit).await
    }

    // ========== Session Flag Store ==========

    pub async fn get_session_by_user(
        &self,
        user_id: i32,
    ) -> Result<Option<session_flags::Model>, GatewayError> {
        self.session_repo().get_by_user(user_id).await
    }

    pub async fn get_session_by_user_or_err(
        &self,
        user_id: i32,
    ) -> Result<session_flags::Model, GatewayError> {
        self.session_repo().get_by_user_or_err(user_id).await
    }

    pub async fn is_user_logged_in(&self, user_id: i32) -> Result<bool, GatewayError> {
        self.session_repo().is_logged_in(user_id).await
    }

    pub async fn set_user_logged_in(
        &self,
        user_id: i32,
        is_logged_in: bool,
    ) -> Result<session_flags::Model, GatewayError> {
        self.session_repo()
            .set_logged_in(user_id, is_logged_in)
            .await
    }

    pub async fn set_session_otp(
        &self,
        user_id: i32,
        code: &str,
    ) -> Result<session_flags::Model, GatewayError> {
        self.session_repo().set_otp(user_id, code).await
    }

    pub async fn find_session_by_otp(
        &self,
        code: &str,
    ) -> Result<Option<session_flags::Model>, GatewayError> {
        self.session_repo().find_by_otp(code).await
    }

    pub async fn clear_session_otp(&self, user_id: i32) -> Result<(), GatewayError> {
        self.session_repo().clear_otp(user_id).await
    }

    pub async fn claim_session_otp(&self, code: &str) -> Result<bool, GatewayError> {
        self.session_repo().claim_otp(code).await
    }
}
