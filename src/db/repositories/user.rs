use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, Set, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::db::gateway::{self, GatewayError, Page};
use crate::entities::{profiles, users};
use crate::models::user::{UserRole, UserStatus};

/// Fields accepted at registration. The password arrives in plain text and
/// is hashed on the write path.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub x: Option<String>,
    pub linked_in: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Single disjunctive existence check over the unique columns.
    pub async fn exists_with_email_or_username(
        &self,
        email: &str,
        username: Option<&str>,
    ) -> Result<bool, GatewayError> {
        let mut filter = Condition::any().add(users::Column::Email.eq(email));
        if let Some(username) = username {
            filter = filter.add(users::Column::Username.eq(username));
        }

        let existing = gateway::get_one::<users::Entity>(&self.conn, filter).await?;
        Ok(existing.is_some())
    }

    /// Creates the user and its profile row in one transaction so a failed
    /// profile insert never leaves a user behind.
    pub async fn create_with_profile(
        &self,
        data: NewUser,
        security: &SecurityConfig,
    ) -> Result<(users::Model, profiles::Model), GatewayError> {
        let password_hash = hash_password_blocking(data.password, security.clone()).await?;

        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let user = users::ActiveModel {
            fullname: Set(data.fullname),
            username: Set(data.username),
            email: Set(data.email),
            password_hash: Set(password_hash),
            status: Set(UserStatus::Active.as_str().to_string()),
            role: Set(UserRole::User.as_str().to_string()),
            avatar: Set(data.avatar),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let profile = profiles::ActiveModel {
            user_id: Set(user.id),
            bio: Set(data.bio),
            phone_number: Set(data.phone_number),
            facebook: Set(data.facebook),
            instagram: Set(data.instagram),
            x: Set(data.x),
            linked_in: Set(data.linked_in),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok((user, profile))
    }

    /// Returned models carry the password hash; callers convert to the
    /// hash-free DTO before anything leaves the service layer.
    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>, GatewayError> {
        gateway::get_by_id::<users::Entity>(&self.conn, id).await
    }

    pub async fn get_by_id_or_err(&self, id: i32) -> Result<users::Model, GatewayError> {
        gateway::get_by_id_or_err::<users::Entity>(&self.conn, id, "user").await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>, GatewayError> {
        let filter = Condition::all().add(users::Column::Email.eq(email));
        gateway::get_one::<users::Entity>(&self.conn, filter).await
    }

    pub async fn get_with_profile(
        &self,
        id: i32,
    ) -> Result<Option<(users::Model, Option<profiles::Model>)>, GatewayError> {
        let filter = Condition::all().add(users::Column::Id.eq(id));
        gateway::get_one_with_related::<users::Entity, profiles::Entity>(&self.conn, filter).await
    }

    pub async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, GatewayError> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();

        // Argon2 verification is CPU-bound; keep it off the async runtime.
        task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| GatewayError::Internal(format!("Invalid password hash: {e}")))?;

            Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok())
        })
        .await
        .map_err(|e| GatewayError::Internal(format!("Password verification task panicked: {e}")))?
    }

    /// Re-hashes and stores a new password for the user.
    pub async fn update_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<(), GatewayError> {
        let user = self.get_by_id_or_err(id).await?;

        let new_hash =
            hash_password_blocking(new_password.to_string(), security.clone()).await?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn list_paginated(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<Page<users::Model>, GatewayError> {
        gateway::get_all_paginated::<users::Entity>(&self.conn, Condition::all(), page, limit)
            .await
    }
}

async fn hash_password_blocking(
    password: String,
    security: SecurityConfig,
) -> Result<String, GatewayError> {
    task::spawn_blocking(move || hash_password(&password, &security))
        .await
        .map_err(|e| GatewayError::Internal(format!("Password hashing task panicked: {e}")))?
}

/// Hash a password with Argon2id using the configured cost parameters.
pub fn hash_password(password: &str, security: &SecurityConfig) -> Result<String, GatewayError> {
    let params = Params::new(
        security.argon2_memory_cost_kib,
        security.argon2_time_cost,
        security.argon2_parallelism,
        None,
    )
    .map_err(|e| GatewayError::Internal(format!("Invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| GatewayError::Internal(format!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_verifies() {
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        };

        let hash = hash_password("s3cret!", &security).unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();

        assert!(
            Argon2::default()
                .verify_password(b"s3cret!", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong", &parsed)
                .is_err()
        );
    }
}
