use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set, Value};

use crate::db::gateway::{self, GatewayError};
use crate::entities::session_flags;

/// Access to the per-user logged-in/OTP row. Rows are created lazily by the
/// first login or OTP request, keyed on the unique `user_id`.
pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_user(
        &self,
        user_id: i32,
    ) -> Result<Option<session_flags::Model>, GatewayError> {
        let filter = Condition::all().add(session_flags::Column::UserId.eq(user_id));
        gateway::get_one::<session_flags::Entity>(&self.conn, filter).await
    }

    pub async fn get_by_user_or_err(
        &self,
        user_id: i32,
    ) -> Result<session_flags::Model, GatewayError> {
        let filter = Condition::all().add(session_flags::Column::UserId.eq(user_id));
        gateway::get_one_or_err::<session_flags::Entity>(&self.conn, filter, "session").await
    }

    /// Missing row reads as logged out.
    pub async fn is_logged_in(&self, user_id: i32) -> Result<bool, GatewayError> {
        Ok(self
            .get_by_user(user_id)
            .await?
            .is_some_and(|flag| flag.is_logged_in))
    }

    /// Flips the logged-in bit, inserting the row if it does not exist yet.
    /// Concurrent logins for the same user race last-write-wins here.
    pub async fn set_logged_in(
        &self,
        user_id: i32,
        is_logged_in: bool,
    ) -> Result<session_flags::Model, GatewayError> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = session_flags::ActiveModel {
            user_id: Set(user_id),
            is_logged_in: Set(is_logged_in),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        gateway::upsert::<session_flags::Entity>(&self.conn, model).await
    }

    /// Stores a fresh OTP code with its issuance time. Does not touch the
    /// logged-in bit; password reset is orthogonal to the session state.
    pub async fn set_otp(
        &self,
        user_id: i32,
        code: &str,
    ) -> Result<session_flags::Model, GatewayError> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = session_flags::ActiveModel {
            user_id: Set(user_id),
            otp_code: Set(Some(code.to_string())),
            otp_created_at: Set(Some(now.clone())),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        gateway::upsert::<session_flags::Entity>(&self.conn, model).await
    }

    pub async fn find_by_otp(
        &self,
        code: &str,
    ) -> Result<Option<session_flags::Model>, GatewayError> {
        let filter = Condition::all().add(session_flags::Column::OtpCode.eq(code));
        gateway::get_one::<session_flags::Entity>(&self.conn, filter).await
    }

    /// Clears the code and its timestamp together. Idempotent.
    pub async fn clear_otp(&self, user_id: i32) -> Result<(), GatewayError> {
        session_flags::Entity::update_many()
            .col_expr(session_flags::Column::OtpCode, Expr::value(Value::String(None)))
            .col_expr(
                session_flags::Column::OtpCreatedAt,
                Expr::value(Value::String(None)),
            )
            .col_expr(
                session_flags::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(session_flags::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    /// Single conditional update that consumes the code: only the caller
    /// whose UPDATE matches the still-present code wins, so two concurrent
    /// verifications of the same OTP cannot both succeed.
    pub async fn claim_otp(&self, code: &str) -> Result<bool, GatewayError> {
        let result = session_flags::Entity::update_many()
            .col_expr(session_flags::Column::OtpCode, Expr::value(Value::String(None)))
            .col_expr(
                session_flags::Column::OtpCreatedAt,
                Expr::value(Value::String(None)),
            )
            .col_expr(
                session_flags::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(session_flags::Column::OtpCode.eq(code))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
