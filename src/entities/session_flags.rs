use sea_orm::entity::prelude::*;

/// Per-user logged-in/OTP tracking row. At most one row per user; created
/// lazily by the first login or OTP request.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "session_flags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub user_id: i32,

    #[sea_orm(default_value = false)]
    pub is_logged_in: bool,

    /// 6-digit reset code. Always set and cleared together with
    /// `otp_created_at`.
    pub otp_code: Option<String>,

    /// RFC 3339 issuance timestamp for `otp_code`.
    pub otp_created_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
