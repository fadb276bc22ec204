use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub fullname: String,

    #[sea_orm(unique)]
    pub username: Option<String>,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash. Never leaves the repository/service layer;
    /// handlers only ever see the hash-free DTO.
    pub password_hash: String,

    /// "active" or "inactive"
    pub status: String,

    /// "user" or "admin"
    pub role: String,

    pub avatar: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::profiles::Entity")]
    Profile,
    #[sea_orm(has_one = "super::session_flags::Entity")]
    SessionFlag,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::session_flags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionFlag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
