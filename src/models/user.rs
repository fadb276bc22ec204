//! Domain views of user rows. The password hash never leaves the
//! repository layer; these types are what services and handlers see.

use serde::{Deserialize, Serialize};

use crate::entities::{profiles, users};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Unknown values fall back to the least-privileged role.
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    #[must_use]
    pub fn from_db(value: &str) -> Self {
        match value {
            "active" => Self::Active,
            _ => Self::Inactive,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub x: Option<String>,
    pub linked_in: Option<String>,
}

impl From<profiles::Model> for Profile {
    fn from(model: profiles::Model) -> Self {
        Self {
            bio: model.bio,
            phone_number: model.phone_number,
            facebook: model.facebook,
            instagram: model.instagram,
            x: model.x,
            linked_in: model.linked_in,
        }
    }
}

/// User record without the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub fullname: String,
    pub username: Option<String>,
    pub email: String,
    pub status: UserStatus,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            fullname: model.fullname,
            username: model.username,
            email: model.email,
            status: UserStatus::from_db(&model.status),
            role: UserRole::from_db(&model.role),
            avatar: model.avatar,
            created_at: model.created_at,
            updated_at: model.updated_at,
            profile: None,
        }
    }
}

impl User {
    #[must_use]
    pub fn with_profile(model: users::Model, profile: Option<profiles::Model>) -> Self {
        let mut user = Self::from(model);
        user.profile = profile.map(Profile::from);
        user
    }
}
