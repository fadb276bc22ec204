pub use super::profiles::Entity as Profiles;
pub use super::session_flags::Entity as SessionFlags;
pub use super::users::Entity as Users;
