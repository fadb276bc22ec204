pub mod prelude;

pub mod profiles;
pub mod session_flags;
pub mod users;
