mod crypto;
mod db;
mod extractor;
mod middleware;

pub use crypto::verify_password;
pub use db::create_session;
pub use extractor::AdminSession;
pub use middleware::{auth_cookie, require_admin, AUTH_COOKIE};
