pub mod user;
pub mod app;
pub mod role;
pub mod permission;
pub mod user_app;
pub mod oauth_client;
pub mod oauth_token;
pub mod oauth_scope;
pub mod oauth_audit_log;
pub mod authorization_code;
pub mod user_consent;

pub use user::*;
pub use app::*;
pub use role::*;
pub use permission::*;
pub use user_app::*;
pub use oauth_client::*;
pub use oauth_token::*;
pub use oauth_scope::*;
pub use oauth_audit_log::*;
pub use authorization_code::*;
pub use user_consent::*;
