pub mod app_auth;
pub mod jwt_auth;

pub use app_auth::{app_auth_middleware, AppContext};
pub use jwt_auth::jwt_auth_middleware;

