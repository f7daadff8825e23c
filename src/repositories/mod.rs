pub mod app;
pub mod permission;
pub mod role;
pub mod role_permission;
pub mod user;
pub mod user_app;
pub mod user_app_role;
pub mod oauth_client;
pub mod oauth_token;
pub mod oauth_scope;
pub mod oauth_audit_log;
pub mod authorization_code;
pub mod user_consent;

pub use app::AppRepository;
pub use permission::PermissionRepository;
pub use role::RoleRepository;
pub use role_permission::RolePermissionRepository;
pub use user::UserRepository;
pub use user_app::UserAppRepository;
pub use user_app_role::UserAppRoleRepository;
pub use oauth_client::OAuthClientRepository;
pub use oauth_token::OAuthTokenRepository;
pub use oauth_scope::OAuthScopeRepository;
pub use oauth_audit_log::OAuthAuditLogRepository;
pub use authorization_code::AuthorizationCodeRepository;
pub use user_consent::UserConsentRepository;
