pub mod auth;
pub mod email;
pub mod jwt;
pub mod password;
pub mod pkce;
pub mod secret;
