pub mod auth_context;
pub mod rate_limit;
pub mod security_headers;
