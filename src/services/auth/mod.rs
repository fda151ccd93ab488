pub mod access_jwt;
pub mod audit;
pub mod authenticate;
pub mod authorize;
pub mod bearer;
pub mod factory;
pub mod identity;
pub mod pipeline;
pub mod route_scope;

pub use access_jwt::TokenValidator;
pub use factory::{build_audit_sink, build_token_validator};
pub use identity::Identity;
pub use route_scope::RouteScopeMap;
