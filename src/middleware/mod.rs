pub mod auth;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser, Capability};
pub use response::{ApiResponse, ApiResult};
