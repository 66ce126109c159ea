pub mod identity;
pub mod jwt;
pub mod middleware;

pub use identity::Identity;
pub use jwt::JwtManager;
