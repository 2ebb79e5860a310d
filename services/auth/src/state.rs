//! State shared by the authentication routes and middleware

use common::cache::RedisPool;

use crate::{jwt::JwtService, rate_limiter::RateLimiter, repositories::UserRepository};

#[derive(Clone)]
pub struct AuthState {
    pub user_repository: UserRepository,
    pub jwt_service: JwtService,
    pub redis_pool: RedisPool,
    pub rate_limiter: RateLimiter,
}
