use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;

use crate::{
    config::Config,
    result::{Empty, error_response},
};

/// 基于 Redis 的固定窗口限流
#[derive(Clone)]
pub struct RateLimiter {
    redis: Arc<redis::Client>,
    config: Arc<Config>,
}

/// 优先取代理头，再退回连接地址；代理头不做校验，须由前置代理覆盖
fn client_ip(req: &Request<Body>) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

impl RateLimiter {
    pub fn new(redis: redis::Client, config: Arc<Config>) -> Self {
        Self {
            redis: Arc::new(redis),
            config,
        }
    }

    async fn hit(&self, ip: &str) -> redis::RedisResult<u64> {
        let key = format!("rate_limit:{}", ip);
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let count: u64 = conn.incr(&key, 1).await?;
        if count == 1 {
            // 窗口内第一次请求时设置过期时间
            let _: () = conn
                .expire(&key, self.config.rate_limit_window().as_secs() as i64)
                .await?;
        }
        Ok(count)
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        let ip = client_ip(&req);

        match self.hit(&ip).await {
            Ok(count) if count > self.config.rate_limit_requests as u64 => {
                tracing::warn!("Rate limit exceeded for {}", ip);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    error_response(
                        format!(
                            "Too many requests, please try again in {} seconds",
                            self.config.rate_limit_window().as_secs()
                        ),
                        Empty {},
                    ),
                )
                    .into_response()
            }
            Ok(_) => next.run(req).await,
            Err(e) => {
                // Redis 不可用时放行
                tracing::error!("Rate limiter unavailable: {}", e);
                next.run(req).await
            }
        }
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_prefers_proxy_headers() {
        let req = Request::builder()
            .header("x-forwarded-for", " 10.0.0.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "10.0.0.7");

        let req = Request::builder()
            .header("x-real-ip", "192.168.1.2")
            .header("x-forwarded-for", "10.0.0.7")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "192.168.1.2");

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&req), "unknown");
    }
}
