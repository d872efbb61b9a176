use actix_web::body::EitherBody;
use actix_web::dev::{ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{Error, ResponseError};
use actix_service::{Service, forward_ready};
use futures::future::{ok, Ready, LocalBoxFuture};
use std::rc::Rc;
use std::time::Instant;

use crate::errors::{GatewayError, RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING};
use crate::rate_limit::FixedWindowLimiter;

pub const FORWARDED_FOR: &str = "x-forwarded-for";
pub const LOOPBACK_CLIENT: &str = "127.0.0.1";

/// Rate-limit key for a request: the first `X-Forwarded-For` entry, or loopback.
pub fn client_id(req: &ServiceRequest) -> String {
    req.headers()
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(LOOPBACK_CLIENT)
        .to_string()
}

// Middleware factory
pub struct RateLimit {
    limiter: FixedWindowLimiter,
}

impl RateLimit {
    pub fn new(limiter: FixedWindowLimiter) -> Self {
        RateLimit { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddleware<S>;
    type InitError = ();

    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitMiddleware {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        })
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limiter: FixedWindowLimiter,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let client = client_id(&req);
        let now = Instant::now();
        // counted before the handler sees any query parameters
        let decision = self.limiter.check_at(&client, now);

        Box::pin(async move {
            if !decision.allowed {
                log::warn!("Rate limit exceeded for client {}", client);
                let rejection = GatewayError::RateLimited {
                    client,
                    limit: decision.limit,
                    remaining: decision.remaining,
                    retry_after_secs: decision.retry_after_secs(now),
                };
                return Ok(req
                    .into_response(rejection.error_response())
                    .map_into_right_body());
            }

            let mut res = service.call(req).await?;
            let headers = res.headers_mut();
            headers.insert(
                HeaderName::from_static(RATE_LIMIT_LIMIT),
                HeaderValue::from(decision.limit),
            );
            headers.insert(
                HeaderName::from_static(RATE_LIMIT_REMAINING),
                HeaderValue::from(decision.remaining),
            );
            Ok(res.map_into_left_body())
        })
    }
}
