use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Failure reported by a product source.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("data source failure: {0}")]
    DataSource(String),
}

impl From<mongodb::error::Error> for CatalogError {
    fn from(e: mongodb::error::Error) -> Self {
        match e.kind.as_ref() {
            mongodb::error::ErrorKind::InvalidArgument { .. } => {
                CatalogError::InvalidQuery(e.to_string())
            }
            _ => CatalogError::DataSource(e.to_string()),
        }
    }
}

/// Errors surfaced by the product endpoints.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("rate limit exceeded for {client}")]
    RateLimited {
        client: String,
        limit: u32,
        remaining: u32,
        retry_after_secs: u64,
    },

    #[error("product {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Catalog(CatalogError::InvalidQuery(_)) => StatusCode::BAD_REQUEST,
            GatewayError::Catalog(CatalogError::DataSource(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            GatewayError::RateLimited {
                limit,
                remaining,
                retry_after_secs,
                ..
            } => HttpResponse::TooManyRequests()
                .insert_header((header::RETRY_AFTER, HeaderValue::from(*retry_after_secs)))
                .insert_header((RATE_LIMIT_LIMIT, HeaderValue::from(*limit)))
                .insert_header((RATE_LIMIT_REMAINING, HeaderValue::from(*remaining)))
                .json(json!({
                    "error": "Rate limit exceeded",
                    "message": "Too many requests. Please try again later.",
                })),
            GatewayError::NotFound(_) => {
                HttpResponse::NotFound().json(json!({"error": "Product not found"}))
            }
            GatewayError::Catalog(CatalogError::InvalidQuery(e)) => {
                log::warn!("Rejected product query: {}", e);
                HttpResponse::BadRequest().json(json!({"error": "Invalid request parameters"}))
            }
            GatewayError::Catalog(CatalogError::DataSource(e)) => {
                log::error!("Products API error: {}", e);
                HttpResponse::InternalServerError().json(json!({"error": "Internal server error"}))
            }
        }
    }
}

pub const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart accessed before it was initialized")]
    NotInitialized,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("cannot check out an empty cart")]
    EmptyCart,

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
