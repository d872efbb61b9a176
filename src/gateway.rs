use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::catalog::ProductSource;
use crate::errors::GatewayError;
use crate::middleware::RateLimit;
use crate::models::{Pagination, ProductListResponse, ProductView};
use crate::query::{PageLimits, ProductParams, ProductQuery};
use crate::rate_limit::FixedWindowLimiter;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn ProductSource>,
    pub limits: PageLimits,
}

/// Mounts the product endpoints behind `limiter`.
pub fn configure(cfg: &mut web::ServiceConfig, limiter: FixedWindowLimiter) {
    cfg.service(
        web::scope("/api/products")
            .wrap(RateLimit::new(limiter))
            .route("", web::get().to(list_products))
            .route("/{id}", web::get().to(get_product)),
    );
}

async fn list_products(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, GatewayError> {
    // decoded as raw pairs so one odd parameter cannot discard the others
    let pairs = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();
    let params = ProductParams::from_pairs(pairs);
    let query = ProductQuery::from_params(&params, state.limits);
    log::debug!("Listing products for {:?}", query);

    let page = state.catalog.find_products(&query).await?;

    Ok(HttpResponse::Ok().json(ProductListResponse {
        pagination: Pagination::new(page.total, query.limit, query.offset),
        products: page.products.into_iter().map(ProductView::from).collect(),
    }))
}

async fn get_product(state: web::Data<AppState>, product_id: web::Path<i64>) -> Result<HttpResponse, GatewayError> {
    let id = product_id.into_inner();
    match state.catalog.find_product(id).await? {
        Some(product) => Ok(HttpResponse::Ok().json(ProductView::from(product))),
        None => Err(GatewayError::NotFound(id)),
    }
}
