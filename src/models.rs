use serde::{Deserialize, Serialize};

/// Image reference used when a product has no images attached.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// A catalog product with its joined brand, category, images and review ratings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub brand: Option<String>,
    // ordered, primary image first
    pub images: Vec<String>,
    pub review_ratings: Vec<u8>,
    pub in_stock: bool,
}

impl Product {
    /// Mean review rating rounded to one decimal place, `0.0` when unreviewed.
    pub fn average_rating(&self) -> f64 {
        if self.review_ratings.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.review_ratings.iter().map(|r| u32::from(*r)).sum();
        let mean = f64::from(sum) / self.review_ratings.len() as f64;
        (mean * 10.0).round() / 10.0
    }

    pub fn primary_image(&self) -> &str {
        self.images
            .first()
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_IMAGE)
    }
}

/// One page of filtered products plus the size of the whole filtered set.
#[derive(Debug, Clone, Default)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: usize,
}

/// Product as returned by the listing and detail endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub brand: Option<String>,
    pub image: String,
    pub rating: f64,
    pub review_count: usize,
    pub in_stock: bool,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let rating = product.average_rating();
        let image = product.primary_image().to_string();
        ProductView {
            id: product.id,
            review_count: product.review_ratings.len(),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            brand: product.brand,
            image,
            rating,
            in_stock: product.in_stock,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: usize, limit: usize, offset: usize) -> Self {
        Pagination {
            total,
            limit,
            offset,
            has_more: offset.saturating_add(limit) < total,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ProductListResponse {
    pub products: Vec<ProductView>,
    pub pagination: Pagination,
}
