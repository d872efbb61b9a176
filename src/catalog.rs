use async_trait::async_trait;

use crate::errors::CatalogError;
use crate::models::{Product, ProductPage};
use crate::query::ProductQuery;

/// Anything the product endpoints can list from.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Filtered products ordered by id, sliced by the query's offset and limit.
    async fn find_products(&self, query: &ProductQuery) -> Result<ProductPage, CatalogError>;

    async fn find_product(&self, id: i64) -> Result<Option<Product>, CatalogError>;
}

/// Fixed in-memory product list.
pub struct MockCatalog {
    products: Vec<Product>,
}

impl MockCatalog {
    pub fn new(mut products: Vec<Product>) -> Self {
        products.sort_by_key(|p| p.id);
        MockCatalog { products }
    }

    /// The demo catalog served when no database is configured.
    pub fn demo() -> Self {
        MockCatalog::new(demo_products())
    }
}

#[async_trait]
impl ProductSource for MockCatalog {
    async fn find_products(&self, query: &ProductQuery) -> Result<ProductPage, CatalogError> {
        let filtered: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| query.matches(&p.category, &p.name, p.description.as_deref()))
            .collect();

        let products = filtered
            .iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|p| (*p).clone())
            .collect();

        Ok(ProductPage {
            products,
            total: filtered.len(),
        })
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }
}

#[allow(clippy::too_many_arguments)]
fn demo_product(
    id: i64,
    name: &str,
    price: f64,
    image: &str,
    category: &str,
    description: &str,
    brand: &str,
    review_ratings: Vec<u8>,
) -> Product {
    Product {
        id,
        name: name.to_string(),
        description: Some(description.to_string()),
        price,
        category: category.to_string(),
        brand: Some(brand.to_string()),
        images: vec![image.to_string()],
        review_ratings,
        in_stock: true,
    }
}

pub fn demo_products() -> Vec<Product> {
    vec![
        demo_product(
            1,
            "Premium Wireless Headphones",
            299.99,
            "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=500&h=500&fit=crop",
            "electronics",
            "High-quality wireless headphones with noise cancellation.",
            "TechBrand",
            vec![5, 5, 4, 4],
        ),
        demo_product(
            2,
            "Smart Watch",
            199.99,
            "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=500&h=500&fit=crop",
            "electronics",
            "Feature-rich smartwatch with health monitoring.",
            "SmartTech",
            vec![5, 4, 4],
        ),
        demo_product(
            3,
            "Designer Laptop Bag",
            89.99,
            "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?w=500&h=500&fit=crop",
            "accessories",
            "Stylish and functional laptop bag for professionals.",
            "StyleCorp",
            vec![5, 5, 4, 5, 4, 5, 5, 4, 5, 5],
        ),
        demo_product(
            4,
            "Organic Cotton T-Shirt",
            29.99,
            "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?w=500&h=500&fit=crop",
            "clothing",
            "Comfortable organic cotton t-shirt in various colors.",
            "EcoWear",
            vec![4, 5, 4, 5, 4],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{PageLimits, ProductParams};

    fn query(category: Option<&str>, search: Option<&str>, limit: &str, offset: &str) -> ProductQuery {
        let params = ProductParams {
            category: category.map(String::from),
            search: search.map(String::from),
            limit: Some(limit.to_string()),
            offset: Some(offset.to_string()),
        };
        ProductQuery::from_params(&params, PageLimits::default())
    }

    fn ids(page: &ProductPage) -> Vec<i64> {
        page.products.iter().map(|p| p.id).collect()
    }

    #[actix_web::test]
    async fn category_filter_is_case_insensitive() {
        let catalog = MockCatalog::demo();
        let page = catalog
            .find_products(&query(Some("ELECTRONICS"), None, "10", "0"))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![1, 2]);
        assert_eq!(page.total, 2);
    }

    #[actix_web::test]
    async fn category_and_search_intersect() {
        let catalog = MockCatalog::demo();
        let page = catalog
            .find_products(&query(Some("electronics"), Some("health"), "10", "0"))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![2]);

        let page = catalog
            .find_products(&query(Some("clothing"), Some("watch"), "10", "0"))
            .await
            .unwrap();
        assert!(page.products.is_empty());
        assert_eq!(page.total, 0);
    }

    #[actix_web::test]
    async fn pages_are_sliced_from_the_filtered_set() {
        let catalog = MockCatalog::demo();
        let page = catalog.find_products(&query(None, None, "2", "1")).await.unwrap();
        assert_eq!(ids(&page), vec![2, 3]);
        assert_eq!(page.total, 4);

        let past_end = catalog.find_products(&query(None, None, "2", "9")).await.unwrap();
        assert!(past_end.products.is_empty());
        assert_eq!(past_end.total, 4);
    }

    #[actix_web::test]
    async fn unsorted_input_is_listed_by_id() {
        let mut products = demo_products();
        products.reverse();
        let catalog = MockCatalog::new(products);
        let page = catalog.find_products(&query(None, None, "10", "0")).await.unwrap();
        assert_eq!(ids(&page), vec![1, 2, 3, 4]);
    }

    #[test]
    fn demo_ratings_match_the_storefront_listing() {
        let ratings: Vec<f64> = demo_products().iter().map(Product::average_rating).collect();
        assert_eq!(ratings, vec![4.5, 4.3, 4.7, 4.4]);
    }

    #[actix_web::test]
    async fn finds_single_product_by_id() {
        let catalog = MockCatalog::demo();
        assert_eq!(catalog.find_product(3).await.unwrap().unwrap().name, "Designer Laptop Bag");
        assert!(catalog.find_product(42).await.unwrap().is_none());
    }
}
