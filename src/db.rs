use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, Document, Regex};
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};

use crate::catalog::ProductSource;
use crate::errors::CatalogError;
use crate::models::{Product, ProductPage};
use crate::query::ProductQuery;

pub async fn connect(database_url: &str, database_name: &str) -> mongodb::error::Result<Database> {
    let client_options = ClientOptions::parse(database_url).await?;
    let client = Client::with_options(client_options)?;
    Ok(client.database(database_name))
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CategoryRef {
    pub name: String,
    pub slug: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrandRef {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ImageRef {
    pub image_url: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReviewRef {
    pub rating: i32,
}

/// Product as stored in the `products` collection, with brand, category,
/// images and reviews embedded.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProductDocument {
    pub _id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: CategoryRef,
    pub brand: Option<BrandRef>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub reviews: Vec<ReviewRef>,
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
}

fn in_stock_default() -> bool {
    true
}

impl From<ProductDocument> for Product {
    fn from(doc: ProductDocument) -> Self {
        let mut images = doc.images;
        // primary first, then sort order; stable for ties
        images.sort_by_key(|img| (!img.is_primary, img.sort_order));

        Product {
            id: doc._id,
            name: doc.name,
            description: doc.description,
            price: doc.price,
            category: doc.category.slug,
            brand: doc.brand.map(|b| b.name),
            images: images.into_iter().map(|img| img.image_url).collect(),
            review_ratings: doc
                .reviews
                .iter()
                .map(|r| r.rating.clamp(0, 5) as u8)
                .collect(),
            in_stock: doc.in_stock,
        }
    }
}

fn case_insensitive(pattern: String) -> Bson {
    Bson::RegularExpression(Regex {
        pattern,
        options: "i".to_string(),
    })
}

/// Builds the collection filter for a sanitized query.
pub fn product_filter(query: &ProductQuery) -> Document {
    let mut filter = doc! {};
    if let Some(category) = &query.category {
        filter.insert(
            "category.slug",
            case_insensitive(format!("^{}$", regex::escape(category))),
        );
    }
    if let Some(search) = &query.search {
        let needle = case_insensitive(regex::escape(search));
        filter.insert(
            "$or",
            vec![
                Bson::Document(doc! {"name": needle.clone()}),
                Bson::Document(doc! {"description": needle}),
            ],
        );
    }
    filter
}

/// Catalog backed by the document store.
pub struct MongoCatalog {
    products: Collection<ProductDocument>,
}

impl MongoCatalog {
    pub fn new(db: &Database) -> Self {
        MongoCatalog {
            products: db.collection("products"),
        }
    }
}

#[async_trait]
impl ProductSource for MongoCatalog {
    async fn find_products(&self, query: &ProductQuery) -> Result<ProductPage, CatalogError> {
        let filter = product_filter(query);
        let total = self.products.count_documents(filter.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(doc! {"_id": 1})
            .skip(query.offset as u64)
            .limit(query.limit as i64)
            .build();
        let cursor = self.products.find(filter, options).await?;
        let documents: Vec<ProductDocument> = cursor.try_collect().await?;

        Ok(ProductPage {
            products: documents.into_iter().map(Product::from).collect(),
            total: total as usize,
        })
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        let found = self.products.find_one(doc! {"_id": id}, None).await?;
        Ok(found.map(Product::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{PageLimits, ProductParams};

    fn query(category: Option<&str>, search: Option<&str>) -> ProductQuery {
        let params = ProductParams {
            category: category.map(String::from),
            search: search.map(String::from),
            ..ProductParams::default()
        };
        ProductQuery::from_params(&params, PageLimits::default())
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(product_filter(&query(None, None)).is_empty());
    }

    #[test]
    fn category_is_anchored_and_escaped() {
        let filter = product_filter(&query(Some("home+garden"), None));
        match filter.get("category.slug") {
            Some(Bson::RegularExpression(re)) => {
                assert_eq!(re.pattern, r"^home\+garden$");
                assert_eq!(re.options, "i");
            }
            other => panic!("unexpected category filter: {:?}", other),
        }
    }

    #[test]
    fn search_covers_name_and_description() {
        let filter = product_filter(&query(None, Some("usb (c)")));
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);
        let name = clauses[0].as_document().unwrap();
        match name.get("name") {
            Some(Bson::RegularExpression(re)) => assert_eq!(re.pattern, r"usb \(c\)"),
            other => panic!("unexpected name filter: {:?}", other),
        }
    }

    #[test]
    fn document_maps_to_product() {
        let doc = ProductDocument {
            _id: 12,
            name: "Trail Shoe".to_string(),
            description: None,
            price: 120.0,
            category: CategoryRef {
                name: "Footwear".to_string(),
                slug: "footwear".to_string(),
            },
            brand: Some(BrandRef {
                name: "Peak".to_string(),
            }),
            images: vec![
                ImageRef {
                    image_url: "/side.jpg".to_string(),
                    is_primary: false,
                    sort_order: 0,
                },
                ImageRef {
                    image_url: "/front.jpg".to_string(),
                    is_primary: true,
                    sort_order: 1,
                },
            ],
            reviews: vec![ReviewRef { rating: 4 }, ReviewRef { rating: 3 }],
            in_stock: false,
        };

        let product = Product::from(doc);
        assert_eq!(product.category, "footwear");
        assert_eq!(product.brand.as_deref(), Some("Peak"));
        assert_eq!(product.primary_image(), "/front.jpg");
        assert_eq!(product.average_rating(), 3.5);
        assert!(!product.in_stock);
    }
}
