use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Default page number when `_page` is absent or malformed
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size when `_limit` is absent or malformed
pub const DEFAULT_LIMIT: u32 = 10;

/// Sort direction for the `_order` query parameter
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// MongoDB sort direction (1 ascending, -1 descending)
    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

/// Product entity - represents a product stored in MongoDB
///
/// Wire names are camelCase for compatibility with existing storefront
/// clients. `discountPrice` is derived: it is recomputed from `price` and
/// `discountPercentage` on every create and update, and never read from
/// client input.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Product name
    pub name: String,
    /// Product description
    #[serde(default)]
    pub description: String,
    /// List price
    pub price: f64,
    /// Discount in percent, 0-100
    #[serde(default)]
    pub discount_percentage: f64,
    /// Derived price after discount, rounded to the nearest unit
    pub discount_price: f64,
    /// Category name (exact-match filterable)
    pub category: String,
    /// Brand name (exact-match filterable)
    pub brand: Option<String>,
    /// Current stock quantity
    #[serde(default)]
    pub stock: i32,
    /// Average customer rating, 0-5
    #[serde(default)]
    pub rating: Option<f64>,
    /// Thumbnail image URL
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Gallery image URLs
    #[serde(default)]
    pub images: Vec<String>,
    /// Soft-delete marker; deleted products stay in storage
    #[serde(default)]
    pub deleted: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new product
///
/// `discountPrice` is intentionally absent: it is always server-computed.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default)]
    pub discount_percentage: f64,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock: i32,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// DTO for partially updating an existing product
///
/// Setting `deleted: true` soft-deletes the product. `discountPrice` cannot
/// be supplied; it is recomputed from the post-update `price` and
/// `discountPercentage`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount_percentage: Option<f64>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    pub thumbnail: Option<String>,
    pub images: Option<Vec<String>>,
    pub deleted: Option<bool>,
}

/// Raw listing query parameters, one instance per request
///
/// Parameter names follow the storefront client contract (`_sort`, `_order`,
/// `_page`, `_limit`). `_page` and `_limit` parse leniently: a malformed or
/// non-positive value behaves as if the parameter were absent.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Include soft-deleted products (admin view); pass `admin=true`
    #[serde(default)]
    pub admin: bool,
    /// Comma-separated category names, e.g. `category=footwear,hats`
    pub category: Option<String>,
    /// Comma-separated brand names
    pub brand: Option<String>,
    /// Free-text search over name, description, brand and category
    pub query: Option<String>,
    /// Field to sort by; only applied together with `_order`
    #[serde(rename = "_sort")]
    pub sort: Option<String>,
    /// Sort direction, `asc` or `desc`; only applied together with `_sort`
    #[serde(rename = "_order")]
    pub order: Option<SortOrder>,
    /// Page number, 1-based; defaults to 1
    #[serde(rename = "_page", default, deserialize_with = "lenient_positive")]
    #[param(value_type = Option<u32>)]
    pub page: Option<u32>,
    /// Page size; defaults to 10, no upper bound
    #[serde(rename = "_limit", default, deserialize_with = "lenient_positive")]
    #[param(value_type = Option<u32>)]
    pub limit: Option<u32>,
}

/// Parse an optional positive integer, treating anything else as absent
fn lenient_positive<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|n| *n > 0))
}

/// Immutable, fully-resolved listing parameters
///
/// Built once per request from [`ListQuery`], then used to drive both the
/// count query and the page query, so the two always see the same filters.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    /// When false, records with `deleted == true` are excluded
    pub include_deleted: bool,
    /// `None` = no category filter; `Some(vec![])` matches nothing
    pub categories: Option<Vec<String>>,
    /// `None` = no brand filter; `Some(vec![])` matches nothing
    pub brands: Option<Vec<String>>,
    /// Trimmed, non-empty search text
    pub search: Option<String>,
    /// Sort field and direction; present only when both parameters arrived
    pub sort: Option<(String, SortOrder)>,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
}

impl FilterSpec {
    /// Number of records to skip before the requested page
    pub fn skip(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl From<ListQuery> for FilterSpec {
    fn from(query: ListQuery) -> Self {
        let split_csv = |raw: String| -> Vec<String> {
            raw.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        };

        Self {
            include_deleted: query.admin,
            categories: query.category.map(split_csv),
            brands: query.brand.map(split_csv),
            search: query
                .query
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            sort: query.sort.zip(query.order),
            page: query.page.unwrap_or(DEFAULT_PAGE),
            limit: query.limit.unwrap_or(DEFAULT_LIMIT),
        }
    }
}

/// One page of products plus the total count of the filtered universe
///
/// `total` is computed before pagination, so clients can derive the page
/// count regardless of `_page`/`_limit`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: u64,
}

/// Price after discount, rounded to the nearest unit
fn discounted_price(price: f64, discount_percentage: f64) -> f64 {
    (price * (1.0 - discount_percentage / 100.0)).round()
}

impl Product {
    /// Create a new product from the CreateProduct DTO
    pub fn new(input: CreateProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            discount_price: discounted_price(input.price, input.discount_percentage),
            name: input.name,
            description: input.description,
            price: input.price,
            discount_percentage: input.discount_percentage,
            category: input.category,
            brand: input.brand,
            stock: input.stock,
            rating: input.rating,
            thumbnail: input.thumbnail,
            images: input.images,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply partial updates, then recompute `discount_price` from the
    /// resulting `price`/`discount_percentage` pair
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(discount_percentage) = update.discount_percentage {
            self.discount_percentage = discount_percentage;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(brand) = update.brand {
            self.brand = Some(brand);
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(rating) = update.rating {
            self.rating = Some(rating);
        }
        if let Some(thumbnail) = update.thumbnail {
            self.thumbnail = Some(thumbnail);
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        if let Some(deleted) = update.deleted {
            self.deleted = deleted;
        }

        self.discount_price = discounted_price(self.price, self.discount_percentage);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input(name: &str, category: &str, price: f64, discount_percentage: f64) -> CreateProduct {
        CreateProduct {
            name: name.to_string(),
            description: String::new(),
            price,
            discount_percentage,
            category: category.to_string(),
            brand: None,
            stock: 0,
            rating: None,
            thumbnail: None,
            images: vec![],
        }
    }

    #[test]
    fn test_discount_price_on_create() {
        let red_shoe = Product::new(create_input("Red Shoe", "footwear", 100.0, 10.0));
        assert_eq!(red_shoe.discount_price, 90.0);

        let green_shoe = Product::new(create_input("Green Shoe", "footwear", 80.0, 25.0));
        assert_eq!(green_shoe.discount_price, 60.0);

        let blue_hat = Product::new(create_input("Blue Hat", "hats", 50.0, 0.0));
        assert_eq!(blue_hat.discount_price, 50.0);
    }

    #[test]
    fn test_discount_price_rounds_to_nearest_unit() {
        // 99.99 * 0.85 = 84.9915
        let product = Product::new(create_input("Widget", "tools", 99.99, 15.0));
        assert_eq!(product.discount_price, 85.0);
    }

    #[test]
    fn test_discount_defaults_to_zero() {
        let product = Product::new(create_input("Plain", "misc", 42.0, 0.0));
        assert_eq!(product.discount_price, product.price);
        assert!(!product.deleted);
    }

    #[test]
    fn test_apply_update_recomputes_discount_from_new_price() {
        let mut product = Product::new(create_input("Red Shoe", "footwear", 100.0, 10.0));

        product.apply_update(UpdateProduct {
            price: Some(200.0),
            ..Default::default()
        });

        assert_eq!(product.price, 200.0);
        assert_eq!(product.discount_percentage, 10.0);
        assert_eq!(product.discount_price, 180.0);
    }

    #[test]
    fn test_apply_update_recomputes_discount_from_new_percentage() {
        let mut product = Product::new(create_input("Red Shoe", "footwear", 100.0, 10.0));

        product.apply_update(UpdateProduct {
            discount_percentage: Some(50.0),
            ..Default::default()
        });

        assert_eq!(product.discount_price, 50.0);
    }

    #[test]
    fn test_apply_update_unrelated_field_keeps_discount_consistent() {
        let mut product = Product::new(create_input("Red Shoe", "footwear", 100.0, 10.0));

        product.apply_update(UpdateProduct {
            description: Some("Now with laces".to_string()),
            ..Default::default()
        });

        assert_eq!(product.discount_price, 90.0);
        assert_eq!(product.description, "Now with laces");
    }

    #[test]
    fn test_apply_update_soft_delete() {
        let mut product = Product::new(create_input("Red Shoe", "footwear", 100.0, 10.0));

        product.apply_update(UpdateProduct {
            deleted: Some(true),
            ..Default::default()
        });

        assert!(product.deleted);
    }

    #[test]
    fn test_filter_spec_defaults() {
        let spec = FilterSpec::from(ListQuery::default());

        assert!(!spec.include_deleted);
        assert_eq!(spec.categories, None);
        assert_eq!(spec.brands, None);
        assert_eq!(spec.search, None);
        assert_eq!(spec.sort, None);
        assert_eq!(spec.page, 1);
        assert_eq!(spec.limit, 10);
        assert_eq!(spec.skip(), 0);
    }

    #[test]
    fn test_filter_spec_splits_and_trims_csv() {
        let spec = FilterSpec::from(ListQuery {
            category: Some(" footwear, hats ,accessories".to_string()),
            ..Default::default()
        });

        assert_eq!(
            spec.categories,
            Some(vec![
                "footwear".to_string(),
                "hats".to_string(),
                "accessories".to_string()
            ])
        );
    }

    #[test]
    fn test_filter_spec_present_but_empty_list() {
        // `category=,` stays a present-but-empty filter that matches nothing,
        // unlike an absent parameter which applies no filter at all
        let spec = FilterSpec::from(ListQuery {
            category: Some(" , ".to_string()),
            ..Default::default()
        });

        assert_eq!(spec.categories, Some(vec![]));
    }

    #[test]
    fn test_filter_spec_blank_search_is_absent() {
        let spec = FilterSpec::from(ListQuery {
            query: Some("   ".to_string()),
            ..Default::default()
        });

        assert_eq!(spec.search, None);
    }

    #[test]
    fn test_filter_spec_trims_search() {
        let spec = FilterSpec::from(ListQuery {
            query: Some("  shoe ".to_string()),
            ..Default::default()
        });

        assert_eq!(spec.search, Some("shoe".to_string()));
    }

    #[test]
    fn test_filter_spec_sort_requires_both_parameters() {
        let only_sort = FilterSpec::from(ListQuery {
            sort: Some("price".to_string()),
            ..Default::default()
        });
        assert_eq!(only_sort.sort, None);

        let only_order = FilterSpec::from(ListQuery {
            order: Some(SortOrder::Desc),
            ..Default::default()
        });
        assert_eq!(only_order.sort, None);

        let both = FilterSpec::from(ListQuery {
            sort: Some("price".to_string()),
            order: Some(SortOrder::Desc),
            ..Default::default()
        });
        assert_eq!(both.sort, Some(("price".to_string(), SortOrder::Desc)));
    }

    #[test]
    fn test_filter_spec_pagination() {
        let spec = FilterSpec::from(ListQuery {
            page: Some(2),
            limit: Some(5),
            ..Default::default()
        });

        assert_eq!(spec.page, 2);
        assert_eq!(spec.limit, 5);
        assert_eq!(spec.skip(), 5);
    }

    #[test]
    fn test_list_query_lenient_page_parsing() {
        let query: ListQuery =
            serde_json::from_value(serde_json::json!({ "_page": "3", "_limit": "25" })).unwrap();
        assert_eq!(query.page, Some(3));
        assert_eq!(query.limit, Some(25));

        let malformed: ListQuery =
            serde_json::from_value(serde_json::json!({ "_page": "abc", "_limit": "-4" })).unwrap();
        assert_eq!(malformed.page, None);
        assert_eq!(malformed.limit, None);

        let zero: ListQuery =
            serde_json::from_value(serde_json::json!({ "_page": "0", "_limit": "0" })).unwrap();
        assert_eq!(FilterSpec::from(zero).page, 1);
    }

    #[test]
    fn test_sort_order_directions() {
        assert_eq!(SortOrder::Asc.direction(), 1);
        assert_eq!(SortOrder::Desc.direction(), -1);
        assert_eq!(SortOrder::Asc.to_string(), "asc");
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
    }
}
