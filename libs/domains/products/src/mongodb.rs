//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, Document, doc, to_bson},
    options::IndexOptions,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, FilterSpec, Product, UpdateProduct};
use crate::repository::ProductRepository;

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    /// Create a new MongoProductRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Product>("products");
        Self { collection }
    }

    /// Create a new MongoProductRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    /// Initialize indexes for the filterable fields
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "category": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_category".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "brand": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_brand".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "price": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_price".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    /// Build the MongoDB filter document from a FilterSpec
    ///
    /// All conditions are conjunctive except the free-text search, which is
    /// a disjunction over name, description, brand and category. The search
    /// string is regex-escaped so it matches as a literal substring.
    fn build_filter(spec: &FilterSpec) -> Document {
        let mut filter = doc! {};

        if !spec.include_deleted {
            // Absent, false and explicit false all pass; only true excludes
            filter.insert("deleted", doc! { "$ne": true });
        }

        if let Some(ref categories) = spec.categories {
            filter.insert("category", doc! { "$in": categories.clone() });
        }

        if let Some(ref brands) = spec.brands {
            filter.insert("brand", doc! { "$in": brands.clone() });
        }

        if let Some(ref search) = spec.search {
            let pattern = regex::escape(search);
            let clauses: Vec<Document> = ["name", "description", "brand", "category"]
                .iter()
                .map(|field| {
                    let mut clause = Document::new();
                    clause.insert(
                        *field,
                        doc! { "$regex": pattern.as_str(), "$options": "i" },
                    );
                    clause
                })
                .collect();
            filter.insert("$or", clauses);
        }

        filter
    }

    /// Sort document for the page query; None unless both `_sort` and
    /// `_order` arrived
    fn sort_document(spec: &FilterSpec) -> Option<Document> {
        spec.sort.as_ref().map(|(field, order)| {
            let mut sort = Document::new();
            sort.insert(field.clone(), order.direction());
            sort
        })
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        let product = Product::new(input);

        self.collection.insert_one(&product).await?;

        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let product = self.collection.find_one(filter).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn find_page(&self, spec: &FilterSpec) -> ProductResult<Vec<Product>> {
        use futures_util::TryStreamExt;

        let filter = Self::build_filter(spec);

        let mut options = mongodb::options::FindOptions::builder()
            .skip(spec.skip())
            .limit(spec.limit as i64)
            .build();
        options.sort = Self::sort_document(spec);

        let cursor = self.collection.find(filter).with_options(options).await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn count(&self, spec: &FilterSpec) -> ProductResult<u64> {
        // Same filter as find_page, no sort and no pagination
        let filter = Self::build_filter(spec);
        let count = self.collection.count_documents(filter).await?;
        Ok(count)
    }

    #[instrument(skip(self, input))]
    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let existing = self
            .collection
            .find_one(filter.clone())
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let mut updated = existing;
        updated.apply_update(input);

        // Fetch and replace are separate round trips; a conflicting write in
        // between is overwritten by this replace.
        self.collection.replace_one(filter, &updated).await?;

        tracing::info!(product_id = %id, "Product updated successfully");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListQuery, SortOrder};

    fn spec(query: ListQuery) -> FilterSpec {
        FilterSpec::from(query)
    }

    #[test]
    fn test_build_filter_excludes_deleted_by_default() {
        let filter = MongoProductRepository::build_filter(&spec(ListQuery::default()));
        assert_eq!(filter.get_document("deleted").unwrap(), &doc! { "$ne": true });
    }

    #[test]
    fn test_build_filter_admin_sees_deleted() {
        let filter = MongoProductRepository::build_filter(&spec(ListQuery {
            admin: true,
            ..Default::default()
        }));
        assert!(!filter.contains_key("deleted"));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_build_filter_with_categories() {
        let filter = MongoProductRepository::build_filter(&spec(ListQuery {
            category: Some("footwear, hats".to_string()),
            ..Default::default()
        }));

        let category = filter.get_document("category").unwrap();
        let members = category.get_array("$in").unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0], Bson::String("footwear".to_string()));
        assert_eq!(members[1], Bson::String("hats".to_string()));
    }

    #[test]
    fn test_build_filter_with_brands() {
        let filter = MongoProductRepository::build_filter(&spec(ListQuery {
            brand: Some("Acme".to_string()),
            ..Default::default()
        }));

        assert!(filter.contains_key("brand"));
    }

    #[test]
    fn test_build_filter_empty_list_matches_nothing() {
        let filter = MongoProductRepository::build_filter(&spec(ListQuery {
            category: Some(",".to_string()),
            ..Default::default()
        }));

        let members = filter
            .get_document("category")
            .unwrap()
            .get_array("$in")
            .unwrap();
        assert!(members.is_empty());
    }

    #[test]
    fn test_build_filter_search_covers_four_fields() {
        let filter = MongoProductRepository::build_filter(&spec(ListQuery {
            query: Some("shoe".to_string()),
            ..Default::default()
        }));

        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 4);

        let first = clauses[0].as_document().unwrap();
        let name_clause = first.get_document("name").unwrap();
        assert_eq!(name_clause.get_str("$regex").unwrap(), "shoe");
        assert_eq!(name_clause.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_build_filter_search_escapes_metacharacters() {
        let filter = MongoProductRepository::build_filter(&spec(ListQuery {
            query: Some("c++ (pro)".to_string()),
            ..Default::default()
        }));

        let clauses = filter.get_array("$or").unwrap();
        let name_clause = clauses[0].as_document().unwrap().get_document("name").unwrap();
        assert_eq!(name_clause.get_str("$regex").unwrap(), r"c\+\+ \(pro\)");
    }

    #[test]
    fn test_sort_document_requires_both_parameters() {
        assert_eq!(
            MongoProductRepository::sort_document(&spec(ListQuery::default())),
            None
        );

        let sorted = MongoProductRepository::sort_document(&spec(ListQuery {
            sort: Some("price".to_string()),
            order: Some(SortOrder::Desc),
            ..Default::default()
        }));
        assert_eq!(sorted, Some(doc! { "price": -1 }));
    }

    #[test]
    fn test_pagination_skip() {
        let paged = spec(ListQuery {
            page: Some(2),
            limit: Some(5),
            ..Default::default()
        });
        assert_eq!(paged.skip(), 5);
        assert_eq!(paged.limit, 5);
    }
}
