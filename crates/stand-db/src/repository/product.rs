//! # Product Repository
//!
//! The stand's small catalog. Products are only a convenience for building
//! cart lines: once sold, an order item keeps its own copy of name, price
//! and tax rate, so edits here never change the ledger.
//!
//! ## Default Catalog
//! ```text
//! ┌───────────────┬────────┬────────┬──────────┐
//! │ Name          │ Price  │ VAT    │ Deposit  │
//! ├───────────────┼────────┼────────┼──────────┤
//! │ Pommes        │ 3,50 € │  7 %   │          │
//! │ Cola 0.5L     │ 2,50 € │ 19 %   │          │
//! │ Pfand         │ 0,50 € │  0 %   │    ✓     │
//! └───────────────┴────────┴────────┴──────────┘
//! ```

use sqlx::SqlitePool;
use stand_core::{Product, TaxRate};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str =
    "id, name, price_cents, tax_rate_bp, category, active, color_hex, symbol, is_deposit, event_id";

/// Fields for a product that does not have an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    pub tax_rate: TaxRate,
    pub category: Option<String>,
    pub color_hex: Option<String>,
    pub symbol: Option<String>,
    pub is_deposit: bool,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price_cents: i64, tax_rate: TaxRate) -> Self {
        NewProduct {
            name: name.into(),
            price_cents,
            tax_rate,
            category: None,
            color_hex: None,
            symbol: None,
            is_deposit: false,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn color(mut self, hex: impl Into<String>) -> Self {
        self.color_hex = Some(hex.into());
        self
    }

    pub fn deposit(mut self) -> Self {
        self.is_deposit = true;
        self
    }
}

/// The catalog a fresh install starts with.
pub fn default_products() -> Vec<NewProduct> {
    vec![
        NewProduct::new("Pommes", 350, TaxRate::from_bps(700))
            .category("ESSEN")
            .color("#F5C542"),
        NewProduct::new("Cola 0.5L", 250, TaxRate::from_bps(1900))
            .category("GETRÄNK")
            .color("#B22222"),
        NewProduct::new("Pfand", 50, TaxRate::zero())
            .category("SYSTEM")
            .deposit(),
    ]
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let pommes = repo.find_by_name("pommes").await?;
/// let line = CartLine::from_product(&pommes.unwrap(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Active products sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Case-insensitive lookup of an active product by exact name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE active = 1 AND name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1"
        ))
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// The active deposit product, if the catalog has one.
    pub async fn deposit_product(&self) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE active = 1 AND is_deposit = 1 ORDER BY id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product and returns it with its id.
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        debug!(name = %product.name, "Inserting product");

        let id = sqlx::query(
            r#"
            INSERT INTO products (name, price_cents, tax_rate_bp, category, active, color_hex, symbol, is_deposit)
            VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.tax_rate.bps())
        .bind(&product.category)
        .bind(&product.color_hex)
        .bind(&product.symbol)
        .bind(product.is_deposit)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id.to_string()))
    }

    /// Counts all products, active or not.
    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts [`default_products`] when the table is empty.
    ///
    /// Returns how many rows were inserted (0 when products already exist).
    pub async fn seed_defaults_if_empty(&self) -> DbResult<usize> {
        if self.count().await? > 0 {
            return Ok(0);
        }

        let defaults = default_products();
        for product in &defaults {
            self.insert(product).await?;
        }

        info!(count = defaults.len(), "Seeded default products");
        Ok(defaults.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn setup() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    #[tokio::test]
    async fn test_seed_defaults_once() {
        let repo = setup().await;
        assert_eq!(repo.seed_defaults_if_empty().await.unwrap(), 3);
        assert_eq!(repo.seed_defaults_if_empty().await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 3);

        let names: Vec<String> = repo
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Cola 0.5L", "Pfand", "Pommes"]);
    }

    #[tokio::test]
    async fn test_find_by_name_and_deposit() {
        let repo = setup().await;
        repo.seed_defaults_if_empty().await.unwrap();

        let pommes = repo.find_by_name("POMMES").await.unwrap().unwrap();
        assert_eq!(pommes.price_cents, 350);
        assert_eq!(pommes.tax_rate_bp, 700);
        assert!(repo.find_by_name("Bratwurst").await.unwrap().is_none());

        let pfand = repo.deposit_product().await.unwrap().unwrap();
        assert!(pfand.is_deposit);
        assert_eq!(pfand.price_cents, 50);
    }

    #[tokio::test]
    async fn test_insert_is_found_by_name() {
        let repo = setup().await;
        let wurst = repo
            .insert(&NewProduct::new("Bratwurst", 400, TaxRate::from_bps(700)))
            .await
            .unwrap();
        assert!(wurst.active);
        assert!(!wurst.is_deposit);

        let found = repo.find_by_name("bratwurst").await.unwrap().unwrap();
        assert_eq!(found.id, wurst.id);
        assert_eq!(repo.get_by_id(wurst.id).await.unwrap(), Some(wurst));
        assert!(repo.get_by_id(9_999).await.unwrap().is_none());
    }
}
