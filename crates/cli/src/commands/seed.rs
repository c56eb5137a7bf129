//! Seed the catalog from a YAML file.
//!
//! The file is parsed and validated with the same rules the API applies
//! before any database connection is opened; a file with errors inserts
//! nothing.
//!
//! ```yaml
//! categories:
//!   - name: Kitchen
//!     products:
//!       - name: Kettle
//!         description: 1.7l stainless steel
//!         price: "24.99"
//!         image: https://cdn.example.com/kettle.jpg
//!         quantity: 12
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use executive_api::db::{CategoryStore, PgStore, ProductStore};
use executive_api::models::{Category, CreateCategoryPayload, Product, ProductPayload};

use super::migrate::database_url;

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub quantity: i32,
}

/// A category and the products to insert under it.
pub type CatalogEntry = (Category, Vec<Product>);

/// Turn the file into entities, collecting every validation error.
///
/// # Errors
///
/// Returns one message per invalid category or product.
pub fn build_catalog(
    file: CatalogFile,
    now: DateTime<Utc>,
) -> Result<Vec<CatalogEntry>, Vec<String>> {
    let mut entries = Vec::with_capacity(file.categories.len());
    let mut errors = Vec::new();

    for (ci, seed) in file.categories.into_iter().enumerate() {
        let label = seed.name.clone();
        let category = match (CreateCategoryPayload { name: seed.name }).into_category(now) {
            Ok(category) => category,
            Err(e) => {
                errors.push(format!("category {ci}: {e}"));
                continue;
            }
        };

        let mut products = Vec::with_capacity(seed.products.len());
        for (pi, product) in seed.products.into_iter().enumerate() {
            let payload = ProductPayload {
                name: product.name,
                description: product.description,
                price: product.price,
                image: product.image,
                category_id: category.id.to_string(),
                quantity: product.quantity,
            };
            match payload.validate() {
                Ok(fields) => products.push(fields.into_new_product(now)),
                Err(e) => errors.push(format!("category '{label}', product {pi}: {e}")),
            }
        }
        entries.push((category, products));
    }

    if errors.is_empty() {
        Ok(entries)
    } else {
        Err(errors)
    }
}

/// Seed categories and products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or an insert fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;

    let entries = match build_catalog(file, Utc::now()) {
        Ok(entries) => entries,
        Err(errors) => {
            error!("Catalog validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };

    info!(categories = entries.len(), "Catalog validated successfully");

    let pool = executive_api::db::create_pool(&database_url()?).await?;
    let store = PgStore::new(pool);
    info!("Connected to database");

    let mut inserted = 0usize;
    for (category, products) in &entries {
        store.create_category(category).await?;
        for product in products {
            store.create_product(product).await?;
            inserted += 1;
        }
        info!(category = %category.name, products = products.len(), "Seeded category");
    }

    info!("Seeding complete!");
    info!("  Categories inserted: {}", entries.len());
    info!("  Products inserted: {inserted}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> CatalogFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_build_catalog_links_products() {
        let file = parse(
            r#"
categories:
  - name: Kitchen
    products:
      - name: Kettle
        price: "24.99"
        quantity: 12
      - name: Toaster
        price: 40
  - name: Garden
"#,
        );
        let entries = build_catalog(file, Utc::now()).unwrap();
        assert_eq!(entries.len(), 2);

        let (kitchen, products) = &entries[0];
        assert_eq!(kitchen.name, "Kitchen");
        assert_eq!(products.len(), 2);
        assert!(products.iter().all(|p| p.category_id == kitchen.id));
        assert_eq!(products[0].price, Decimal::new(2499, 2));
        assert!(entries[1].1.is_empty());
    }

    #[test]
    fn test_build_catalog_collects_all_errors() {
        let file = parse(
            r#"
categories:
  - name: "  "
  - name: Tools
    products:
      - name: Hammer
        price: 0
      - name: ""
        price: 3
      - name: Saw
        price: 9
        quantity: -1
"#,
        );
        let errors = build_catalog(file, Utc::now()).unwrap_err();
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors[0].starts_with("category 0"));
        assert!(errors[1].contains("product 0"));
    }
}
