//! # Product Listing

use stand_core::Product;

use crate::error::AppResult;
use crate::state::AppState;

/// Active catalog, ordered by name.
pub async fn list(state: &AppState) -> AppResult<Vec<Product>> {
    Ok(state.db.products().list_active().await?)
}

/// `Pommes                3,50 €   7 %`
pub fn format_row(product: &Product) -> String {
    format!(
        "{:<20} {:>9} {:>5}{}",
        product.name,
        product.price().to_string(),
        product.tax_rate().to_string(),
        if product.is_deposit { "  (Pfand)" } else { "" }
    )
}
