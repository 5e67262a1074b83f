//! Product catalog: admin-managed records plus the public storefront view.
//!
//! The admin surface is gated the same way as moderation — refused at the
//! boundary for anything but an admin session. The storefront listing is
//! public and degrades to an empty shelf when the store read fails.

use crate::error::{AppError, Result};
use crate::models::{MediaType, Product};
use crate::session::SessionContext;
use crate::storage::{ProductFields, Storage};
use serde::Deserialize;
use tracing::{info, warn};

/// Form-shaped payload from the admin product form. Prices, ratings and
/// review counts stay free-form display strings; compatibility is a CSV and
/// the detailed description is one feature line per newline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub original_price: String,
    #[serde(default)]
    pub discount: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub reviews: String,
    #[serde(default)]
    pub compatibility: String,
    #[serde(default)]
    pub detailed_description: String,
    /// Reference from a prior upload; absent keeps the existing media.
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub doc_url: Option<String>,
}

impl ProductForm {
    pub fn into_fields(self) -> ProductFields {
        ProductFields {
            title: self.title,
            description: self.description,
            price: self.price,
            original_price: self.original_price,
            discount: self.discount,
            rating: self.rating,
            reviews: self.reviews,
            compatibility: self
                .compatibility
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            detailed_description: self
                .detailed_description
                .split('\n')
                .map(|s| s.to_string())
                .collect(),
            media_url: self.media_url,
            media_type: self.media_type,
            doc_url: self.doc_url,
        }
    }
}

/// Admin handle over the products collection.
pub struct Catalog {
    storage: Storage,
}

impl Catalog {
    pub fn admin(storage: Storage, session: &SessionContext) -> Result<Self> {
        if !session.is_admin() {
            return Err(AppError::Unauthorized);
        }
        Ok(Self { storage })
    }

    pub fn create(&self, form: ProductForm) -> Result<Product> {
        let product = self.storage.create_product(form.into_fields())?;
        info!(product = %product.id, "product created");
        Ok(product)
    }

    pub fn update(&self, id: &str, form: ProductForm) -> Result<Product> {
        let product = self.storage.update_product(id, form.into_fields())?;
        info!(product = %product.id, "product updated");
        Ok(product)
    }

    /// Deletes explicitly by admin action. Returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let existed = self.storage.delete_product(id)?;
        if existed {
            info!(product = %id, "product deleted");
        }
        Ok(existed)
    }

    pub fn list(&self) -> Result<Vec<Product>> {
        self.storage.list_products()
    }
}

/// Public storefront listing, newest first. A failed read is logged for
/// operators and rendered as "no products" rather than an error.
pub fn storefront(storage: &Storage) -> Vec<Product> {
    match storage.list_products() {
        Ok(mut products) => {
            products.sort_by_key(|p| {
                std::cmp::Reverse(p.created_at.map(|t| t.timestamp_millis()).unwrap_or(0))
            });
            products
        }
        Err(err) => {
            warn!(error = %err, "storefront read failed, rendering empty");
            Vec::new()
        }
    }
}
