use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// Catalog view of a product. `stock` is only meaningful when
/// `has_variants` is false; variant products carry stock per variant.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub has_variants: bool,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct VariantView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_type: String,
    pub value: String,
    pub stock: i32,
}

impl VariantView {
    /// Display label frozen into order line snapshots, e.g. "SIZE:XL".
    pub fn label(&self) -> String {
        format!("{}:{}", self.variant_type, self.value)
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub has_variants: bool,
    pub stock: i32,
    pub is_active: bool,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::InvalidInput("title must not be blank".into()));
        }
        if self.stock < 0 {
            return Err(DomainError::InvalidInput("stock must not be negative".into()));
        }
        if self.price < BigDecimal::from(0) {
            return Err(DomainError::InvalidInput("price must not be negative".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewVariant {
    pub product_id: Uuid,
    pub variant_type: String,
    pub value: String,
    pub stock: i32,
}

impl NewVariant {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.variant_type.trim().is_empty() || self.value.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "variant type and value must not be blank".into(),
            ));
        }
        if self.stock < 0 {
            return Err(DomainError::InvalidInput("stock must not be negative".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<ProductView>,
    pub total: i64,
}
