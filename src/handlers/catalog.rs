use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{NewProduct, NewVariant, ProductView, VariantView};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogStore;
use crate::errors::AppError;
use crate::infrastructure::DieselCatalogStore;

use super::PageParams;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: Option<String>,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    #[serde(default)]
    pub has_variants: bool,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVariantRequest {
    /// Variant dimension, e.g. "SIZE" or "COLOR". Stored uppercased.
    pub variant_type: String,
    pub value: String,
    #[serde(default)]
    pub stock: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: String,
    pub has_variants: bool,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: String,
}

impl From<ProductView> for ProductResponse {
    fn from(p: ProductView) -> Self {
        ProductResponse {
            id: p.id,
            title: p.title,
            description: p.description,
            price: p.price.to_string(),
            has_variants: p.has_variants,
            stock: p.stock,
            is_active: p.is_active,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VariantResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_type: String,
    pub value: String,
    pub stock: i32,
}

impl From<VariantView> for VariantResponse {
    fn from(v: VariantView) -> Self {
        VariantResponse {
            id: v.id,
            product_id: v.product_id,
            variant_type: v.variant_type,
            value: v.value,
            stock: v.stock,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListProductsResponse {
    pub items: Vec<ProductResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

fn parse_price(raw: &str) -> Result<BigDecimal, DomainError> {
    BigDecimal::from_str(raw)
        .map_err(|e| DomainError::InvalidInput(format!("invalid price '{raw}': {e}")))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /products
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 422, description = "Invalid product"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn create_product(
    pool: web::Data<DbPool>,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let pool = pool.get_ref().clone();

    let view = web::block(move || {
        let product = NewProduct {
            title: body.title,
            description: body.description,
            price: parse_price(&body.price)?,
            has_variants: body.has_variants,
            stock: body.stock,
            is_active: body.is_active,
        };
        DieselCatalogStore::new(pool).insert_product(product)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(ProductResponse::from(view)))
}

/// POST /products/{id}/variants
#[utoipa::path(
    post,
    path = "/products/{id}/variants",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = CreateVariantRequest,
    responses(
        (status = 201, description = "Variant created", body = VariantResponse),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Variant already exists for this product"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn create_variant(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<CreateVariantRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let body = body.into_inner();
    let pool = pool.get_ref().clone();

    let view = web::block(move || {
        DieselCatalogStore::new(pool).insert_variant(NewVariant {
            product_id,
            variant_type: body.variant_type,
            value: body.value,
            stock: body.stock,
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(VariantResponse::from(view)))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn get_product(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let pool = pool.get_ref().clone();

    let result = web::block(move || DieselCatalogStore::new(pool).find_product(product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    match result {
        Some(product) => Ok(HttpResponse::Ok().json(ProductResponse::from(product))),
        None => Err(DomainError::ProductNotFound.into()),
    }
}

/// GET /products
///
/// Returns active products only, newest first.
#[utoipa::path(
    get,
    path = "/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of active products", body = ListProductsResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products(
    pool: web::Data<DbPool>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let (page, limit) = query.clamped();
    let pool = pool.get_ref().clone();

    let page_result = web::block(move || DieselCatalogStore::new(pool).list_active(page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListProductsResponse {
        items: page_result.items.into_iter().map(Into::into).collect(),
        total: page_result.total,
        page,
        limit,
    }))
}
