use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::CheckoutService;
use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    CreateOrderRequest, CustomerContact, OrderLineRequest, OrderLineView, OrderView,
    PaymentProvider, ShippingAddress,
};
use crate::domain::ports::OrderStore;
use crate::errors::AppError;
use crate::infrastructure::{DieselCatalogStore, DieselOrderStore};
use crate::AppConfig;

use super::PageParams;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AddressDto {
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutLineRequest {
    pub product_id: Uuid,
    /// Required when the product has variants, ignored otherwise.
    pub variant_id: Option<Uuid>,
    pub qty: i32,
}

/// Checkout payload. Prices are never accepted from the client; every line is
/// priced from the catalog on the server.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub address: AddressDto,
    /// Payment provider, "TEST" or "COD" (case-insensitive).
    pub provider: String,
    pub items: Vec<CheckoutLineRequest>,
}

impl CheckoutRequest {
    fn into_domain(self) -> Result<CreateOrderRequest, DomainError> {
        Ok(CreateOrderRequest {
            contact: CustomerContact {
                name: self.customer_name,
                email: self.email,
                phone: self.phone,
            },
            address: ShippingAddress {
                street: self.address.street,
                city: self.address.city,
                state: self.address.state,
                postal_code: self.address.postal_code,
                country: self.address.country,
            },
            provider: self.provider.parse::<PaymentProvider>()?,
            items: self
                .items
                .into_iter()
                .map(|l| OrderLineRequest {
                    product_id: l.product_id,
                    variant_id: l.variant_id,
                    qty: l.qty,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_title: String,
    pub variant_id: Option<Uuid>,
    pub variant_label: Option<String>,
    pub quantity: i32,
    pub unit_price: String,
}

impl From<OrderLineView> for OrderLineResponse {
    fn from(l: OrderLineView) -> Self {
        OrderLineResponse {
            id: l.id,
            product_id: l.product_id,
            product_title: l.product_title,
            variant_id: l.variant_id,
            variant_label: l.variant_label,
            quantity: l.quantity,
            unit_price: l.unit_price.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub address: AddressDto,
    pub status: String,
    pub total: Option<String>,
    pub created_at: String,
    pub lines: Vec<OrderLineResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        OrderResponse {
            id: o.id,
            customer_name: o.contact.name,
            email: o.contact.email,
            phone: o.contact.phone,
            address: AddressDto {
                street: o.address.street,
                city: o.address.city,
                state: o.address.state,
                postal_code: o.address.postal_code,
                country: o.address.country,
            },
            status: o.status.as_str().to_string(),
            total: o.total.map(|t| t.to_string()),
            created_at: o.created_at.to_rfc3339(),
            lines: o.lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Prices every line from the catalog, reserves stock atomically per line,
/// and persists the order, its line snapshots, the settled payment, and the
/// notification outbox rows in a single transaction. A failure at any point
/// releases whatever stock was already reserved.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 404, description = "Unknown product or variant"),
        (status = 409, description = "Insufficient stock"),
        (status = 422, description = "Invalid request"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let pool = pool.get_ref().clone();
    let admin_email = config.admin_email.clone();

    let view = web::block(move || {
        let req = body.into_domain()?;
        let service = CheckoutService::new(
            DieselCatalogStore::new(pool.clone()),
            DieselOrderStore::new(pool),
            admin_email,
        );
        service.create_order(req)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OrderResponse::from(view)))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let pool = pool.get_ref().clone();

    let result = web::block(move || DieselOrderStore::new(pool).find_by_id(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    match result {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(order))),
        None => Err(DomainError::NotFound.into()),
    }
}

/// GET /orders
///
/// Returns a paginated list of orders, newest first, without their lines.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    pool: web::Data<DbPool>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let (page, limit) = query.clamped();
    let pool = pool.get_ref().clone();

    let page_result = web::block(move || DieselOrderStore::new(pool).list(page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: page_result.items.into_iter().map(Into::into).collect(),
        total: page_result.total,
        page,
        limit,
    }))
}
