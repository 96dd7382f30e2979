use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::notification::{Notification, NotificationPayload};
use crate::domain::order::{CreateOrderRequest, LineSnapshot, OrderDraft, OrderView};
use crate::domain::ports::{CatalogStore, OrderStore, StockTarget};

/// One request line after the pricing pass: catalog state frozen, reservation
/// target resolved, nothing mutated yet.
#[derive(Debug)]
struct PricedLine {
    target: StockTarget,
    snapshot: LineSnapshot,
}

/// Turns a multi-line purchase request into a durable order without ever
/// overselling stock. Totals are computed from catalog prices held by the
/// store, never from the request.
pub struct CheckoutService<C, O> {
    catalog: C,
    orders: O,
    admin_email: Option<String>,
}

impl<C: CatalogStore, O: OrderStore> CheckoutService<C, O> {
    pub fn new(catalog: C, orders: O, admin_email: Option<String>) -> Self {
        Self {
            catalog,
            orders,
            admin_email,
        }
    }

    /// Three phases, in order:
    ///
    /// 1. Pricing pass: validate every line and freeze its snapshot. No store
    ///    mutation happens here, so any business-rule rejection leaves
    ///    inventory untouched.
    /// 2. Reservation pass: one atomic conditional decrement per line, in
    ///    request order. An `OutOfStock` at line k releases lines 0..k before
    ///    propagating, so a failed checkout never leaks reserved stock.
    /// 3. Persistence: order, line snapshots, settled payment, and
    ///    notification outbox rows in a single transaction. A persistence
    ///    failure also releases every reservation.
    pub fn create_order(&self, req: CreateOrderRequest) -> Result<OrderView, DomainError> {
        req.validate()?;

        let mut total = BigDecimal::from(0);
        let mut priced: Vec<PricedLine> = Vec::with_capacity(req.items.len());

        for line in &req.items {
            let product = self
                .catalog
                .find_product(line.product_id)?
                .ok_or(DomainError::ProductNotFound)?;
            if !product.is_active {
                return Err(DomainError::ProductInactive);
            }

            let (target, variant_id, variant_label) = if product.has_variants {
                let variant_id = line.variant_id.ok_or(DomainError::VariantRequired)?;
                let variant = self
                    .catalog
                    .find_variant(variant_id)?
                    .filter(|v| v.product_id == product.id)
                    .ok_or(DomainError::VariantNotFound)?;
                (
                    StockTarget::Variant(variant.id),
                    Some(variant.id),
                    Some(variant.label()),
                )
            } else {
                // A variant supplied for a non-variant product is ignored;
                // the product's own stock is authoritative.
                (StockTarget::Product(product.id), None, None)
            };

            total += &product.price * BigDecimal::from(line.qty);
            priced.push(PricedLine {
                target,
                snapshot: LineSnapshot {
                    product_id: product.id,
                    product_title: product.title,
                    variant_id,
                    variant_label,
                    quantity: line.qty,
                    unit_price: product.price,
                },
            });
        }

        let mut reserved: Vec<(StockTarget, i32)> = Vec::with_capacity(priced.len());
        for line in &priced {
            if let Err(e) = self.catalog.reserve(line.target, line.snapshot.quantity) {
                self.release_all(&reserved);
                return Err(e);
            }
            reserved.push((line.target, line.snapshot.quantity));
        }

        let order_id = Uuid::new_v4();
        let customer_email = req.contact.email.trim().to_lowercase();

        let mut notifications = vec![Notification {
            recipient: customer_email.clone(),
            payload: NotificationPayload::OrderConfirmation {
                order_id,
                customer_name: req.contact.name.clone(),
                total: total.to_string(),
            },
        }];
        if let Some(admin) = &self.admin_email {
            notifications.push(Notification {
                recipient: admin.clone(),
                payload: NotificationPayload::AdminNewOrder {
                    order_id,
                    customer_name: req.contact.name.clone(),
                    email: customer_email.clone(),
                    phone: req.contact.phone.clone(),
                    total: total.to_string(),
                },
            });
        }

        let draft = OrderDraft {
            id: order_id,
            contact: crate::domain::order::CustomerContact {
                email: customer_email,
                ..req.contact
            },
            address: req.address,
            provider: req.provider,
            lines: priced.into_iter().map(|l| l.snapshot).collect(),
            total,
            notifications,
        };

        match self.orders.create(draft) {
            Ok(view) => {
                log::info!("order {} created, total {:?}", view.id, view.total);
                Ok(view)
            }
            Err(e) => {
                self.release_all(&reserved);
                Err(e)
            }
        }
    }

    fn release_all(&self, reserved: &[(StockTarget, i32)]) {
        for (target, qty) in reserved {
            if let Err(e) = self.catalog.release(*target, *qty) {
                // Nothing left to unwind into; flag for operational cleanup.
                log::error!("failed to release reservation {target:?} x{qty}: {e}");
            }
        }
    }

    pub fn get_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        self.orders.find_by_id(id)
    }

    pub fn list_orders(&self, page: i64, limit: i64) -> Result<crate::domain::order::OrderPage, DomainError> {
        self.orders.list(page, limit)
    }
}
