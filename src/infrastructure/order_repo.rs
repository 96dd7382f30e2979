use std::str::FromStr;

use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    CustomerContact, OrderDraft, OrderLineView, OrderPage, OrderStatus, OrderView,
    ShippingAddress,
};
use crate::domain::ports::OrderStore;
use crate::schema::{notification_outbox, order_lines, orders, payments};

use super::models::{
    NewOrderLineRow, NewOrderRow, NewOutboxRow, NewPaymentRow, OrderLineRow, OrderRow,
};

impl From<OrderLineRow> for OrderLineView {
    fn from(row: OrderLineRow) -> Self {
        OrderLineView {
            id: row.id,
            product_id: row.product_id,
            product_title: row.product_title,
            variant_id: row.variant_id,
            variant_label: row.variant_label,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

fn order_view(row: OrderRow, lines: Vec<OrderLineRow>) -> Result<OrderView, DomainError> {
    Ok(OrderView {
        id: row.id,
        contact: CustomerContact {
            name: row.customer_name,
            email: row.email,
            phone: row.phone,
        },
        address: ShippingAddress {
            street: row.street,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            country: row.country,
        },
        status: OrderStatus::from_str(&row.status)?,
        total: row.total,
        created_at: row.created_at,
        updated_at: row.updated_at,
        lines: lines.into_iter().map(Into::into).collect(),
    })
}

pub struct DieselOrderStore {
    pool: DbPool,
}

impl DieselOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderStore for DieselOrderStore {
    /// Persists the whole aggregate in one transaction: the provisional
    /// PENDING order, the line snapshots, the final total, the settled
    /// payment record, and the notification outbox rows. The outbox entries
    /// are committed if and only if the order is.
    fn create(&self, draft: OrderDraft) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: draft.id,
                    customer_name: draft.contact.name.clone(),
                    email: draft.contact.email.clone(),
                    phone: draft.contact.phone.clone(),
                    street: draft.address.street.clone(),
                    city: draft.address.city.clone(),
                    state: draft.address.state.clone(),
                    postal_code: draft.address.postal_code.clone(),
                    country: draft.address.country.clone(),
                    status: OrderStatus::Pending.as_str().to_string(),
                })
                .execute(conn)?;

            let line_rows: Vec<NewOrderLineRow> = draft
                .lines
                .iter()
                .map(|l| NewOrderLineRow {
                    id: Uuid::new_v4(),
                    order_id: draft.id,
                    product_id: l.product_id,
                    product_title: l.product_title.clone(),
                    variant_id: l.variant_id,
                    variant_label: l.variant_label.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price.clone(),
                })
                .collect();
            diesel::insert_into(order_lines::table)
                .values(&line_rows)
                .execute(conn)?;

            // Lines are in place; the total becomes authoritative now.
            diesel::update(orders::table.filter(orders::id.eq(draft.id)))
                .set((
                    orders::total.eq(Some(draft.total.clone())),
                    orders::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)?;

            // No gateway: the payment is recorded as already settled.
            diesel::insert_into(payments::table)
                .values(&NewPaymentRow {
                    id: Uuid::new_v4(),
                    order_id: draft.id,
                    provider: draft.provider.as_str().to_string(),
                    status: "SETTLED".to_string(),
                    transaction_ref: None,
                })
                .execute(conn)?;

            let outbox_rows: Result<Vec<NewOutboxRow>, DomainError> = draft
                .notifications
                .iter()
                .map(|n| {
                    Ok(NewOutboxRow {
                        id: Uuid::new_v4(),
                        recipient: n.recipient.clone(),
                        template: n.payload.template().to_string(),
                        payload: serde_json::to_value(&n.payload)
                            .map_err(|e| DomainError::Internal(e.to_string()))?,
                    })
                })
                .collect();
            diesel::insert_into(notification_outbox::table)
                .values(&outbox_rows?)
                .execute(conn)?;

            let row = orders::table
                .filter(orders::id.eq(draft.id))
                .select(OrderRow::as_select())
                .first(conn)?;
            let lines = order_lines::table
                .filter(order_lines::order_id.eq(draft.id))
                .order(order_lines::created_at.asc())
                .select(OrderLineRow::as_select())
                .load(conn)?;

            order_view(row, lines)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = order_lines::table
            .filter(order_lines::order_id.eq(row.id))
            .order(order_lines::created_at.asc())
            .select(OrderLineRow::as_select())
            .load(&mut conn)?;

        order_view(row, lines).map(Some)
    }

    fn list(&self, page: i64, limit: i64) -> Result<OrderPage, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table.count().get_result(conn)?;

            let rows = orders::table
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            let items = rows
                .into_iter()
                .map(|row| order_view(row, vec![]))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(OrderPage { items, total })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use diesel::prelude::*;
    use uuid::Uuid;

    use super::DieselOrderStore;
    use crate::domain::catalog::NewProduct;
    use crate::domain::notification::{Notification, NotificationPayload};
    use crate::domain::order::{
        CustomerContact, LineSnapshot, OrderDraft, OrderStatus, PaymentProvider, ShippingAddress,
    };
    use crate::domain::ports::{CatalogStore, OrderStore};
    use crate::infrastructure::models::{OutboxRow, PaymentRow};
    use crate::infrastructure::testutil::setup_db;
    use crate::infrastructure::DieselCatalogStore;
    use crate::schema::{notification_outbox, payments, products};

    fn draft(id: Uuid) -> OrderDraft {
        OrderDraft {
            id,
            contact: CustomerContact {
                name: "Nadia K".to_string(),
                email: "nadia@example.com".to_string(),
                phone: "+212600000000".to_string(),
            },
            address: ShippingAddress {
                street: "12 Rue des Oliviers".to_string(),
                city: "Casablanca".to_string(),
                state: None,
                postal_code: "20000".to_string(),
                country: "MA".to_string(),
            },
            provider: PaymentProvider::Cod,
            lines: vec![LineSnapshot {
                product_id: Uuid::new_v4(),
                product_title: "Mug".to_string(),
                variant_id: None,
                variant_label: None,
                quantity: 2,
                unit_price: BigDecimal::from_str("9.99").expect("valid decimal"),
            }],
            total: BigDecimal::from_str("19.98").expect("valid decimal"),
            notifications: vec![Notification {
                recipient: "nadia@example.com".to_string(),
                payload: NotificationPayload::OrderConfirmation {
                    order_id: id,
                    customer_name: "Nadia K".to_string(),
                    total: "19.98".to_string(),
                },
            }],
        }
    }

    #[tokio::test]
    async fn create_persists_order_lines_payment_and_outbox() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderStore::new(pool.clone());
        let order_id = Uuid::new_v4();

        let view = repo.create(draft(order_id)).expect("create failed");

        assert_eq!(view.id, order_id);
        assert_eq!(view.status, OrderStatus::Pending);
        assert_eq!(view.total, Some(BigDecimal::from_str("19.98").unwrap()));
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].product_title, "Mug");

        let mut conn = pool.get().expect("Failed to get connection");
        let payment_rows: Vec<PaymentRow> = payments::table
            .filter(payments::order_id.eq(order_id))
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .expect("query failed");
        assert_eq!(payment_rows.len(), 1);
        assert_eq!(payment_rows[0].provider, "COD");
        assert_eq!(payment_rows[0].status, "SETTLED");

        let outbox_rows: Vec<OutboxRow> = notification_outbox::table
            .select(OutboxRow::as_select())
            .load(&mut conn)
            .expect("query failed");
        assert_eq!(outbox_rows.len(), 1, "one outbox row per notification");
        assert_eq!(outbox_rows[0].template, "order_confirmation");
        assert!(outbox_rows[0].dispatched_at.is_none());
    }

    #[tokio::test]
    async fn price_edit_after_checkout_leaves_snapshot_unchanged() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalogStore::new(pool.clone());
        let repo = DieselOrderStore::new(pool.clone());

        let product = catalog
            .insert_product(NewProduct {
                title: "Mug".to_string(),
                description: None,
                price: BigDecimal::from_str("9.99").expect("valid decimal"),
                has_variants: false,
                stock: 10,
                is_active: true,
            })
            .expect("insert failed");

        let order_id = Uuid::new_v4();
        let mut d = draft(order_id);
        d.lines[0].product_id = product.id;
        d.lines[0].unit_price = product.price.clone();
        repo.create(d).expect("create failed");

        // Reprice the product directly; persisted orders must not notice.
        let mut conn = pool.get().expect("Failed to get connection");
        diesel::update(products::table.filter(products::id.eq(product.id)))
            .set(products::price.eq(BigDecimal::from_str("14.99").unwrap()))
            .execute(&mut conn)
            .expect("update failed");

        let view = repo
            .find_by_id(order_id)
            .expect("find failed")
            .expect("order missing");
        assert_eq!(view.lines[0].unit_price, BigDecimal::from_str("9.99").unwrap());
        assert_eq!(view.total, Some(BigDecimal::from_str("19.98").unwrap()));
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown_id() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderStore::new(pool);

        let result = repo.find_by_id(Uuid::new_v4()).expect("find should not error");

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn list_paginates_correctly() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderStore::new(pool);

        for _ in 0..5 {
            repo.create(draft(Uuid::new_v4())).expect("create failed");
        }

        let page1 = repo.list(1, 3).expect("list page 1 failed");
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);

        let page2 = repo.list(2, 3).expect("list page 2 failed");
        assert_eq!(page2.total, 5);
        assert_eq!(page2.items.len(), 2);
    }
}
