use uuid::Uuid;

use super::catalog::{NewProduct, NewVariant, ProductPage, ProductView, VariantView};
use super::errors::DomainError;
use super::event::{EventPage, EventView, NewEvent, NewRegistration, RegistrationView};
use super::order::{OrderDraft, OrderPage, OrderView};

/// Which counter a reservation targets: a product's own stock or one of its
/// variants'. The two stores are structurally identical from the caller's
/// point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTarget {
    Product(Uuid),
    Variant(Uuid),
}

pub trait CatalogStore: Send + Sync + 'static {
    fn insert_product(&self, product: NewProduct) -> Result<ProductView, DomainError>;
    fn insert_variant(&self, variant: NewVariant) -> Result<VariantView, DomainError>;
    fn find_product(&self, id: Uuid) -> Result<Option<ProductView>, DomainError>;
    fn find_variant(&self, id: Uuid) -> Result<Option<VariantView>, DomainError>;
    fn list_active(&self, page: i64, limit: i64) -> Result<ProductPage, DomainError>;

    /// Atomically decrement the target's stock by `quantity` iff the current
    /// stock is at least `quantity`. One conditional UPDATE at the store; the
    /// counter can never go negative. Returns `OutOfStock` when nothing
    /// matched; callers must not blindly retry.
    fn reserve(&self, target: StockTarget, quantity: i32) -> Result<(), DomainError>;

    /// Compensating increment, used only to unwind reservations when a later
    /// step of the same request fails.
    fn release(&self, target: StockTarget, quantity: i32) -> Result<(), DomainError>;
}

pub trait OrderStore: Send + Sync + 'static {
    /// Persist the order, its line snapshots, the settled payment record, and
    /// the notification outbox rows in a single transaction.
    fn create(&self, draft: OrderDraft) -> Result<OrderView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list(&self, page: i64, limit: i64) -> Result<OrderPage, DomainError>;
}

pub trait EventStore: Send + Sync + 'static {
    fn insert_event(&self, event: NewEvent) -> Result<EventView, DomainError>;
    fn find_event(&self, id: Uuid) -> Result<Option<EventView>, DomainError>;
    fn list_events(&self, page: i64, limit: i64) -> Result<EventPage, DomainError>;
    fn find_registration(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<Option<RegistrationView>, DomainError>;
    fn list_registrations(&self, event_id: Uuid) -> Result<Vec<RegistrationView>, DomainError>;

    /// Atomically take one seat: increment `registered_count` iff it is
    /// strictly below `capacity`, as a single conditional UPDATE. Returns
    /// false when the event is full (or does not exist).
    fn admit_one(&self, event_id: Uuid) -> Result<bool, DomainError>;

    /// Compensating decrement for a seat taken by `admit_one` when the
    /// registration insert afterwards fails.
    fn release_seat(&self, event_id: Uuid) -> Result<(), DomainError>;

    /// Insert the registration and its notification outbox rows in one
    /// transaction. A `(event_id, email)` unique violation surfaces as
    /// `AlreadyRegistered`.
    fn create_registration(&self, reg: NewRegistration) -> Result<RegistrationView, DomainError>;
}

/// Transport behind the notification dispatcher. Only a logging
/// implementation ships; a real mail transport plugs in here.
pub trait Mailer: Send + Sync + 'static {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), DomainError>;
}
