use thiserror::Error;

/// Failure taxonomy for the reservation core. Every variant that a client can
/// act on carries a stable reason code (see [`DomainError::code`]); the HTTP
/// layer maps those to status codes without losing the code itself.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Product not found")]
    ProductNotFound,
    #[error("Product variant not found")]
    VariantNotFound,
    #[error("Product is inactive")]
    ProductInactive,
    #[error("A variant must be selected for this product")]
    VariantRequired,
    #[error("A variant with this type and value already exists")]
    VariantExists,
    #[error("Insufficient stock")]
    OutOfStock,
    #[error("Event not found")]
    EventNotFound,
    #[error("Event is at capacity")]
    EventFull,
    #[error("This email is already registered for the event")]
    AlreadyRegistered,
    #[error("Not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Machine-readable reason code surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::ProductNotFound => "PRODUCT_NOT_FOUND",
            DomainError::VariantNotFound => "VARIANT_NOT_FOUND",
            DomainError::ProductInactive => "PRODUCT_INACTIVE",
            DomainError::VariantRequired => "VARIANT_REQUIRED",
            DomainError::VariantExists => "VARIANT_EXISTS",
            DomainError::OutOfStock => "OUT_OF_STOCK",
            DomainError::EventNotFound => "EVENT_NOT_FOUND",
            DomainError::EventFull => "EVENT_FULL",
            DomainError::AlreadyRegistered => "ALREADY_REGISTERED",
            DomainError::NotFound => "NOT_FOUND",
            DomainError::InvalidInput(_) => "INVALID_INPUT",
            DomainError::Internal(_) => "INTERNAL",
        }
    }
}
