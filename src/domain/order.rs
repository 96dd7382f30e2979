use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::notification::Notification;

#[derive(Debug, Clone)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
    Test,
    Cod,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Test => "TEST",
            PaymentProvider::Cod => "COD",
        }
    }
}

impl FromStr for PaymentProvider {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TEST" => Ok(PaymentProvider::Test),
            "COD" => Ok(PaymentProvider::Cod),
            other => Err(DomainError::InvalidInput(format!(
                "unknown payment provider '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PAID" => Ok(OrderStatus::Paid),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::Internal(format!("unknown order status '{other}'"))),
        }
    }
}

/// One line of an incoming checkout request. Quantities are validated before
/// any store call is made; the unit price is never part of the request.
#[derive(Debug, Clone)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub qty: i32,
}

#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub contact: CustomerContact,
    pub address: ShippingAddress,
    pub provider: PaymentProvider,
    pub items: Vec<OrderLineRequest>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.contact.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("customer name must not be blank".into()));
        }
        validate_email(&self.contact.email)?;
        if self.contact.phone.trim().is_empty() {
            return Err(DomainError::InvalidInput("phone must not be blank".into()));
        }
        for field in [
            &self.address.street,
            &self.address.city,
            &self.address.postal_code,
            &self.address.country,
        ] {
            if field.trim().is_empty() {
                return Err(DomainError::InvalidInput("incomplete shipping address".into()));
            }
        }
        if self.items.is_empty() {
            return Err(DomainError::InvalidInput("order must contain at least one item".into()));
        }
        for line in &self.items {
            if line.qty < 1 {
                return Err(DomainError::InvalidInput(format!(
                    "quantity must be at least 1 for product {}",
                    line.product_id
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_email(email: &str) -> Result<(), DomainError> {
    let email = email.trim();
    // Deliberately shallow: reject the obviously malformed, let the mail
    // transport be the real judge.
    let well_formed = email.contains('@')
        && !email.starts_with('@')
        && !email.ends_with('@')
        && !email.contains(char::is_whitespace);
    if well_formed {
        Ok(())
    } else {
        Err(DomainError::InvalidInput(format!("invalid email '{email}'")))
    }
}

/// Frozen copy of the catalog state a line was priced against. Later edits to
/// the product or variant never reach back into a persisted order.
#[derive(Debug, Clone)]
pub struct LineSnapshot {
    pub product_id: Uuid,
    pub product_title: String,
    pub variant_id: Option<Uuid>,
    pub variant_label: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// Everything the order store persists in one transaction: the order row,
/// its line snapshots, the settled payment record, and the notification
/// outbox entries announcing it.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub id: Uuid,
    pub contact: CustomerContact,
    pub address: ShippingAddress,
    pub provider: PaymentProvider,
    pub lines: Vec<LineSnapshot>,
    pub total: BigDecimal,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_title: String,
    pub variant_id: Option<Uuid>,
    pub variant_label: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub contact: CustomerContact,
    pub address: ShippingAddress,
    pub status: OrderStatus,
    pub total: Option<BigDecimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub items: Vec<OrderView>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateOrderRequest {
        CreateOrderRequest {
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
            items: vec![OrderLineRequest {
                product_id: Uuid::new_v4(),
                variant_id: None,
                qty: 2,
            }],
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut req = valid_request();
        req.items[0].qty = 0;
        assert!(matches!(req.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let mut req = valid_request();
        req.items[0].qty = -3;
        assert!(matches!(req.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn empty_items_are_rejected() {
        let mut req = valid_request();
        req.items.clear();
        assert!(matches!(req.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut req = valid_request();
        req.contact.email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("cod".parse::<PaymentProvider>().unwrap(), PaymentProvider::Cod);
        assert_eq!("TEST".parse::<PaymentProvider>().unwrap(), PaymentProvider::Test);
        assert!("PAYPAL".parse::<PaymentProvider>().is_err());
    }

    #[test]
    fn order_status_roundtrips() {
        for status in [OrderStatus::Pending, OrderStatus::Paid, OrderStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }
}
