use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of a queued notification. Serialised to JSONB in the outbox table
/// and rendered to subject/body only at dispatch time, so a template change
/// never requires touching queued rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    OrderConfirmation {
        order_id: Uuid,
        customer_name: String,
        total: String,
    },
    AdminNewOrder {
        order_id: Uuid,
        customer_name: String,
        email: String,
        phone: String,
        total: String,
    },
    RegistrationConfirmation {
        event_title: String,
        attendee_name: String,
    },
    AdminNewRegistration {
        event_title: String,
        attendee_name: String,
        email: String,
        phone: Option<String>,
    },
}

impl NotificationPayload {
    /// Stable template key stored alongside the payload for ad-hoc querying.
    pub fn template(&self) -> &'static str {
        match self {
            NotificationPayload::OrderConfirmation { .. } => "order_confirmation",
            NotificationPayload::AdminNewOrder { .. } => "admin_new_order",
            NotificationPayload::RegistrationConfirmation { .. } => "registration_confirmation",
            NotificationPayload::AdminNewRegistration { .. } => "admin_new_registration",
        }
    }

    pub fn subject(&self) -> String {
        match self {
            NotificationPayload::OrderConfirmation { .. } => "Your order confirmation".to_string(),
            NotificationPayload::AdminNewOrder { order_id, .. } => {
                format!("New order {order_id}")
            }
            NotificationPayload::RegistrationConfirmation { event_title, .. } => {
                format!("Registration confirmed - {event_title}")
            }
            NotificationPayload::AdminNewRegistration { event_title, .. } => {
                format!("New registration - {event_title}")
            }
        }
    }

    pub fn body(&self) -> String {
        match self {
            NotificationPayload::OrderConfirmation {
                order_id,
                customer_name,
                total,
            } => format!(
                "Hello {customer_name},\n\nThank you for your order {order_id}. \
                 The total amount is {total}. We will contact you once it ships."
            ),
            NotificationPayload::AdminNewOrder {
                order_id,
                customer_name,
                email,
                phone,
                total,
            } => format!(
                "Order {order_id} placed by {customer_name} ({email}, {phone}), total {total}."
            ),
            NotificationPayload::RegistrationConfirmation {
                event_title,
                attendee_name,
            } => format!(
                "Hello {attendee_name},\n\nYour registration for \"{event_title}\" is confirmed."
            ),
            NotificationPayload::AdminNewRegistration {
                event_title,
                attendee_name,
                email,
                phone,
            } => format!(
                "{attendee_name} ({email}{}) registered for \"{event_title}\".",
                phone
                    .as_deref()
                    .map(|p| format!(", {p}"))
                    .unwrap_or_default()
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub payload: NotificationPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_confirmation_mentions_event_and_attendee() {
        let payload = NotificationPayload::RegistrationConfirmation {
            event_title: "Morning Run".to_string(),
            attendee_name: "Sami".to_string(),
        };
        assert!(payload.subject().contains("Morning Run"));
        assert!(payload.body().contains("Sami"));
        assert_eq!(payload.template(), "registration_confirmation");
    }

    #[test]
    fn payload_roundtrips_through_json() {
        let payload = NotificationPayload::OrderConfirmation {
            order_id: Uuid::new_v4(),
            customer_name: "Nadia".to_string(),
            total: "59.98".to_string(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["kind"], "order_confirmation");
        let back: NotificationPayload = serde_json::from_value(value).unwrap();
        assert_eq!(back.template(), payload.template());
    }
}
