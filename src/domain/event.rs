use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::notification::Notification;
use super::order::validate_email;

#[derive(Debug, Clone)]
pub struct EventView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: i32,
    pub registered_count: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: i32,
    pub status: String,
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::InvalidInput("title must not be blank".into()));
        }
        if self.capacity < 1 {
            return Err(DomainError::InvalidInput("capacity must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct EventRegistrationRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub accepted_terms: Option<bool>,
}

impl EventRegistrationRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("name must not be blank".into()));
        }
        validate_email(&self.email)
    }
}

/// Registration row plus the notifications announcing it; inserted in one
/// transaction after the seat has been reserved.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub accepted_terms: bool,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone)]
pub struct RegistrationView {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub accepted_terms: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EventPage {
    pub items: Vec<EventView>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_rejected() {
        let req = EventRegistrationRequest {
            name: "  ".to_string(),
            email: "someone@example.com".to_string(),
            phone: None,
            emergency_contact: None,
            accepted_terms: Some(true),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn zero_capacity_event_is_rejected() {
        let event = NewEvent {
            title: "Yoga in the park".to_string(),
            description: None,
            location: None,
            starts_at: Utc::now(),
            ends_at: None,
            capacity: 0,
            status: "PUBLISHED".to_string(),
        };
        assert!(event.validate().is_err());
    }
}
