use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::event::{EventRegistrationRequest, EventView, NewRegistration, RegistrationView};
use crate::domain::notification::{Notification, NotificationPayload};
use crate::domain::ports::EventStore;

/// Admits an attendee into an event within capacity, at most once per email.
///
/// The seat is taken by an atomic conditional increment *before* the
/// registration row is inserted, so two racing requests near the capacity
/// boundary can never both be admitted. If the insert then fails (for
/// instance a duplicate-email race that slipped past the pre-check), the
/// seat is released again.
pub struct RegistrationService<E> {
    events: E,
    admin_email: Option<String>,
}

impl<E: EventStore> RegistrationService<E> {
    pub fn new(events: E, admin_email: Option<String>) -> Self {
        Self { events, admin_email }
    }

    pub fn register(
        &self,
        event_id: Uuid,
        req: EventRegistrationRequest,
    ) -> Result<RegistrationView, DomainError> {
        req.validate()?;
        let email = req.email.trim().to_lowercase();

        let event = self
            .events
            .find_event(event_id)?
            .ok_or(DomainError::EventNotFound)?;

        // Fast-path rejection; the unique index is the real backstop.
        if self.events.find_registration(event_id, &email)?.is_some() {
            return Err(DomainError::AlreadyRegistered);
        }

        if !self.events.admit_one(event_id)? {
            return Err(DomainError::EventFull);
        }

        let reg = NewRegistration {
            id: Uuid::new_v4(),
            event_id,
            name: req.name.clone(),
            email: email.clone(),
            phone: req.phone.clone(),
            emergency_contact: req.emergency_contact,
            accepted_terms: req.accepted_terms.unwrap_or(false),
            notifications: self.notifications(&event, &req.name, &email, req.phone.as_deref()),
        };

        match self.events.create_registration(reg) {
            Ok(view) => {
                log::info!("registration {} admitted to event {}", view.id, event_id);
                Ok(view)
            }
            Err(e) => {
                if let Err(release_err) = self.events.release_seat(event_id) {
                    log::error!("failed to release seat for event {event_id}: {release_err}");
                }
                Err(e)
            }
        }
    }

    fn notifications(
        &self,
        event: &EventView,
        name: &str,
        email: &str,
        phone: Option<&str>,
    ) -> Vec<Notification> {
        let mut out = vec![Notification {
            recipient: email.to_string(),
            payload: NotificationPayload::RegistrationConfirmation {
                event_title: event.title.clone(),
                attendee_name: name.to_string(),
            },
        }];
        if let Some(admin) = &self.admin_email {
            out.push(Notification {
                recipient: admin.clone(),
                payload: NotificationPayload::AdminNewRegistration {
                    event_title: event.title.clone(),
                    attendee_name: name.to_string(),
                    email: email.to_string(),
                    phone: phone.map(str::to_string),
                },
            });
        }
        out
    }

    pub fn get_event(&self, id: Uuid) -> Result<Option<EventView>, DomainError> {
        self.events.find_event(id)
    }

    pub fn list_registrations(&self, event_id: Uuid) -> Result<Vec<RegistrationView>, DomainError> {
        self.events
            .find_event(event_id)?
            .ok_or(DomainError::EventNotFound)?;
        self.events.list_registrations(event_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::event::{EventPage, NewEvent};

    #[derive(Default)]
    struct FakeEventsInner {
        events: Vec<EventView>,
        registrations: Vec<RegistrationView>,
        fail_insert_with: Option<fn() -> DomainError>,
    }

    #[derive(Clone, Default)]
    struct FakeEvents(Arc<Mutex<FakeEventsInner>>);

    impl FakeEvents {
        fn add_event(&self, capacity: i32) -> Uuid {
            let id = Uuid::new_v4();
            self.0.lock().unwrap().events.push(EventView {
                id,
                title: "Morning Run".to_string(),
                description: None,
                location: None,
                starts_at: Utc::now(),
                ends_at: None,
                capacity,
                registered_count: 0,
                status: "PUBLISHED".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
            id
        }

        fn registered_count(&self, id: Uuid) -> i32 {
            self.0
                .lock()
                .unwrap()
                .events
                .iter()
                .find(|e| e.id == id)
                .unwrap()
                .registered_count
        }
    }

    impl EventStore for FakeEvents {
        fn insert_event(&self, _: NewEvent) -> Result<EventView, DomainError> {
            unimplemented!("not used by registration")
        }

        fn find_event(&self, id: Uuid) -> Result<Option<EventView>, DomainError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .events
                .iter()
                .find(|e| e.id == id)
                .cloned())
        }

        fn list_events(&self, _: i64, _: i64) -> Result<EventPage, DomainError> {
            unimplemented!("not used by registration")
        }

        fn find_registration(
            &self,
            event_id: Uuid,
            email: &str,
        ) -> Result<Option<RegistrationView>, DomainError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .registrations
                .iter()
                .find(|r| r.event_id == event_id && r.email == email)
                .cloned())
        }

        fn list_registrations(&self, event_id: Uuid) -> Result<Vec<RegistrationView>, DomainError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .registrations
                .iter()
                .filter(|r| r.event_id == event_id)
                .cloned()
                .collect())
        }

        fn admit_one(&self, event_id: Uuid) -> Result<bool, DomainError> {
            let mut inner = self.0.lock().unwrap();
            let Some(event) = inner.events.iter_mut().find(|e| e.id == event_id) else {
                return Ok(false);
            };
            if event.registered_count < event.capacity {
                event.registered_count += 1;
                Ok(true)
            } else {
                Ok(false)
            }
        }

        fn release_seat(&self, event_id: Uuid) -> Result<(), DomainError> {
            let mut inner = self.0.lock().unwrap();
            if let Some(event) = inner.events.iter_mut().find(|e| e.id == event_id) {
                event.registered_count -= 1;
            }
            Ok(())
        }

        fn create_registration(
            &self,
            reg: NewRegistration,
        ) -> Result<RegistrationView, DomainError> {
            let mut inner = self.0.lock().unwrap();
            if let Some(fail) = inner.fail_insert_with {
                return Err(fail());
            }
            if inner
                .registrations
                .iter()
                .any(|r| r.event_id == reg.event_id && r.email == reg.email)
            {
                return Err(DomainError::AlreadyRegistered);
            }
            let view = RegistrationView {
                id: reg.id,
                event_id: reg.event_id,
                name: reg.name,
                email: reg.email,
                phone: reg.phone,
                emergency_contact: reg.emergency_contact,
                accepted_terms: reg.accepted_terms,
                created_at: Utc::now(),
            };
            inner.registrations.push(view.clone());
            Ok(view)
        }
    }

    fn request(email: &str) -> EventRegistrationRequest {
        EventRegistrationRequest {
            name: "Sami B".to_string(),
            email: email.to_string(),
            phone: Some("+212611111111".to_string()),
            emergency_contact: None,
            accepted_terms: Some(true),
        }
    }

    #[test]
    fn admits_within_capacity_and_lowercases_email() {
        let events = FakeEvents::default();
        let event_id = events.add_event(2);
        let service = RegistrationService::new(events.clone(), None);

        let view = service
            .register(event_id, request("Sami@Example.com"))
            .expect("registration failed");

        assert_eq!(view.email, "sami@example.com");
        assert_eq!(events.registered_count(event_id), 1);
    }

    #[test]
    fn duplicate_email_is_rejected_without_taking_a_seat() {
        let events = FakeEvents::default();
        let event_id = events.add_event(5);
        let service = RegistrationService::new(events.clone(), None);

        service.register(event_id, request("sami@example.com")).unwrap();
        let second = service.register(event_id, request("sami@example.com"));

        assert!(matches!(second, Err(DomainError::AlreadyRegistered)));
        assert_eq!(events.registered_count(event_id), 1);
    }

    #[test]
    fn full_event_is_rejected() {
        let events = FakeEvents::default();
        let event_id = events.add_event(1);
        let service = RegistrationService::new(events.clone(), None);

        service.register(event_id, request("first@example.com")).unwrap();
        let second = service.register(event_id, request("second@example.com"));

        assert!(matches!(second, Err(DomainError::EventFull)));
        assert_eq!(events.registered_count(event_id), 1);
    }

    #[test]
    fn unknown_event_is_rejected() {
        let events = FakeEvents::default();
        let service = RegistrationService::new(events, None);

        let result = service.register(Uuid::new_v4(), request("sami@example.com"));

        assert!(matches!(result, Err(DomainError::EventNotFound)));
    }

    #[test]
    fn insert_race_releases_the_seat() {
        let events = FakeEvents::default();
        let event_id = events.add_event(3);
        events.0.lock().unwrap().fail_insert_with = Some(|| DomainError::AlreadyRegistered);
        let service = RegistrationService::new(events.clone(), None);

        let result = service.register(event_id, request("racer@example.com"));

        assert!(matches!(result, Err(DomainError::AlreadyRegistered)));
        // The conditionally-taken seat was handed back.
        assert_eq!(events.registered_count(event_id), 0);
    }

    #[test]
    fn admin_notice_is_queued_when_configured() {
        let events = FakeEvents::default();
        let event_id = events.add_event(2);

        // Capture the draft by failing the insert after inspecting it is not
        // possible with this fake; assert through the notifications builder.
        let service = RegistrationService::new(events.clone(), Some("admin@shop.test".into()));
        let event = events.find_event(event_id).unwrap().unwrap();
        let notifications = service.notifications(&event, "Sami B", "sami@example.com", None);

        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[1].recipient, "admin@shop.test");
    }
}
