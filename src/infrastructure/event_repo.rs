use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::event::{EventPage, EventView, NewEvent, NewRegistration, RegistrationView};
use crate::domain::ports::EventStore;
use crate::schema::{event_registrations, events, notification_outbox};

use super::models::{EventRow, NewEventRow, NewOutboxRow, NewRegistrationRow, RegistrationRow};

impl From<EventRow> for EventView {
    fn from(row: EventRow) -> Self {
        EventView {
            id: row.id,
            title: row.title,
            description: row.description,
            location: row.location,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            capacity: row.capacity,
            registered_count: row.registered_count,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<RegistrationRow> for RegistrationView {
    fn from(row: RegistrationRow) -> Self {
        RegistrationView {
            id: row.id,
            event_id: row.event_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            emergency_contact: row.emergency_contact,
            accepted_terms: row.accepted_terms,
            created_at: row.created_at,
        }
    }
}

pub struct DieselEventStore {
    pool: DbPool,
}

impl DieselEventStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl EventStore for DieselEventStore {
    fn insert_event(&self, event: NewEvent) -> Result<EventView, DomainError> {
        event.validate()?;
        let mut conn = self.pool.get()?;

        let row: EventRow = diesel::insert_into(events::table)
            .values(&NewEventRow {
                id: Uuid::new_v4(),
                title: event.title,
                description: event.description,
                location: event.location,
                starts_at: event.starts_at,
                ends_at: event.ends_at,
                capacity: event.capacity,
                registered_count: 0,
                status: event.status,
            })
            .returning(EventRow::as_returning())
            .get_result(&mut conn)?;

        Ok(row.into())
    }

    fn find_event(&self, id: Uuid) -> Result<Option<EventView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = events::table
            .filter(events::id.eq(id))
            .select(EventRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(Into::into))
    }

    fn list_events(&self, page: i64, limit: i64) -> Result<EventPage, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = events::table.count().get_result(conn)?;

            let rows = events::table
                .select(EventRow::as_select())
                .order(events::starts_at.asc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(EventPage {
                items: rows.into_iter().map(Into::into).collect(),
                total,
            })
        })
    }

    fn find_registration(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<Option<RegistrationView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = event_registrations::table
            .filter(
                event_registrations::event_id
                    .eq(event_id)
                    .and(event_registrations::email.eq(email)),
            )
            .select(RegistrationRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(Into::into))
    }

    fn list_registrations(&self, event_id: Uuid) -> Result<Vec<RegistrationView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = event_registrations::table
            .filter(event_registrations::event_id.eq(event_id))
            .order(event_registrations::created_at.asc())
            .select(RegistrationRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Seat admission is the same primitive as stock reservation: one
    /// conditional UPDATE whose predicate (`registered_count < capacity`) is
    /// evaluated atomically with the increment. Racing registrations at the
    /// capacity boundary resolve to exactly one winner.
    fn admit_one(&self, event_id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let matched = diesel::update(
            events::table.filter(
                events::id
                    .eq(event_id)
                    .and(events::registered_count.lt(events::capacity)),
            ),
        )
        .set((
            events::registered_count.eq(events::registered_count + 1),
            events::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)?;

        Ok(matched == 1)
    }

    fn release_seat(&self, event_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let matched = diesel::update(
            events::table.filter(events::id.eq(event_id).and(events::registered_count.gt(0))),
        )
        .set((
            events::registered_count.eq(events::registered_count - 1),
            events::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)?;

        if matched == 0 {
            log::warn!("release_seat matched no row for event {event_id}");
        }
        Ok(())
    }

    fn create_registration(&self, reg: NewRegistration) -> Result<RegistrationView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row: RegistrationRow = diesel::insert_into(event_registrations::table)
                .values(&NewRegistrationRow {
                    id: reg.id,
                    event_id: reg.event_id,
                    name: reg.name.clone(),
                    email: reg.email.clone(),
                    phone: reg.phone.clone(),
                    emergency_contact: reg.emergency_contact.clone(),
                    accepted_terms: reg.accepted_terms,
                })
                .returning(RegistrationRow::as_returning())
                .get_result(conn)
                .map_err(|e| match e {
                    diesel::result::Error::DatabaseError(
                        DatabaseErrorKind::UniqueViolation,
                        _,
                    ) => DomainError::AlreadyRegistered,
                    other => other.into(),
                })?;

            let outbox_rows: Result<Vec<NewOutboxRow>, DomainError> = reg
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

            Ok(row.into())
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::DieselEventStore;
    use crate::domain::errors::DomainError;
    use crate::domain::event::{NewEvent, NewRegistration};
    use crate::domain::ports::EventStore;
    use crate::infrastructure::testutil::setup_db;

    fn event(capacity: i32) -> NewEvent {
        NewEvent {
            title: "Morning Run".to_string(),
            description: None,
            location: Some("Parc de la Ligue Arabe".to_string()),
            starts_at: Utc::now(),
            ends_at: None,
            capacity,
            status: "PUBLISHED".to_string(),
        }
    }

    fn registration(event_id: Uuid, email: &str) -> NewRegistration {
        NewRegistration {
            id: Uuid::new_v4(),
            event_id,
            name: "Sami B".to_string(),
            email: email.to_string(),
            phone: None,
            emergency_contact: None,
            accepted_terms: true,
            notifications: vec![],
        }
    }

    #[tokio::test]
    async fn admit_one_stops_at_capacity() {
        let (_container, pool) = setup_db().await;
        let repo = DieselEventStore::new(pool);
        let e = repo.insert_event(event(2)).expect("insert failed");

        assert!(repo.admit_one(e.id).unwrap());
        assert!(repo.admit_one(e.id).unwrap());
        assert!(!repo.admit_one(e.id).unwrap(), "third admit must be refused");

        let after = repo.find_event(e.id).unwrap().unwrap();
        assert_eq!(after.registered_count, 2);
    }

    #[tokio::test]
    async fn concurrent_admissions_never_exceed_capacity() {
        // Capacity 1, two concurrent admissions: exactly one may win.
        let (_container, pool) = setup_db().await;
        let repo = DieselEventStore::new(pool.clone());
        let e = repo.insert_event(event(1)).expect("insert failed");

        let mut handles = Vec::new();
        for _ in 0..2 {
            let pool = pool.clone();
            let event_id = e.id;
            handles.push(tokio::task::spawn_blocking(move || {
                DieselEventStore::new(pool).admit_one(event_id)
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.expect("task panicked").expect("admit errored") {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(repo.find_event(e.id).unwrap().unwrap().registered_count, 1);
    }

    #[tokio::test]
    async fn release_seat_undoes_an_admission() {
        let (_container, pool) = setup_db().await;
        let repo = DieselEventStore::new(pool);
        let e = repo.insert_event(event(1)).expect("insert failed");

        assert!(repo.admit_one(e.id).unwrap());
        repo.release_seat(e.id).expect("release failed");
        assert!(repo.admit_one(e.id).unwrap(), "seat is available again");
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_already_registered() {
        let (_container, pool) = setup_db().await;
        let repo = DieselEventStore::new(pool);
        let e = repo.insert_event(event(5)).expect("insert failed");

        repo.create_registration(registration(e.id, "sami@example.com"))
            .expect("first registration failed");
        let second = repo.create_registration(registration(e.id, "sami@example.com"));

        assert!(matches!(second, Err(DomainError::AlreadyRegistered)));
    }

    #[tokio::test]
    async fn find_registration_matches_event_and_email() {
        let (_container, pool) = setup_db().await;
        let repo = DieselEventStore::new(pool);
        let e = repo.insert_event(event(5)).expect("insert failed");
        repo.create_registration(registration(e.id, "sami@example.com"))
            .expect("registration failed");

        let found = repo
            .find_registration(e.id, "sami@example.com")
            .expect("find failed");
        assert!(found.is_some());

        let other = repo
            .find_registration(e.id, "other@example.com")
            .expect("find failed");
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn zero_capacity_event_is_rejected() {
        let (_container, pool) = setup_db().await;
        let repo = DieselEventStore::new(pool);

        assert!(matches!(
            repo.insert_event(event(0)),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
