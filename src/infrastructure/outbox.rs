use std::time::Duration;

use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::notification::NotificationPayload;
use crate::domain::ports::Mailer;
use crate::schema::notification_outbox;

use super::models::OutboxRow;

/// Logging stand-in for a real mail transport. The dispatcher only talks to
/// the [`Mailer`] trait, so swapping in SMTP later is a one-file change.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, recipient: &str, subject: &str, _body: &str) -> Result<(), DomainError> {
        log::info!("notification to {recipient}: {subject}");
        Ok(())
    }
}

/// Drains the notification outbox in the background. Rows are written in the
/// same transaction as the order/registration they announce, so a send can be
/// retried forever without ever unwinding the primary record, and a slow or
/// failing transport never blocks the reservation path.
pub struct OutboxDispatcher<M> {
    pool: DbPool,
    mailer: M,
}

impl<M: Mailer> OutboxDispatcher<M> {
    pub fn new(pool: DbPool, mailer: M) -> Self {
        Self { pool, mailer }
    }

    /// Poll-and-send loop; intended for a dedicated background thread.
    pub fn run(self, interval: Duration) {
        loop {
            match self.drain_once() {
                Ok(0) => {}
                Ok(sent) => log::debug!("dispatched {sent} notification(s)"),
                Err(e) => log::error!("outbox drain failed: {e}"),
            }
            std::thread::sleep(interval);
        }
    }

    /// Send every pending notification once. A failed send stays pending and
    /// is retried on the next poll; a row whose payload no longer
    /// deserialises is stamped as dispatched so it cannot wedge the queue.
    pub fn drain_once(&self) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        let pending: Vec<OutboxRow> = notification_outbox::table
            .filter(notification_outbox::dispatched_at.is_null())
            .order(notification_outbox::created_at.asc())
            .limit(50)
            .select(OutboxRow::as_select())
            .load(&mut conn)?;

        let mut sent = 0;
        for row in pending {
            let payload: NotificationPayload = match serde_json::from_value(row.payload.clone()) {
                Ok(p) => p,
                Err(e) => {
                    log::error!("dropping undecodable outbox row {}: {e}", row.id);
                    self.mark_dispatched(&mut conn, row.id)?;
                    continue;
                }
            };

            match self.mailer.send(&row.recipient, &payload.subject(), &payload.body()) {
                Ok(()) => {
                    self.mark_dispatched(&mut conn, row.id)?;
                    sent += 1;
                }
                Err(e) => {
                    log::warn!("failed to send notification {} to {}: {e}", row.id, row.recipient);
                }
            }
        }
        Ok(sent)
    }

    fn mark_dispatched(
        &self,
        conn: &mut PgConnection,
        id: uuid::Uuid,
    ) -> Result<(), DomainError> {
        diesel::update(notification_outbox::table.filter(notification_outbox::id.eq(id)))
            .set(notification_outbox::dispatched_at.eq(diesel::dsl::now))
            .execute(conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use diesel::prelude::*;
    use uuid::Uuid;

    use super::{LogMailer, OutboxDispatcher};
    use crate::domain::errors::DomainError;
    use crate::domain::notification::NotificationPayload;
    use crate::domain::ports::Mailer;
    use crate::infrastructure::models::NewOutboxRow;
    use crate::infrastructure::testutil::setup_db;
    use crate::schema::notification_outbox;

    #[derive(Clone, Default)]
    struct RecordingMailer {
        sent: Arc<Mutex<Vec<String>>>,
        failing: Arc<Mutex<bool>>,
    }

    impl Mailer for RecordingMailer {
        fn send(&self, recipient: &str, _subject: &str, _body: &str) -> Result<(), DomainError> {
            if *self.failing.lock().unwrap() {
                return Err(DomainError::Internal("transport down".into()));
            }
            self.sent.lock().unwrap().push(recipient.to_string());
            Ok(())
        }
    }

    fn enqueue(pool: &crate::db::DbPool, recipient: &str) {
        let payload = NotificationPayload::RegistrationConfirmation {
            event_title: "Morning Run".to_string(),
            attendee_name: "Sami".to_string(),
        };
        let mut conn = pool.get().expect("Failed to get connection");
        diesel::insert_into(notification_outbox::table)
            .values(&NewOutboxRow {
                id: Uuid::new_v4(),
                recipient: recipient.to_string(),
                template: payload.template().to_string(),
                payload: serde_json::to_value(&payload).unwrap(),
            })
            .execute(&mut conn)
            .expect("insert failed");
    }

    fn pending_count(pool: &crate::db::DbPool) -> i64 {
        let mut conn = pool.get().expect("Failed to get connection");
        notification_outbox::table
            .filter(notification_outbox::dispatched_at.is_null())
            .count()
            .get_result(&mut conn)
            .expect("count failed")
    }

    #[tokio::test]
    async fn drain_sends_and_stamps_pending_rows() {
        let (_container, pool) = setup_db().await;
        enqueue(&pool, "sami@example.com");
        enqueue(&pool, "admin@shop.test");

        let mailer = RecordingMailer::default();
        let dispatcher = OutboxDispatcher::new(pool.clone(), mailer.clone());

        let sent = dispatcher.drain_once().expect("drain failed");
        assert_eq!(sent, 2);
        assert_eq!(pending_count(&pool), 0);
        assert_eq!(mailer.sent.lock().unwrap().len(), 2);

        // Nothing left to do on the next poll.
        assert_eq!(dispatcher.drain_once().expect("drain failed"), 0);
    }

    #[tokio::test]
    async fn failed_sends_stay_pending_for_retry() {
        let (_container, pool) = setup_db().await;
        enqueue(&pool, "sami@example.com");

        let mailer = RecordingMailer::default();
        *mailer.failing.lock().unwrap() = true;
        let dispatcher = OutboxDispatcher::new(pool.clone(), mailer.clone());

        assert_eq!(dispatcher.drain_once().expect("drain failed"), 0);
        assert_eq!(pending_count(&pool), 1);

        *mailer.failing.lock().unwrap() = false;
        assert_eq!(dispatcher.drain_once().expect("drain failed"), 1);
        assert_eq!(pending_count(&pool), 0);
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        assert!(LogMailer.send("x@example.com", "subject", "body").is_ok());
    }
}
