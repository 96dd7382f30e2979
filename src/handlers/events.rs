use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::RegistrationService;
use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::event::{EventRegistrationRequest, EventView, NewEvent, RegistrationView};
use crate::domain::ports::EventStore;
use crate::errors::AppError;
use crate::infrastructure::DieselEventStore;
use crate::AppConfig;

use super::PageParams;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: i32,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "PUBLISHED".to_string()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub accepted_terms: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: String,
    pub ends_at: Option<String>,
    pub capacity: i32,
    pub registered_count: i32,
    pub status: String,
    pub created_at: String,
}

impl From<EventView> for EventResponse {
    fn from(e: EventView) -> Self {
        EventResponse {
            id: e.id,
            title: e.title,
            description: e.description,
            location: e.location,
            starts_at: e.starts_at.to_rfc3339(),
            ends_at: e.ends_at.map(|t| t.to_rfc3339()),
            capacity: e.capacity,
            registered_count: e.registered_count,
            status: e.status,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub accepted_terms: bool,
    pub created_at: String,
}

impl From<RegistrationView> for RegistrationResponse {
    fn from(r: RegistrationView) -> Self {
        RegistrationResponse {
            id: r.id,
            event_id: r.event_id,
            name: r.name,
            email: r.email,
            phone: r.phone,
            emergency_contact: r.emergency_contact,
            accepted_terms: r.accepted_terms,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListEventsResponse {
    pub items: Vec<EventResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /events
#[utoipa::path(
    post,
    path = "/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 422, description = "Invalid event"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "events"
)]
pub async fn create_event(
    pool: web::Data<DbPool>,
    body: web::Json<CreateEventRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let pool = pool.get_ref().clone();

    let view = web::block(move || {
        DieselEventStore::new(pool).insert_event(NewEvent {
            title: body.title,
            description: body.description,
            location: body.location,
            starts_at: body.starts_at,
            ends_at: body.ends_at,
            capacity: body.capacity,
            status: body.status,
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(EventResponse::from(view)))
}

/// GET /events/{id}
#[utoipa::path(
    get,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event UUID")),
    responses(
        (status = 200, description = "Event found", body = EventResponse),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "events"
)]
pub async fn get_event(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let event_id = path.into_inner();
    let pool = pool.get_ref().clone();

    let result = web::block(move || DieselEventStore::new(pool).find_event(event_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    match result {
        Some(event) => Ok(HttpResponse::Ok().json(EventResponse::from(event))),
        None => Err(DomainError::EventNotFound.into()),
    }
}

/// GET /events
///
/// Returns a paginated list of events ordered by start time.
#[utoipa::path(
    get,
    path = "/events",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of events", body = ListEventsResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "events"
)]
pub async fn list_events(
    pool: web::Data<DbPool>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let (page, limit) = query.clamped();
    let pool = pool.get_ref().clone();

    let page_result = web::block(move || DieselEventStore::new(pool).list_events(page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListEventsResponse {
        items: page_result.items.into_iter().map(Into::into).collect(),
        total: page_result.total,
        page,
        limit,
    }))
}

/// POST /events/{id}/registrations
///
/// Admits an attendee within the event's capacity, at most once per email.
/// The seat is taken by an atomic conditional increment, so racing
/// registrations at the capacity boundary resolve to exactly one winner.
#[utoipa::path(
    post,
    path = "/events/{id}/registrations",
    params(("id" = Uuid, Path, description = "Event UUID")),
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration accepted", body = RegistrationResponse),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event full or email already registered"),
        (status = 422, description = "Invalid request"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "events"
)]
pub async fn register(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    path: web::Path<Uuid>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let event_id = path.into_inner();
    let body = body.into_inner();
    let pool = pool.get_ref().clone();
    let admin_email = config.admin_email.clone();

    let view = web::block(move || {
        let service = RegistrationService::new(DieselEventStore::new(pool), admin_email);
        service.register(
            event_id,
            EventRegistrationRequest {
                name: body.name,
                email: body.email,
                phone: body.phone,
                emergency_contact: body.emergency_contact,
                accepted_terms: body.accepted_terms,
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(RegistrationResponse::from(view)))
}

/// GET /events/{id}/registrations
#[utoipa::path(
    get,
    path = "/events/{id}/registrations",
    params(("id" = Uuid, Path, description = "Event UUID")),
    responses(
        (status = 200, description = "Registrations for the event", body = [RegistrationResponse]),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "events"
)]
pub async fn list_registrations(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let event_id = path.into_inner();
    let pool = pool.get_ref().clone();
    let admin_email = config.admin_email.clone();

    let registrations = web::block(move || {
        RegistrationService::new(DieselEventStore::new(pool), admin_email)
            .list_registrations(event_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let items: Vec<RegistrationResponse> = registrations.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(items))
}
