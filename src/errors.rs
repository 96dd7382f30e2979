use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

/// HTTP-facing error. Every business failure keeps its reason code so the
/// calling layer can render an actionable message instead of a generic 4xx.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}")]
    NotFound { code: &'static str },

    #[error("{code}")]
    Conflict { code: &'static str },

    #[error("{code}")]
    Unprocessable {
        code: &'static str,
        detail: Option<String>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        let code = e.code();
        match e {
            DomainError::ProductNotFound
            | DomainError::VariantNotFound
            | DomainError::EventNotFound
            | DomainError::NotFound => AppError::NotFound { code },
            DomainError::OutOfStock
            | DomainError::EventFull
            | DomainError::AlreadyRegistered
            | DomainError::VariantExists => AppError::Conflict { code },
            DomainError::ProductInactive | DomainError::VariantRequired => {
                AppError::Unprocessable { code, detail: None }
            }
            DomainError::InvalidInput(detail) => AppError::Unprocessable {
                code,
                detail: Some(detail),
            },
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound { code } => {
                HttpResponse::NotFound().json(serde_json::json!({ "error": code }))
            }
            AppError::Conflict { code } => {
                HttpResponse::Conflict().json(serde_json::json!({ "error": code }))
            }
            AppError::Unprocessable { code, detail } => HttpResponse::UnprocessableEntity()
                .json(serde_json::json!({ "error": code, "detail": detail })),
            AppError::Internal(_) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "INTERNAL"
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    #[test]
    fn out_of_stock_maps_to_409_with_code() {
        let err: AppError = DomainError::OutOfStock.into();
        assert!(matches!(err, AppError::Conflict { code: "OUT_OF_STOCK" }));
        assert_eq!(err.error_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn event_full_and_already_registered_are_conflicts() {
        for e in [DomainError::EventFull, DomainError::AlreadyRegistered] {
            let err: AppError = e.into();
            assert_eq!(err.error_response().status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn missing_resources_map_to_404() {
        for e in [
            DomainError::ProductNotFound,
            DomainError::VariantNotFound,
            DomainError::EventNotFound,
            DomainError::NotFound,
        ] {
            let err: AppError = e.into();
            assert_eq!(err.error_response().status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn business_rejections_map_to_422() {
        for e in [
            DomainError::ProductInactive,
            DomainError::VariantRequired,
            DomainError::InvalidInput("qty".to_string()),
        ] {
            let err: AppError = e.into();
            assert_eq!(
                err.error_response().status(),
                StatusCode::UNPROCESSABLE_ENTITY
            );
        }
    }

    #[test]
    fn internal_detail_is_hidden_from_clients() {
        let err: AppError = DomainError::Internal("connection refused".to_string()).into();
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn display_shows_the_reason_code() {
        let err: AppError = DomainError::ProductInactive.into();
        assert_eq!(err.to_string(), "PRODUCT_INACTIVE");
    }
}
