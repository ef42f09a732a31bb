use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::models::RoomError;
use domain::services::TeamError;
use serde::Serialize;
use shared::jwt::JwtError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A team or invite rule refused the action.
    #[error("{0}")]
    Team(#[from] TeamError),

    /// The room policy refused the placement.
    #[error("{0}")]
    Room(#[from] RoomError),

    #[error("Registration is closed")]
    RegistrationClosed,

    /// Over the per-user request budget; retry after the given seconds.
    #[error("Rate limited")]
    RateLimited { retry_after: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

fn team_error_status(err: &TeamError) -> StatusCode {
    match err {
        TeamError::UserNotFound(_) => StatusCode::NOT_FOUND,
        TeamError::NameTooLong | TeamError::NameEmpty | TeamError::RoomRequired => {
            StatusCode::BAD_REQUEST
        }
        TeamError::NotLeader | TeamError::NotInvitee => StatusCode::FORBIDDEN,
        TeamError::NotRegistered(_)
        | TeamError::NotCheckedIn(_)
        | TeamError::AlreadyOnTeam(_)
        | TeamError::AlreadyInvited(_)
        | TeamError::TeamFull
        | TeamError::AlreadyFinalized
        | TeamError::InviteNotPending
        | TeamError::InviteExpired
        | TeamError::CallerNotCheckedIn
        | TeamError::CallerAlreadyOnTeam => StatusCode::CONFLICT,
    }
}

fn room_error_parts(err: &RoomError) -> (StatusCode, &'static str) {
    match err {
        RoomError::RoomFull(_) => (StatusCode::CONFLICT, "room_full"),
        RoomError::UnknownRoom(_) => (StatusCode::BAD_REQUEST, "unknown_room"),
        RoomError::SoloTeamPinned => (StatusCode::CONFLICT, "solo_team_pinned"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::Team(err) => (team_error_status(err), err.code(), err.to_string()),
            ApiError::Room(err) => {
                let (status, code) = room_error_parts(err);
                (status, code, err.to_string())
            }
            ApiError::RegistrationClosed => (
                StatusCode::FORBIDDEN,
                "registration_closed",
                "Registration is currently closed".into(),
            ),
            ApiError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                format!("Too many requests. Retry in {} seconds.", retry_after),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        }
        response
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Resource already exists".into()),
                        "23503" => ApiError::NotFound("Referenced resource not found".into()),
                        "23514" => ApiError::Validation("Value violates a check constraint".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired | JwtError::InvalidToken | JwtError::DecodingError(_) => {
                ApiError::Unauthorized("Invalid or expired token".into())
            }
            other => ApiError::Internal(format!("Token service error: {}", other)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(m) => m.to_string(),
                    None => format!("{}: invalid value ({})", field, e.code),
                })
            })
            .collect();

        let message = if messages.len() == 1 {
            messages[0].clone()
        } else {
            format!("{} validation errors: {}", messages.len(), messages.join(", "))
        };

        ApiError::Validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::RegistrationClosed, StatusCode::FORBIDDEN),
            (ApiError::RateLimited { retry_after: 5 }, StatusCode::TOO_MANY_REQUESTS),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_team_error_mapping() {
        let full: ApiError = TeamError::TeamFull.into();
        assert_eq!(full.into_response().status(), StatusCode::CONFLICT);

        let not_leader: ApiError = TeamError::NotLeader.into();
        assert_eq!(not_leader.into_response().status(), StatusCode::FORBIDDEN);

        let too_long: ApiError = TeamError::NameTooLong.into();
        assert_eq!(too_long.into_response().status(), StatusCode::BAD_REQUEST);

        let missing: ApiError = TeamError::UserNotFound("a@b.c".into()).into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_room_error_mapping() {
        let full: ApiError = RoomError::RoomFull("124".into()).into();
        assert_eq!(full.into_response().status(), StatusCode::CONFLICT);

        let unknown: ApiError = RoomError::UnknownRoom("999".into()).into();
        assert_eq!(unknown.into_response().status(), StatusCode::BAD_REQUEST);

        let pinned: ApiError = RoomError::SoloTeamPinned.into();
        assert_eq!(pinned.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_team_error_display_passthrough() {
        let err: ApiError = TeamError::NotCheckedIn("ada@example.com".into()).into();
        assert!(err.to_string().contains("ada@example.com"));
    }

    #[test]
    fn test_jwt_error_mapping() {
        let expired: ApiError = JwtError::TokenExpired.into();
        assert!(matches!(expired, ApiError::Unauthorized(_)));

        let key: ApiError = JwtError::InvalidKey("bad pem".into()).into();
        assert!(matches!(key, ApiError::Internal(_)));
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited { retry_after: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            &HeaderValue::from(42u64)
        );
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        match error {
            ApiError::NotFound(msg) => assert_eq!(msg, "Resource not found"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_from_validation_errors() {
        let request = domain::models::invite::SendInvitesRequest { emails: vec![] };
        let error: ApiError = request.validate().unwrap_err().into();
        match error {
            ApiError::Validation(msg) => assert_eq!(msg, "At least one email is required"),
            _ => panic!("Expected Validation error"),
        }
    }
}
