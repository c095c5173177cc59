use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    /// 校验失败时的第一个失败字段
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
                field: None,
            },
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_FAILED",
            message,
        );
        error.body.field = Some(field.into());
        error
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.body.code
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;
        use domain::{DomainError, RepositoryError};

        match error {
            AppErr::Domain(DomainError::ValidationError { field, message }) => {
                ApiError::validation(field, message)
            }
            AppErr::Domain(DomainError::ParticipantAlreadyExists { .. }) => ApiError::new(
                StatusCode::CONFLICT,
                "PARTICIPANT_EXISTS",
                "participant already exists",
            ),
            AppErr::Domain(DomainError::ParticipantNotFound { .. }) => ApiError::new(
                StatusCode::NOT_FOUND,
                "PARTICIPANT_NOT_FOUND",
                "participant not found",
            ),
            AppErr::Domain(DomainError::MessageNotFound { .. }) => ApiError::new(
                StatusCode::NOT_FOUND,
                "MESSAGE_NOT_FOUND",
                "message not found",
            ),
            AppErr::Domain(DomainError::NotMessageOwner { .. }) => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "NOT_MESSAGE_OWNER",
                "only the author may edit this message",
            ),
            AppErr::Repository(repo_err) => {
                tracing::error!(error = %repo_err, "存储操作失败");
                match repo_err {
                    RepositoryError::Conflict => {
                        ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
                    }
                    other => ApiError::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DATABASE_ERROR",
                        format!("database error: {}", other),
                    ),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{DomainError, RepositoryError};

    #[test]
    fn domain_errors_map_to_contract_status_codes() {
        let cases = [
            (
                DomainError::validation_error("name", "invalid participant name"),
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
            ),
            (
                DomainError::participant_already_exists("ana"),
                StatusCode::CONFLICT,
                "PARTICIPANT_EXISTS",
            ),
            (
                DomainError::participant_not_found("ana"),
                StatusCode::NOT_FOUND,
                "PARTICIPANT_NOT_FOUND",
            ),
            (
                DomainError::message_not_found("x"),
                StatusCode::NOT_FOUND,
                "MESSAGE_NOT_FOUND",
            ),
            (
                DomainError::not_message_owner("bia"),
                StatusCode::UNAUTHORIZED,
                "NOT_MESSAGE_OWNER",
            ),
        ];

        for (domain_error, status, code) in cases {
            let api_error = ApiError::from(ApplicationError::from(domain_error));
            assert_eq!(api_error.status(), status);
            assert_eq!(api_error.code(), code);
        }
    }

    #[test]
    fn store_failures_are_internal_errors_with_detail() {
        let api_error =
            ApiError::from(ApplicationError::from(RepositoryError::storage("pool closed")));
        assert_eq!(api_error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.code(), "DATABASE_ERROR");
        assert!(api_error.body.message.contains("pool closed"));

        let timeout = ApiError::from(ApplicationError::from(RepositoryError::Timeout {
            operation: "messages.insert",
            after_ms: 5_000,
        }));
        assert_eq!(timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
