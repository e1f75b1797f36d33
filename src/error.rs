use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::error::ErrorKind;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::utils::{error_codes, error_to_api_response, ApiResponse};

/// 字段名 -> 错误信息列表
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid token")]
    InvalidToken,
    #[error("{0} not found")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("no data to export")]
    NoData,
    #[error("database error: {0}")]
    Database(String),
    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),
    #[error("export error: {0}")]
    Export(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    /// 单字段校验错误
    pub fn field(field: &str, msg: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![msg.into()]);
        AppError::Validation(errors)
    }

    fn status_and_code(&self) -> (StatusCode, i32) {
        match self {
            AppError::Unauthorized | AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED)
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
            AppError::Conflict(_) => (StatusCode::CONFLICT, error_codes::CONFLICT),
            AppError::Validation(_) | AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR)
            }
            AppError::NoData => (StatusCode::UNPROCESSABLE_ENTITY, error_codes::NO_DATA),
            AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Export(_)
            | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
            }
        }
    }
}

/// 约束冲突只返回固定文案，数据库原文只进日志
fn constraint_conflict(kind: ErrorKind) -> Option<AppError> {
    match kind {
        ErrorKind::UniqueViolation => Some(AppError::conflict("a record with the same value already exists")),
        ErrorKind::ForeignKeyViolation => Some(AppError::conflict(
            "the record is still referenced, or refers to a record that does not exist",
        )),
        _ => None,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = e {
            return AppError::NotFound("record".into());
        }
        if let sqlx::Error::Database(db) = &e {
            if let Some(conflict) = constraint_conflict(db.kind()) {
                tracing::debug!("constraint violation: {}", db.message());
                return conflict;
            }
        }
        AppError::Database(e.to_string())
    }
}

/// `room_id` -> `roomId`，与请求体字段名一致
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// 嵌套结构展开为 `schedules[0].roomId` 形式的键
fn collect_field_errors(errors: &ValidationErrors, prefix: &str, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let key = format!("{}{}", prefix, camel_case(&field.to_string()));
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let messages = errs.iter().map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => e.code.to_string(),
                });
                out.entry(key).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_field_errors(inner, &format!("{}.", key), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(inner, &format!("{}[{}].", key, index), out);
                }
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        collect_field_errors(&errors, "", &mut fields);
        AppError::Validation(fields)
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        AppError::Export(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // 内部错误不把细节暴露给前端，交给 log_errors 记录
        let msg = match &self {
            AppError::Database(_) | AppError::Export(_) | AppError::Internal(_) => {
                tracing::error!("{}", self);
                "internal server error".to_string()
            }
            AppError::Cache(_) => {
                tracing::error!("{}", self);
                "cache unavailable".to_string()
            }
            other => other.to_string(),
        };

        match self {
            AppError::Validation(fields) => (
                status,
                axum::Json(ApiResponse {
                    code,
                    msg,
                    data: Some(fields),
                }),
            )
                .into_response(),
            _ => (status, error_to_api_response::<()>(code, msg)).into_response(),
        }
    }
}
