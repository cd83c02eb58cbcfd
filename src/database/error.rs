use std::fmt::{self, Display};

use potion::{Error, HtmlError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    Internal,
    Conflict,
    MissingReference,
    Constraint,
}

#[derive(Debug)]
pub struct QueryError {
    info: String,
    kind: QueryErrorKind,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self {
            info,
            kind: QueryErrorKind::Internal,
        }
    }

    pub fn kind(&self) -> QueryErrorKind {
        self.kind
    }

    fn with_kind(info: String, kind: QueryErrorKind) -> Self {
        Self { info, kind }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => {
                let constraint = e.constraint().unwrap_or("constraint").to_owned();

                if e.is_unique_violation() {
                    Self::with_kind(
                        format!("Already exists ({constraint})"),
                        QueryErrorKind::Conflict,
                    )
                } else if e.is_foreign_key_violation() {
                    Self::with_kind(
                        format!("Referenced object does not exist ({constraint})"),
                        QueryErrorKind::MissingReference,
                    )
                } else if e.is_check_violation() {
                    Self::with_kind(
                        format!("Constraint violated ({constraint})"),
                        QueryErrorKind::Constraint,
                    )
                } else {
                    Self::new(format!("{e}"))
                }
            }
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(format!("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(format!("Unknown error")),
        }
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.info)
    }
}

impl Into<Error> for QueryError {
    fn into(self) -> Error {
        match self.kind {
            QueryErrorKind::Internal => {
                log::error!("Query failed: {}", self.info);
                Error {
                    code: 500,
                    info: Some(self.info),
                    redirect: None,
                }
            }
            QueryErrorKind::Conflict | QueryErrorKind::Constraint => Error {
                code: 400,
                info: Some(self.info),
                redirect: None,
            },
            QueryErrorKind::MissingReference => Error {
                code: 404,
                info: Some(self.info),
                redirect: None,
            },
        }
    }
}

/// Rejected input. Rendered as `<field>: <reason>` when the field is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    field: Option<&'static str>,
    info: String,
}

impl ValidationError {
    pub fn new(info: &str) -> Self {
        Self {
            field: None,
            info: info.to_owned(),
        }
    }

    pub fn field(field: &'static str, info: &str) -> Self {
        Self {
            field: Some(field),
            info: info.to_owned(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "{field}: {}", self.info),
            None => write!(f, "{}", self.info),
        }
    }
}

impl std::error::Error for ValidationError {}

impl Into<Error> for ValidationError {
    fn into(self) -> Error {
        HtmlError::InvalidRequest.new(&self.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NotFoundError {
    info: String,
}

impl NotFoundError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_owned(),
        }
    }
}

impl Into<Error> for NotFoundError {
    fn into(self) -> Error {
        Error {
            code: 404,
            info: Some(self.info),
            redirect: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    Unauthenticated,
    PermissionDenied,
}

impl Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::Unauthenticated => write!(f, "Authentication credentials were not provided"),
            AccessError::PermissionDenied => {
                write!(f, "You don't have permission to perform this action")
            }
        }
    }
}

impl Into<Error> for AccessError {
    fn into(self) -> Error {
        let code = match self {
            AccessError::Unauthenticated => 401,
            AccessError::PermissionDenied => 403,
        };

        Error {
            code,
            info: Some(self.to_string()),
            redirect: None,
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl Into<potion::Error> for TypeError {
    fn into(self) -> potion::Error {
        HtmlError::InvalidRequest.new(&self.info)
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors_naming_the_field() {
        let error: Error = ValidationError::field("cooking_time", "Out of range").into();

        assert_eq!(error.code, 400);
        assert!(error
            .info
            .is_some_and(|info| info.contains("cooking_time: Out of range")));
    }

    #[test]
    fn access_errors_distinguish_authentication_from_permission() {
        let unauthenticated: Error = AccessError::Unauthenticated.into();
        let denied: Error = AccessError::PermissionDenied.into();

        assert_eq!(unauthenticated.code, 401);
        assert_eq!(denied.code, 403);
    }

    #[test]
    fn internal_query_errors_are_server_errors() {
        let error = QueryError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(error.kind(), QueryErrorKind::Internal);

        let error: Error = error.into();

        assert_eq!(error.code, 500);
        assert_eq!(error.info.as_deref(), Some("Pool timed out"));
    }

    #[test]
    fn not_found_is_404() {
        let error: Error = NotFoundError::new("No recipe exists with specified id").into();

        assert_eq!(error.code, 404);
    }
}
