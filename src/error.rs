use crate::data::{entity::EntityKind, validation::ValidationError};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use snafu::Snafu;
use std::{net::AddrParseError, num::ParseIntError, sync::Arc};
use uuid::Uuid;

pub type RosterResult<T> = Result<T, RosterError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RosterError {
    #[snafu(context(false), display("{source}"))]
    Validation { source: ValidationError },
    #[snafu(display("A {} with that {} already exists", kind.noun(), field))]
    DuplicateKey {
        kind: EntityKind,
        field: &'static str,
    },
    #[snafu(display("Unable to find {} with ID: {}", kind.noun(), id))]
    NotFound { kind: EntityKind, id: Uuid },
    #[snafu(display("Malformed identifier {:?}", original))]
    InvalidIdentifier {
        source: uuid::Error,
        original: String,
    },
    #[snafu(display("Unable to connect to the database"))]
    ConnectionFailed { source: Arc<sqlx::Error> },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Malformed request body"))]
    JsonBody { source: JsonRejection },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse env var `{}` as a number", name))]
    ParseConfigNumber {
        source: ParseIntError,
        name: &'static str,
    },
    #[snafu(display("Unable to parse server address {:?}", original))]
    ParseServerAddress {
        source: AddrParseError,
        original: String,
    },
    #[snafu(display("Unable to listen on {}", addr))]
    BindListener {
        source: std::io::Error,
        addr: std::net::SocketAddr,
    },
    #[snafu(display("Error serving app"))]
    Serve { source: std::io::Error },
}

impl RosterError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::DuplicateKey { .. } => "DuplicateKey",
            Self::NotFound { .. } => "NotFound",
            Self::InvalidIdentifier { .. } => "InvalidIdentifier",
            Self::ConnectionFailed { .. } => "ConnectionFailed",
            Self::JsonBody { source } if source.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "PayloadTooLarge"
            }
            Self::JsonBody { .. } => "MalformedBody",
            Self::MakeQuery { .. } => "StorageError",
            Self::BadEnvVar { .. }
            | Self::ParseConfigNumber { .. }
            | Self::ParseServerAddress { .. }
            | Self::BindListener { .. }
            | Self::Serve { .. } => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input
        const PTL: StatusCode = StatusCode::PAYLOAD_TOO_LARGE; //payload too large

        match self {
            Self::JsonBody { source } if source.status() == PTL => PTL,
            Self::Validation { .. }
            | Self::DuplicateKey { .. }
            | Self::InvalidIdentifier { .. }
            | Self::JsonBody { .. } => BI,
            Self::NotFound { .. } => NF,
            Self::ConnectionFailed { .. }
            | Self::MakeQuery { .. }
            | Self::BadEnvVar { .. }
            | Self::ParseConfigNumber { .. }
            | Self::ParseServerAddress { .. }
            | Self::BindListener { .. }
            | Self::Serve { .. } => ISE,
        }
    }
}

impl IntoResponse for RosterError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            error!(?self, "Error!");
        } else {
            debug!(?self, "Rejected request");
        }

        let body = json!({
            "error": self.reason(),
            "message": self.to_string(),
        });
        (status_code, Json(body)).into_response()
    }
}
