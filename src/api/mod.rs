//! HTTP API
//!
//! Routes are grouped by resource; each submodule exposes `routes()` which
//! the server nests under `/api`.

pub mod channel;
pub mod comparison;
pub mod error;
pub mod health;
pub mod server;
pub mod session;
pub mod trending;
pub mod video;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use server::{create_router, ApiServer, AppState, ServerError};

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::export::CsvExport;

/// Query booleans are opt-out
pub(crate) fn default_true() -> bool {
    true
}

/// Serve an export as a CSV download
pub(crate) fn csv_attachment(export: CsvExport) -> Response {
    let disposition = format!("attachment; filename={}", export.filename);
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response()
}
