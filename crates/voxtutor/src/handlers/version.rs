use axum::Json;
use serde::Serialize;

/// Build metadata reported by `GET /version`.
#[derive(Serialize)]
pub struct VersionResponse {
    pub service: &'static str,
    pub version: &'static str,
}

pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
