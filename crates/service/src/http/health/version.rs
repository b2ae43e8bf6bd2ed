use axum::Json;
use serde::Serialize;

use common::prelude::build_info;
use common::version::BuildInfo;

const SERVICE_NAME: &str = "dagway";

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    service: &'static str,
    #[serde(flatten)]
    build: BuildInfo,
}

pub async fn handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: SERVICE_NAME,
        build: build_info(),
    })
}
