use askama::Template;
use askama_axum::IntoResponse;

use common::prelude::build_info;

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub version: &'static str,
    pub build_profile: &'static str,
}

/// Landing page describing the gateway routes
pub async fn handler() -> askama_axum::Response {
    let build = build_info();
    let template = IndexTemplate {
        version: build.version,
        build_profile: build.build_profile,
    };

    template.into_response()
}
