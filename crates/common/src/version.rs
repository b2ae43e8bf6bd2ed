use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_profile: &'static str,
    pub build_features: Vec<&'static str>,
}

pub fn build_info() -> BuildInfo {
    let build_profile = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };

    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_profile,
        build_features: Vec::new(),
    }
}
