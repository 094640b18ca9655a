//! CORS layer configuration.

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

use chatrelay_core::config::app::CorsConfig;

/// Builds a CORS tower layer from configuration.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    if config.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer.allow_origin(origins);
    }

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    if config.allowed_headers.iter().any(|h| h == "*") {
        layer = layer.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        layer = layer.allow_headers(headers);
    }

    layer.max_age(Duration::from_secs(config.max_age_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_from_defaults_and_explicit_lists() {
        let _ = build_cors_layer(&CorsConfig::default());
        let _ = build_cors_layer(&CorsConfig {
            allowed_origins: vec!["http://localhost:3000".into()],
            allowed_methods: vec!["GET".into(), "POST".into()],
            allowed_headers: vec!["authorization".into(), "content-type".into()],
            max_age_seconds: 60,
        });
    }
}
