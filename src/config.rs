use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "strokesense";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Neighbors returned on the similarity path unless overridden.
pub const DEFAULT_TOP_K: usize = 5;

/// Bound on the embed+upsert+query sequence per request.
pub const DEFAULT_RETRIEVAL_TIMEOUT: Duration = Duration::from_millis(2_000);

pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info,tower_http=warn")
}

/// Get the application data directory.
/// Overridable with STROKESENSE_DATA_DIR; otherwise ~/.strokesense/.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STROKESENSE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".strokesense")
}

/// Path of the serving model artifact (encoding table + tree ensemble).
pub fn artifact_path() -> PathBuf {
    if let Ok(path) = std::env::var("STROKESENSE_ARTIFACT") {
        return PathBuf::from(path);
    }
    data_dir().join("model").join("stroke-model.json")
}

/// Listen address for the HTTP boundary.
pub fn bind_addr() -> String {
    std::env::var("STROKESENSE_BIND").unwrap_or_else(|_| "127.0.0.1:8787".to_string())
}

/// Base URL of an external embedding service, if one is configured.
/// Absent means the built-in deterministic embedder.
pub fn embed_service_url() -> Option<String> {
    std::env::var("STROKESENSE_EMBED_URL").ok()
}

/// Model name passed to the external embedding service.
pub fn embed_model() -> String {
    std::env::var("STROKESENSE_EMBED_MODEL").unwrap_or_else(|_| "nomic-embed-text".to_string())
}

/// Webhook to POST decision events to. Absent means log-only alerts.
pub fn alert_webhook_url() -> Option<String> {
    std::env::var("STROKESENSE_ALERT_WEBHOOK").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_path_is_under_data_dir() {
        // Only meaningful when the env overrides are not set.
        if std::env::var("STROKESENSE_ARTIFACT").is_err()
            && std::env::var("STROKESENSE_DATA_DIR").is_err()
        {
            assert!(artifact_path().starts_with(data_dir()));
            assert!(artifact_path().ends_with("model/stroke-model.json"));
        }
    }

    #[test]
    fn log_filter_scopes_to_the_crate() {
        assert!(default_log_filter().starts_with("strokesense="));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
