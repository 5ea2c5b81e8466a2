use crate::config::HttpConfig;
use anyhow::Result;
use std::time::Duration;

/// Builds the HTTP client shared by the remote collaborators.
///
/// Certificates are always verified. Endpoints signed by a private or
/// national CA are trusted by pointing `http.ca_cert_path` at its PEM file.
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();

    if config.timeout_seconds > 0 {
        builder = builder.timeout(Duration::from_secs(config.timeout_seconds));
    }

    if let Some(ref path) = config.ca_cert_path {
        let pem = std::fs::read(path).map_err(|e| {
            anyhow::anyhow!("Failed to read CA certificate {}: {}", path.display(), e)
        })?;
        let certificate = reqwest::Certificate::from_pem(&pem)
            .map_err(|e| anyhow::anyhow!("Invalid CA certificate {}: {}", path.display(), e))?;
        builder = builder.add_root_certificate(certificate);
        tracing::info!("Trusting additional CA certificate from {}", path.display());
    }

    builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_client_with_defaults() {
        assert!(build_client(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_build_client_without_timeout() {
        let config = HttpConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn test_missing_ca_certificate_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = HttpConfig {
            ca_cert_path: Some(dir.path().join("russian_trusted_root_ca.pem")),
            ..Default::default()
        };
        let err = build_client(&config).unwrap_err();
        assert!(err.to_string().contains("Failed to read CA certificate"));
    }
}
