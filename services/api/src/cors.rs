//! CORS policy construction
//!
//! Three alternative policies exist; exactly one is mounted per process,
//! selected by `CORS_MODE`. Only the allow-list policy is suitable for
//! production — the mirror and permissive variants grant broad cross-origin
//! access and are for development and debugging.

use std::str::FromStr;
use std::time::Duration;

use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Which CORS policy to mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorsMode {
    /// Credentialed access for a fixed set of origins (production)
    Allowlist,
    /// Reflects whatever origin the request carries (development only)
    Mirror,
    /// Wildcard, non-credentialed (development only)
    Permissive,
}

impl FromStr for CorsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allowlist" => Ok(CorsMode::Allowlist),
            "mirror" => Ok(CorsMode::Mirror),
            "permissive" => Ok(CorsMode::Permissive),
            other => Err(format!("Unknown CORS mode: {}", other)),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub mode: CorsMode,
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// Create a new CorsConfig from environment variables
    ///
    /// # Environment Variables
    /// - `CORS_MODE`: `allowlist` (default), `mirror`, or `permissive`
    /// - `CORS_ALLOWED_ORIGINS`: comma-separated origin list for allowlist mode
    pub fn from_env() -> anyhow::Result<Self> {
        let mode = match std::env::var("CORS_MODE") {
            Ok(raw) => raw
                .parse::<CorsMode>()
                .map_err(|e| anyhow::anyhow!(e))?,
            Err(_) => CorsMode::Allowlist,
        };

        let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(CorsConfig {
            mode,
            allowed_origins,
        })
    }
}

/// Build the CORS layer for the configured policy.
///
/// Invalid allow-list origins abort startup: misconfiguration should fail
/// fast rather than silently blocking the frontend.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config.mode {
        CorsMode::Allowlist => {
            let origins: Vec<_> = config
                .allowed_origins
                .iter()
                .map(|origin| {
                    origin
                        .parse()
                        .unwrap_or_else(|e| panic!("Invalid CORS origin '{}': {}", origin, e))
                })
                .collect();

            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                ])
                .allow_headers([CONTENT_TYPE, AUTHORIZATION])
                .allow_credentials(true)
                .max_age(Duration::from_secs(3600))
        }
        CorsMode::Mirror => {
            warn!("CORS mirror mode grants credentialed access to any origin; never use in production");
            CorsLayer::new()
                .allow_origin(AllowOrigin::mirror_request())
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                ])
                .allow_headers([CONTENT_TYPE, AUTHORIZATION])
                .allow_credentials(true)
                .max_age(Duration::from_secs(3600))
        }
        CorsMode::Permissive => {
            warn!("CORS permissive mode is wide open; never use in production");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn config_defaults_to_allowlist_mode() {
        unsafe {
            std::env::remove_var("CORS_MODE");
            std::env::remove_var("CORS_ALLOWED_ORIGINS");
        }

        let config = CorsConfig::from_env().unwrap();
        assert_eq!(config.mode, CorsMode::Allowlist);
        assert_eq!(config.allowed_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    #[serial]
    fn config_reads_mode_and_origins_from_env() {
        unsafe {
            std::env::set_var("CORS_MODE", "mirror");
            std::env::set_var(
                "CORS_ALLOWED_ORIGINS",
                "https://app.constru.app, https://staging.constru.app",
            );
        }

        let config = CorsConfig::from_env().unwrap();
        assert_eq!(config.mode, CorsMode::Mirror);
        assert_eq!(
            config.allowed_origins,
            vec!["https://app.constru.app", "https://staging.constru.app"]
        );

        unsafe {
            std::env::remove_var("CORS_MODE");
            std::env::remove_var("CORS_ALLOWED_ORIGINS");
        }
    }

    #[test]
    fn mode_parses_from_config_strings() {
        assert_eq!("allowlist".parse::<CorsMode>(), Ok(CorsMode::Allowlist));
        assert_eq!("mirror".parse::<CorsMode>(), Ok(CorsMode::Mirror));
        assert_eq!("permissive".parse::<CorsMode>(), Ok(CorsMode::Permissive));
        assert!("open".parse::<CorsMode>().is_err());
    }

    #[test]
    fn each_mode_builds_a_layer() {
        let config = CorsConfig {
            mode: CorsMode::Allowlist,
            allowed_origins: vec!["http://localhost:5173".to_string()],
        };
        let _ = build_cors_layer(&config);

        for mode in [CorsMode::Mirror, CorsMode::Permissive] {
            let config = CorsConfig {
                mode,
                allowed_origins: vec![],
            };
            let _ = build_cors_layer(&config);
        }
    }
}
