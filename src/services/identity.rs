//! External identity provider settings
//!
//! Google login only trusts what the browser-side Google SDK hands over, but
//! the provider settings still have to be resolved once per process. They
//! live in a one-time cell filled by `ensure_initialized` at startup.

use once_cell::sync::OnceCell;
use std::path::PathBuf;

use crate::config::GoogleConfig;

/// Environment variable naming the service account file
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Resolved Google identity settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProvider {
    pub project_id: Option<String>,
    pub credentials_path: Option<PathBuf>,
}

impl IdentityProvider {
    fn from_config(config: &GoogleConfig) -> Self {
        let credentials_path = config
            .credentials_path
            .clone()
            .or_else(|| std::env::var_os(CREDENTIALS_ENV).map(PathBuf::from));

        Self {
            project_id: config.project_id.clone(),
            credentials_path,
        }
    }

    /// Whether a service account is available
    pub fn has_credentials(&self) -> bool {
        self.credentials_path.is_some()
    }
}

static PROVIDER: OnceCell<IdentityProvider> = OnceCell::new();

/// Resolve the provider settings on first call; later calls return the
/// already stored value and ignore `config`.
pub fn ensure_initialized(config: &GoogleConfig) -> &'static IdentityProvider {
    PROVIDER.get_or_init(|| {
        let provider = IdentityProvider::from_config(config);
        tracing::info!(
            project_id = provider.project_id.as_deref().unwrap_or("-"),
            has_credentials = provider.has_credentials(),
            "Google identity provider initialized"
        );
        provider
    })
}
