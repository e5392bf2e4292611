//! Application state shared by the middleware and handlers.

use crate::config::ServerConfig;
use crate::error::ErrorSettings;
use formulaic_auth::AuthGuard;
use formulaic_core::ExposureGroups;
use std::sync::Arc;

/// Configuration, exposure groups and the request guard.
///
/// # Examples
///
/// ```ignore
/// let config = ServerConfig::from_env()?;
/// let guard = AuthGuard::new(verifier, abilities);
/// let state = AppState::new(config, guard);
///
/// let app = Router::new()
///     .route("/articles/:id", get(show_article))
///     .layer(RequestContextLayer::new(state.clone()))
///     .with_state(state);
/// ```
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    groups: ExposureGroups,
    guard: AuthGuard,
}

impl AppState {
    /// Build the state, resolving exposure groups from `config`.
    #[must_use]
    pub fn new(config: ServerConfig, guard: AuthGuard) -> Self {
        let groups = config.exposure_groups();
        Self {
            config: Arc::new(config),
            groups,
            guard,
        }
    }

    /// Server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Exposure groups responses are rendered with.
    #[must_use]
    pub const fn groups(&self) -> &ExposureGroups {
        &self.groups
    }

    /// The request guard.
    #[must_use]
    pub const fn guard(&self) -> &AuthGuard {
        &self.guard
    }

    /// Settings for rendering error responses.
    #[must_use]
    pub fn error_settings(&self) -> ErrorSettings {
        ErrorSettings {
            groups: self.groups.clone(),
            service: self.config.service_name.clone(),
            version: self.config.service_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use formulaic_auth::mocks::MockTokenVerifier;
    use formulaic_auth::{Ability, UserContext};
    use formulaic_core::group;

    fn deny_all(_: Option<&UserContext>) -> Ability {
        Ability::default()
    }

    #[test]
    fn error_settings_follow_config() {
        let mut config = ServerConfig::for_environment(Environment::Production);
        config.service_name = "articles".to_string();
        let guard = AuthGuard::new(MockTokenVerifier::new(), deny_all);

        let settings = AppState::new(config, guard).error_settings();
        assert_eq!(settings.service, "articles");
        assert!(settings.groups.contains(group::INFO));
        assert!(!settings.groups.contains(group::DEBUG));
    }
}
