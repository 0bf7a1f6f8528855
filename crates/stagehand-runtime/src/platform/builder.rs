//! Platform construction.

use super::Platform;
use crate::config::StageConfig;
use crate::discovery::{DirectoryScanProvider, OriginProvider};
use crate::listener::{ListenerRegistry, ListenerResolver};
use crate::resource::{MaterializeOptions, ResourceMaterializer};
use crate::settings::SettingsStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Builder for [`Platform`].
///
/// # Example
///
/// ```no_run
/// use stagehand_runtime::config::StageConfig;
/// use stagehand_runtime::listener::ListenerRegistry;
/// use stagehand_runtime::PlatformBuilder;
///
/// let config = StageConfig::default().resolved(std::path::Path::new("/srv/app"));
/// let mut platform = PlatformBuilder::new(config)
///     .with_resolver(ListenerRegistry::new())
///     .build();
/// let report = platform.start();
/// ```
pub struct PlatformBuilder {
    config: StageConfig,
    providers: Vec<Box<dyn OriginProvider>>,
    resolver: Option<Arc<dyn ListenerResolver>>,
    settings: Option<SettingsStore>,
    log_status: Option<SettingsStore>,
}

impl PlatformBuilder {
    /// Starts from an already resolved configuration.
    #[must_use]
    pub fn new(config: StageConfig) -> Self {
        Self {
            config,
            providers: Vec::new(),
            resolver: None,
            settings: None,
            log_status: None,
        }
    }

    /// Adds an origin provider.
    ///
    /// When no provider is added, a [`DirectoryScanProvider`] over
    /// `paths.origins` is used.
    #[must_use]
    pub fn with_provider(mut self, provider: impl OriginProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Sets the listener resolver (defaults to an empty [`ListenerRegistry`]).
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl ListenerResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets a shared listener resolver.
    #[must_use]
    pub fn with_shared_resolver(mut self, resolver: Arc<dyn ListenerResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Uses `store` instead of loading `paths.settings_file`.
    #[must_use]
    pub fn with_settings(mut self, store: SettingsStore) -> Self {
        self.settings = Some(store);
        self
    }

    /// Uses `store` instead of loading `paths.log_status_file`.
    #[must_use]
    pub fn with_log_status(mut self, store: SettingsStore) -> Self {
        self.log_status = Some(store);
        self
    }

    /// Builds the platform.
    ///
    /// Unreadable stores are logged and replaced with empty ones; this
    /// never fails.
    #[must_use]
    pub fn build(self) -> Platform {
        let config = self.config;
        let settings = self
            .settings
            .unwrap_or_else(|| SettingsStore::open_or_default(&config.paths.settings_file));
        let log_status = self
            .log_status
            .unwrap_or_else(|| SettingsStore::open_or_default(&config.paths.log_status_file));

        let environment = settings.to_map();
        if config.export_env {
            export_environment(&environment);
        }

        let providers = if self.providers.is_empty() {
            let scan = DirectoryScanProvider::new(config.paths.origins.iter().cloned())
                .with_max_depth(config.discovery.max_depth)
                .follow_links(config.discovery.follow_links);
            vec![Box::new(scan) as Box<dyn OriginProvider>]
        } else {
            self.providers
        };
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(ListenerRegistry::new()));
        let materializer = ResourceMaterializer::new(MaterializeOptions::from(&config.resources));

        info!(
            namespace = %config.namespace,
            settings = settings.len(),
            webroot = %config.paths.webroot.display(),
            "platform constructed"
        );

        Platform {
            config,
            settings,
            log_status,
            environment,
            registry: Default::default(),
            providers,
            resolver,
            materializer,
            started: false,
        }
    }
}

/// Copies settings into the process environment.
///
/// Keys or values the OS cannot represent are skipped.
fn export_environment(values: &std::collections::BTreeMap<String, String>) {
    let mut exported = 0usize;
    for (k, v) in values {
        if k.is_empty() || k.contains('=') || k.contains('\0') || v.contains('\0') {
            debug!(key = %k, "not exportable, skipped");
            continue;
        }
        std::env::set_var(k, v);
        exported += 1;
    }
    debug!(exported, "settings exported to environment");
}
