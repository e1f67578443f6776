//! Store client construction and runtime reconfiguration.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::config::Credentials;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{StaticCredentials, StoreConfig};
use crate::dynamodb::{DocumentStore, SdkStore};

const CREDENTIALS_PROVIDER_NAME: &str = "dynamodb-helpers";

/// Builds a [`DocumentStore`] from connection settings.
#[async_trait]
pub trait StoreBuilder: Send + Sync {
    async fn build(&self, config: &StoreConfig) -> Arc<dyn DocumentStore>;
}

/// Default builder: loads an SDK config for the region, credentials and
/// endpoint, and wraps a fresh `aws_sdk_dynamodb::Client`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkStoreBuilder;

#[async_trait]
impl StoreBuilder for SdkStoreBuilder {
    async fn build(&self, config: &StoreConfig) -> Arc<dyn DocumentStore> {
        let mut sdk_config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(credentials) = &config.credentials {
            sdk_config_loader = sdk_config_loader.credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                credentials.session_token.clone(),
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        }

        if let Some(endpoint) = &config.endpoint_url {
            sdk_config_loader = sdk_config_loader.endpoint_url(endpoint);
        }

        let sdk_config = sdk_config_loader.load().await;
        Arc::new(SdkStore::new(&sdk_config))
    }
}

/// Holds the mutable connection settings and the client built from them.
///
/// Setters rebuild the client. Rebuilds are serialized, so the last change
/// wins and the installed client always matches the latest settings.
/// [`ClientFactory::store`] hands out a snapshot: an operation that already
/// took one keeps using it after a reconfiguration.
pub struct ClientFactory {
    config: Mutex<StoreConfig>,
    current: RwLock<Arc<dyn DocumentStore>>,
    builder: Arc<dyn StoreBuilder>,
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ClientFactory {
    pub async fn new(config: StoreConfig, builder: Arc<dyn StoreBuilder>) -> Self {
        let store = builder.build(&config).await;
        info!("Store client built for {}", config.target_display());
        Self {
            config: Mutex::new(config),
            current: RwLock::new(store),
            builder,
        }
    }

    /// Returns the client currently installed.
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns a copy of the current settings.
    pub async fn config(&self) -> StoreConfig {
        self.config.lock().await.clone()
    }

    pub async fn set_region(&self, region: impl Into<String>) {
        let region = region.into();
        self.update(move |config| config.region = region).await;
    }

    pub async fn set_credentials(
        &self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) {
        let credentials = StaticCredentials::new(access_key_id, secret_access_key);
        self.update(move |config| config.credentials = Some(credentials))
            .await;
    }

    /// Drops static credentials, falling back to the SDK's default chain.
    pub async fn clear_credentials(&self) {
        self.update(|config| config.credentials = None).await;
    }

    pub async fn set_endpoint_url(&self, url: Option<String>) {
        self.update(move |config| config.endpoint_url = url).await;
    }

    /// Replaces every setting at once.
    pub async fn reconfigure(&self, new_config: StoreConfig) {
        self.update(move |config| *config = new_config).await;
    }

    async fn update(&self, change: impl FnOnce(&mut StoreConfig)) {
        let mut config = self.config.lock().await;
        change(&mut config);

        let store = self.builder.build(&config).await;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = store;
        info!("Store client rebuilt for {}", config.target_display());
    }
}
