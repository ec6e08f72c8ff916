//! Model lifecycle: loading, caching, unloading and status reporting for the
//! embedding model behind intent recognition.
//!
//! Load sequence:
//!
//! 1. prepare the backend ([`ModelSource::prepare_backend`])
//! 2. read [`CacheMetadata`]; if its version matches, try the local copy
//! 3. otherwise (or if the local copy fails) fetch remotely, unless offline
//! 4. embed every catalogue example in one batch into an [`EmbeddingCache`]
//! 5. persist fresh metadata
//!
//! Only one load runs at a time. Concurrent callers wait for the running
//! attempt and share its outcome.

pub mod connectivity;
pub mod metadata;
pub mod source;
pub mod status;

use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use thea_core::config::{Config, ModelConfig};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::catalogue::IntentCatalogue;
use crate::embedding::{Embedder, EmbeddingCache, TracedEmbedder};

pub use connectivity::{Connectivity, StaticConnectivity};
pub use metadata::{CacheMetadata, InMemoryMetadataStore, JsonFileMetadataStore, MetadataStore, StoreError};
pub use source::{ModelError, ModelManifest, ModelSource, ProviderModelSource};
pub use status::{LoadFailure, ModelOrigin, ModelStatus};

/// Observer for status changes. Only one is registered at a time.
pub type StatusCallback = Arc<dyn Fn(&ModelStatus) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// Cached models with a different version are not used.
    pub model_version: String,
    /// Minimum time between periodic `last_used` refreshes.
    pub touch_interval: Duration,
    /// Debug instrumentation used when the recognizer triggers a load.
    pub debug: bool,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            model_version: "1".to_string(),
            touch_interval: Duration::from_secs(300),
            debug: false,
        }
    }
}

impl From<&ModelConfig> for LifecycleSettings {
    fn from(config: &ModelConfig) -> Self {
        Self {
            model_version: config.version.clone(),
            touch_interval: Duration::from_secs(config.touch_interval_secs),
            debug: config.debug,
        }
    }
}

/// A loaded model together with its example embeddings.
#[derive(Clone)]
pub struct LoadedModel {
    pub embedder: Arc<dyn Embedder>,
    pub cache: Arc<EmbeddingCache>,
    pub origin: ModelOrigin,
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadPhase {
    Idle,
    InFlight,
    Finished(bool),
}

/// Resets the phase if the loading future is dropped before finishing.
struct InFlight<'a> {
    phase: &'a watch::Sender<LoadPhase>,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn finish(&mut self, ok: bool) {
        self.done = true;
        self.phase.send_replace(LoadPhase::Finished(ok));
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.phase.send_replace(LoadPhase::Finished(false));
        }
    }
}

struct StatusState {
    current: ModelStatus,
    callback: Option<StatusCallback>,
}

pub struct ModelLifecycle {
    source: Arc<dyn ModelSource>,
    metadata: Arc<dyn MetadataStore>,
    connectivity: Arc<dyn Connectivity>,
    catalogue: Arc<IntentCatalogue>,
    settings: LifecycleSettings,
    model: RwLock<Option<LoadedModel>>,
    phase: watch::Sender<LoadPhase>,
    status: Mutex<StatusState>,
    last_touch: Mutex<Option<Instant>>,
}

impl ModelLifecycle {
    pub fn new(
        source: Arc<dyn ModelSource>,
        metadata: Arc<dyn MetadataStore>,
        connectivity: Arc<dyn Connectivity>,
        catalogue: Arc<IntentCatalogue>,
        settings: LifecycleSettings,
    ) -> Self {
        let (phase, _) = watch::channel(LoadPhase::Idle);
        Self {
            source,
            metadata,
            connectivity,
            catalogue,
            settings,
            model: RwLock::new(None),
            phase,
            status: Mutex::new(StatusState {
                current: ModelStatus::NotStarted,
                callback: None,
            }),
            last_touch: Mutex::new(None),
        }
    }

    /// Wire the configured provider, a JSON metadata file in the cache
    /// directory and the given connectivity probe.
    pub fn from_config(
        config: &Config,
        catalogue: Arc<IntentCatalogue>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        let cache_dir = &config.model.cache_dir;
        Self::new(
            Arc::new(ProviderModelSource::new(config.embedding.clone(), cache_dir)),
            Arc::new(JsonFileMetadataStore::new(cache_dir)),
            connectivity,
            catalogue,
            LifecycleSettings::from(&config.model),
        )
    }

    pub fn catalogue(&self) -> &Arc<IntentCatalogue> {
        &self.catalogue
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.read().unwrap().is_some()
    }

    /// Snapshot of the loaded model, if any.
    pub fn loaded(&self) -> Option<LoadedModel> {
        self.model.read().unwrap().clone()
    }

    /// Debug flag of the loaded model, or the configured default.
    pub fn debug_enabled(&self) -> bool {
        self.loaded()
            .map(|m| m.debug)
            .unwrap_or(self.settings.debug)
    }

    pub fn status(&self) -> ModelStatus {
        self.status.lock().unwrap().current.clone()
    }

    /// Register the status observer, replacing any previous one. It is
    /// called right away with the current status.
    pub fn on_status<F>(&self, callback: F)
    where
        F: Fn(&ModelStatus) + Send + Sync + 'static,
    {
        let callback: StatusCallback = Arc::new(callback);
        let current = {
            let mut state = self.status.lock().unwrap();
            state.callback = Some(callback.clone());
            state.current.clone()
        };
        callback(&current);
    }

    pub fn clear_status_callback(&self) {
        self.status.lock().unwrap().callback = None;
    }

    /// Load the model unless it is already loaded. Returns whether a model
    /// is available afterwards; failures are reported through the status.
    pub async fn load(&self, enable_debug: bool) -> bool {
        if self.is_loaded() {
            self.touch_metadata().await;
            return true;
        }

        if !self.claim_load() {
            return self.wait_for_load().await;
        }

        let mut in_flight = InFlight {
            phase: &self.phase,
            done: false,
        };

        // Another caller may have finished between the check and the claim.
        if self.is_loaded() {
            in_flight.finish(true);
            self.touch_metadata().await;
            return true;
        }

        let ok = self.run_load(enable_debug).await;
        in_flight.finish(ok);
        ok
    }

    /// Load with the configured debug setting.
    pub async fn ensure_loaded(&self) -> bool {
        self.load(self.debug_enabled()).await
    }

    /// Drop the model and its example embeddings. Always succeeds.
    pub async fn unload(&self) -> bool {
        // A running load would store its model after we return.
        if self.load_in_flight() {
            self.wait_for_load().await;
        }
        let was_loaded = self.take_model().is_some();

        self.phase.send_if_modified(|phase| {
            if *phase == LoadPhase::InFlight {
                false
            } else {
                *phase = LoadPhase::Idle;
                true
            }
        });

        if was_loaded {
            self.set_status(ModelStatus::Unloaded);
            self.touch_metadata().await;
        } else {
            debug!("unload requested with no model loaded");
        }
        true
    }

    /// Unload and load again, e.g. to toggle debug instrumentation.
    pub async fn reload(&self, enable_debug: bool) -> bool {
        if !self.unload().await {
            return false;
        }
        self.load(enable_debug).await
    }

    /// Refresh `last_used` if the touch interval has elapsed. Returns whether
    /// a refresh happened.
    pub async fn touch_if_due(&self) -> bool {
        if !self.is_loaded() {
            return false;
        }
        let due = {
            let mut last = self.last_touch.lock().unwrap();
            match *last {
                Some(at) if at.elapsed() < self.settings.touch_interval => false,
                _ => {
                    *last = Some(Instant::now());
                    true
                }
            }
        };
        if due {
            self.touch_metadata().await;
        }
        due
    }

    fn load_in_flight(&self) -> bool {
        *self.phase.borrow() == LoadPhase::InFlight
    }

    fn claim_load(&self) -> bool {
        let mut claimed = false;
        self.phase.send_if_modified(|phase| {
            if *phase == LoadPhase::InFlight {
                false
            } else {
                *phase = LoadPhase::InFlight;
                claimed = true;
                true
            }
        });
        claimed
    }

    async fn wait_for_load(&self) -> bool {
        debug!("model load already in flight, waiting for it");
        let mut rx = self.phase.subscribe();
        let phase = match rx.wait_for(|p| *p != LoadPhase::InFlight).await {
            Ok(phase) => *phase,
            Err(_) => LoadPhase::Finished(false),
        };
        match phase {
            LoadPhase::Finished(ok) => ok,
            _ => self.is_loaded(),
        }
    }

    async fn run_load(&self, enable_debug: bool) -> bool {
        self.set_status(ModelStatus::Initializing);
        if let Err(e) = self.source.prepare_backend().await {
            return self.fail(LoadFailure::Backend(e.to_string()));
        }

        let cached = match self.metadata.read().await {
            Ok(meta) => meta,
            Err(e) => {
                warn!(error = %e, "could not read model cache metadata");
                None
            }
        };

        let mut local = None;
        match &cached {
            Some(meta) if meta.version == self.settings.model_version => {
                self.set_status(ModelStatus::LoadingFromCache);
                match self.source.load_local().await {
                    Ok(embedder) => local = Some(embedder),
                    Err(e) => {
                        warn!(error = %e, "cached model unusable, discarding it");
                        self.discard_cached().await;
                    }
                }
            }
            Some(meta) => {
                info!(
                    cached = %meta.version,
                    expected = %self.settings.model_version,
                    "cached model version mismatch"
                );
                self.discard_cached().await;
            }
            None => debug!("no cached model metadata"),
        }

        let (embedder, origin) = match local {
            Some(embedder) => (embedder, ModelOrigin::Cache),
            None => {
                if !self.connectivity.is_online() {
                    return self.fail(LoadFailure::Offline);
                }
                self.set_status(ModelStatus::LoadingFromServer);
                match self.source.load_remote().await {
                    Ok(embedder) => {
                        if let Err(e) = self.source.save_local(&embedder).await {
                            warn!(error = %e, "could not keep a local copy of the model");
                        }
                        (embedder, ModelOrigin::Remote)
                    }
                    Err(e) => return self.fail(LoadFailure::Fetch(e.to_string())),
                }
            }
        };

        let embedder: Arc<dyn Embedder> = if enable_debug {
            Arc::new(TracedEmbedder::new(embedder))
        } else {
            embedder
        };

        self.set_status(ModelStatus::PreparingEmbeddings {
            examples: self.catalogue.unique_examples().len(),
        });
        let cache = match EmbeddingCache::populate(embedder.as_ref(), &self.catalogue).await {
            Ok(cache) => cache,
            Err(e) => return self.fail(LoadFailure::Embeddings(e.to_string())),
        };

        self.store_model(LoadedModel {
            embedder,
            cache: Arc::new(cache),
            origin,
            debug: enable_debug,
        });

        let meta = CacheMetadata::new(self.settings.model_version.clone(), origin);
        if let Err(e) = self.metadata.write(&meta).await {
            warn!(error = %e, "could not persist model cache metadata");
        }
        *self.last_touch.lock().unwrap() = Some(Instant::now());

        self.set_status(ModelStatus::Ready { origin });
        true
    }

    /// Drop the local model copy and the metadata describing it.
    async fn discard_cached(&self) {
        if let Err(e) = self.source.remove_cached().await {
            warn!(error = %e, "could not remove cached model");
        }
        if let Err(e) = self.metadata.clear().await {
            warn!(error = %e, "could not clear model cache metadata");
        }
    }

    async fn touch_metadata(&self) {
        match self.metadata.read().await {
            Ok(Some(meta)) => {
                if let Err(e) = self.metadata.write(&meta.touched()).await {
                    warn!(error = %e, "could not refresh model last-used time");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read model cache metadata"),
        }
    }

    fn store_model(&self, model: LoadedModel) {
        *self.model.write().unwrap() = Some(model);
    }

    fn take_model(&self) -> Option<LoadedModel> {
        self.model.write().unwrap().take()
    }

    fn set_status(&self, status: ModelStatus) {
        info!(progress = status.percent(), source = self.source.name(), "{}", status);
        let callback = {
            let mut state = self.status.lock().unwrap();
            state.current = status.clone();
            state.callback.clone()
        };
        if let Some(callback) = callback {
            callback(&status);
        }
    }

    fn fail(&self, reason: LoadFailure) -> bool {
        warn!(reason = %reason, "model load failed");
        self.set_status(ModelStatus::Failed { reason });
        false
    }
}
