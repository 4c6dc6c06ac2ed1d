//! The bridge as seen by the host app or the tunnel extension.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use pico_engine::{
    ConfigTranslator, EMPTY_GEO_DESCRIPTOR, EngineAbi, EngineController, EngineState,
    GeoDataKind, GeoDataRequest, LifecycleError, PortReservation, ResourceAllocator,
    RestartPolicy, ShareLink,
};
use pico_storage::{DegradedFeature, SharedStorage, StorageReport};

use crate::assembly::{AssembledConfig, ConfigAssembler};
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::logging::{LogGuard, init_tracing};

/// What happened to one configured dataset during preloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetOutcome {
    /// The engine loaded it and returned this descriptor.
    Loaded(String),
    /// The file is present but the engine returned no usable descriptor.
    Unusable,
    /// The file is not in the datasets directory.
    Missing,
}

/// Preload result for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetStatus {
    pub request: GeoDataRequest,
    pub outcome: DatasetOutcome,
}

/// One bridge per process: shared storage, translation, allocation and the
/// engine lifecycle behind a single handle.
#[derive(Debug)]
pub struct ProxyBridge {
    config: BridgeConfig,
    storage: SharedStorage,
    report: StorageReport,
    translator: ConfigTranslator,
    allocator: ResourceAllocator,
    assembler: ConfigAssembler,
    controller: EngineController,
}

impl ProxyBridge {
    /// Resolve and prepare shared storage, then wire the components to `engine`.
    ///
    /// Fails only when the shared root cannot be resolved or created.
    pub fn new(config: BridgeConfig, engine: Arc<dyn EngineAbi>) -> Result<Self> {
        let storage = SharedStorage::open(&*config.storage.resolver())?;
        Self::with_storage(config, storage, engine)
    }

    /// Like [`Self::new`] with already-resolved storage.
    pub fn with_storage(
        config: BridgeConfig,
        storage: SharedStorage,
        engine: Arc<dyn EngineAbi>,
    ) -> Result<Self> {
        let report = storage.ensure_ready()?;
        for feature in &report.degraded {
            warn!(feature = %feature, "Shared storage degraded");
        }

        let translator = ConfigTranslator::new(engine.clone())
            .with_encoding(config.engine.translation_response);
        let allocator =
            ResourceAllocator::new(engine.clone()).with_geo_encoding(config.engine.geo_response);
        let assembler = ConfigAssembler::new(
            storage.clone(),
            translator.clone(),
            allocator.clone(),
            config.assembly.clone(),
        );
        let controller = EngineController::new(engine).with_policy(config.engine.restart_policy);

        debug!(root = %storage.root().display(), "Proxy bridge ready");
        Ok(Self {
            config,
            storage,
            report,
            translator,
            allocator,
            assembler,
            controller,
        })
    }

    /// Install tracing with the configured settings, logging into the shared
    /// logs directory unless it degraded.
    pub fn init_logging(&self) -> Result<Option<LogGuard>> {
        let logs_dir = (!self.report.is_degraded(DegradedFeature::Logging))
            .then(|| self.storage.logs_dir());
        init_tracing(&self.config.logging, logs_dir)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Result of the storage bootstrap.
    pub fn storage_report(&self) -> &StorageReport {
        &self.report
    }

    pub fn state(&self) -> &EngineState {
        self.controller.state()
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Engine build version, or `"unknown"`.
    pub fn version(&self) -> String {
        self.controller.version()
    }

    /// Engine config for `links`, or `""`.
    pub fn links_to_config<L: AsRef<str>>(&self, links: &[L]) -> String {
        self.translator.links_to_config(links)
    }

    /// Share links for `config`; empty on failure.
    pub fn config_to_links(&self, config: &str) -> Vec<ShareLink> {
        self.translator.config_to_links(config)
    }

    /// One free port, or 0.
    pub fn allocate_free_port(&self) -> u16 {
        self.allocator.allocate_free_port()
    }

    pub fn allocate_free_ports(&self, count: u32) -> PortReservation {
        self.allocator.allocate_free_ports(count)
    }

    /// Descriptor of a loaded dataset, or `"{}"`.
    pub fn load_geo_data(&self, path: impl AsRef<Path>, kind: impl Into<GeoDataKind>) -> String {
        self.allocator.load_geo_data(path, kind)
    }

    /// Load every configured dataset found in the shared datasets directory.
    pub fn preload_datasets(&self) -> Vec<DatasetStatus> {
        self.config
            .datasets
            .iter()
            .map(|dataset| {
                let request =
                    GeoDataRequest::new(self.storage.dataset_path(&dataset.file), dataset.kind.clone());
                let outcome = if !request.path.is_file() {
                    debug!(path = %request.path.display(), kind = %request.kind, "Dataset not present, skipping");
                    DatasetOutcome::Missing
                } else {
                    match self.allocator.load(&request) {
                        descriptor if descriptor == EMPTY_GEO_DESCRIPTOR => DatasetOutcome::Unusable,
                        descriptor => DatasetOutcome::Loaded(descriptor),
                    }
                };
                DatasetStatus { request, outcome }
            })
            .collect()
    }

    /// Build and write `config.json` for `links`.
    pub fn assemble<L: AsRef<str>>(&self, links: &[L]) -> Result<AssembledConfig> {
        self.assembler.assemble(links)
    }

    /// Start from the shared `config.json`. Failures are logged only.
    pub fn start(&mut self) {
        let path = self.storage.config_path().to_path_buf();
        self.controller.start(path);
    }

    /// Start from an arbitrary config file. Failures are logged only.
    pub fn start_from(&mut self, config_path: impl AsRef<Path>) {
        self.controller.start(config_path);
    }

    /// Stop the engine; safe when already stopped.
    pub fn stop(&mut self) {
        self.controller.stop();
    }

    /// Assemble the config for `links`, preload datasets and start the engine.
    ///
    /// Under [`RestartPolicy::Reject`] a running engine is refused before
    /// `config.json` is touched, so the file keeps describing that engine.
    pub fn connect<L: AsRef<str>>(&mut self, links: &[L]) -> Result<AssembledConfig> {
        if self.controller.policy() == RestartPolicy::Reject {
            if let Some(version) = self.controller.state().version() {
                return Err(LifecycleError::AlreadyRunning {
                    version: version.to_string(),
                }
                .into());
            }
        }

        let assembled = self.assembler.assemble(links)?;

        let loaded = self
            .preload_datasets()
            .iter()
            .filter(|status| matches!(status.outcome, DatasetOutcome::Loaded(_)))
            .count();
        debug!(loaded, configured = self.config.datasets.len(), "Datasets preloaded");

        self.controller.try_start(&assembled.path)?;
        info!(
            port = ?assembled.inbound_port,
            version = ?self.controller.state().version(),
            "Connected"
        );
        Ok(assembled)
    }

    /// Stop the engine.
    pub fn disconnect(&mut self) {
        self.controller.stop();
    }
}
