use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::metrics::PrometheusMetrics;
use matcher::{HttpPeerClient, MatchingService};
use metrics_exporter_prometheus::PrometheusHandle;
use resolver::{HttpResolver, Resolver, StaticResolver};
use std::path::PathBuf;
use std::sync::Arc;
use table::EquivalenceTable;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Matching service (shared across requests)
    pub service: Arc<MatchingService>,

    /// Snapshot writer, when a snapshot path is configured
    pub persistence: Option<Arc<Persistence>>,

    /// Prometheus render handle, when the recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl ServerState {
    /// Build table, resolver, peer client and matching service from config
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let table = match &config.snapshot_path {
            Some(path) if path.exists() => EquivalenceTable::load(path)?,
            Some(path) => {
                tracing::info!(path = %path.display(), "no snapshot yet, starting empty");
                EquivalenceTable::new()
            }
            None => EquivalenceTable::new(),
        }
        .with_max_depth(config.max_traversal_depth);

        let resolver: Arc<dyn Resolver> = match &config.resolver.directory_url {
            Some(url) => Arc::new(
                HttpResolver::new(url)?
                    .with_timeout(config.resolver.timeout())?
                    .with_cache_ttl(config.resolver.cache_ttl()),
            ),
            None => Arc::new(StaticResolver::from_map(
                config
                    .resolver
                    .namespaces
                    .iter()
                    .map(|(namespace, endpoint)| (namespace.clone(), endpoint.clone())),
            )),
        };

        let mut federation = config.federation.clone();
        if federation.own_endpoint.is_none() {
            federation.own_endpoint = config.public_endpoint.clone();
        }
        let peers = Arc::new(HttpPeerClient::new(federation.peer_timeout)?);

        let mut service = MatchingService::with_config(Arc::new(table), resolver, peers, federation);
        if config.metrics_enabled {
            service = service.with_metrics(Arc::new(PrometheusMetrics));
        }

        Ok(Self::from_parts(config, service))
    }

    /// Assemble state around an already built service
    pub fn from_parts(config: ServerConfig, service: MatchingService) -> Self {
        let persistence = config
            .snapshot_path
            .clone()
            .map(|path| Arc::new(Persistence::new(path, config.persist_on_change)));

        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            persistence,
            metrics_handle: None,
        }
    }

    pub fn with_metrics_handle(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Write the snapshot after a mutation, if configured to
    pub async fn persist_after_change(&self) -> ServerResult<()> {
        match &self.persistence {
            Some(persistence) if persistence.on_change => {
                persistence.save(self.service.table().clone()).await
            }
            _ => Ok(()),
        }
    }

    /// Write the snapshot unconditionally, if a path is configured
    pub async fn persist_now(&self) -> ServerResult<()> {
        match &self.persistence {
            Some(persistence) => persistence.save(self.service.table().clone()).await,
            None => Ok(()),
        }
    }
}

/// Serialised snapshot writes to one file
pub struct Persistence {
    path: PathBuf,
    on_change: bool,
    write_lock: tokio::sync::Mutex<()>,
}

impl Persistence {
    pub fn new(path: PathBuf, on_change: bool) -> Self {
        Self {
            path,
            on_change,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn save(&self, table: Arc<EquivalenceTable>) -> ServerResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || table.save(&path))
            .await
            .map_err(|err| ServerError::Persistence(err.to_string()))?
            .map_err(|err| ServerError::Persistence(err.to_string()))
    }
}
