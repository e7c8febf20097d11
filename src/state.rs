//! Shared application state.

use std::sync::Arc;

use crate::artifacts::{ArtifactCatalog, ArtifactStore};
use crate::config::Config;
use crate::gate::AccessGate;
use crate::handlers::{AdminConsole, DownloadController};
use crate::security::{BanRegistry, ChallengeVerifier, Signer};
use crate::storage::Storage;

/// Everything handlers and the gate need, built once at startup.
pub struct AppState {
    pub config: Arc<Config>,
    pub signer: Signer,
    pub store: Arc<dyn Storage>,
    pub catalog: Arc<ArtifactCatalog>,
    pub registry: BanRegistry,
    pub gate: AccessGate,
    pub downloads: DownloadController,
    pub admin: AdminConsole,
}

impl AppState {
    /// Wire the components around their collaborators.
    pub fn new(
        config: Config,
        store: Arc<dyn Storage>,
        verifier: Arc<dyn ChallengeVerifier>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        let config = Arc::new(config);
        let signer = Signer::new(&config.security.cookie_secret);
        let catalog = Arc::new(ArtifactCatalog::new(&config.artifacts.ids));
        let registry = BanRegistry::new(Arc::clone(&store));
        let gate = AccessGate::new(
            Arc::clone(&store),
            registry.clone(),
            Arc::new(config.access.clone()),
        );
        let downloads = DownloadController::new(
            Arc::clone(&catalog),
            Arc::clone(&store),
            verifier,
            artifacts,
        );
        let admin = AdminConsole::new(registry.clone(), Arc::clone(&store));

        Self {
            config,
            signer,
            store,
            catalog,
            registry,
            gate,
            downloads,
            admin,
        }
    }
}
