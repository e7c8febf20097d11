//! macrogate - access-controlled macro download gateway.

use std::sync::Arc;

use macrogate::artifacts::{FsArtifactStore, seed_placeholders};
use macrogate::config::is_weak_secret;
use macrogate::security::HttpChallengeVerifier;
use macrogate::storage::Storage;
use macrogate::{AppState, Config, Database, http, metrics, telemetry};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config {config_path}: {e}");
            return Err(e.into());
        }
    };

    telemetry::init_tracing(&config.logging);

    info!(
        listen = %config.server.listen,
        artifacts = config.artifacts.ids.len(),
        "Starting macrogate"
    );

    // SECURITY: Refuse to start with a weak cookie secret.
    // Sessions, fingerprints and sticky bans are all forgeable with a guessable key.
    if is_weak_secret(&config.security.cookie_secret) {
        if std::env::var("MACROGATE_ALLOW_INSECURE_SECRET").is_ok() {
            warn!(
                "INSECURE: Running with weak cookie_secret (allowed via MACROGATE_ALLOW_INSECURE_SECRET)"
            );
        } else {
            error!("FATAL: Insecure cookie_secret detected!");
            error!("  The cookie_secret signs session, fingerprint and sticky ban cookies.");
            error!("  With a weak secret, banned clients can mint their own cookies.");
            error!("");
            error!("  To fix, set a strong secret in config.toml:");
            error!("    [security]");
            error!("    cookie_secret = \"<random-48-char-string>\"");
            error!("");
            error!("  Generate a secure secret with:");
            error!("    openssl rand -hex 32");
            error!("");
            error!("  For testing only, set MACROGATE_ALLOW_INSECURE_SECRET=1 to bypass this check.");
            return Err(anyhow::anyhow!(
                "Refusing to start with insecure cookie_secret. See error messages above."
            ));
        }
    }

    // Initialize database
    let db = Database::new(&config.database.path).await?;
    db.seed_counters(&config.artifacts.ids).await?;
    info!(count = config.artifacts.ids.len(), "Download counters seeded");

    // Placeholder artifacts so every configured id can be served
    let artifacts_dir = config.artifacts.dir_path();
    if config.artifacts.seed_placeholders {
        let written = seed_placeholders(&artifacts_dir, &config.artifacts.ids).await?;
        info!(written, dir = %artifacts_dir.display(), "Placeholder artifacts checked");
    }

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.server.metrics_port.unwrap_or(9090);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        info!("Metrics initialized");

        tokio::spawn(async move {
            http::run_metrics_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let listen = config.server.listen;
    let verifier = Arc::new(HttpChallengeVerifier::new(&config.challenge));
    let artifacts = Arc::new(FsArtifactStore::new(artifacts_dir));
    let state = Arc::new(AppState::new(config, Arc::new(db), verifier, artifacts));

    let seeded = state
        .registry
        .seed(&state.config.access.seed_banned_identities)
        .await?;
    info!(new = seeded, "Seeded banned identities");

    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(addr = %listen, "HTTP server listening");

    http::serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received");
    })
    .await?;

    Ok(())
}
