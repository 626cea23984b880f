use tracing::info;
use utils::init_tracing;
use weatherhk_cache::CacheStore;
use weatherhk_config::{CacheBackend, WeatherhkConfig};
use weatherhk_core::{Server, build_app};

const CONFIG_FILE: &str = "weatherhk.conf";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = WeatherhkConfig::from_file_or_default(CONFIG_FILE);
    cfg.log_summary();

    let store = match cfg.cache().backend() {
        CacheBackend::Redis => CacheStore::connect(cfg.cache().redis_url()).await,
        CacheBackend::Memory => CacheStore::memory(),
        CacheBackend::Disabled => CacheStore::Disabled,
    };
    info!(target: "weatherhk::store", backend = store.backend_name(), "Cache store ready");

    let app = build_app(&cfg, store)?;
    let server = Server::new(cfg.server().clone(), app);

    tokio::select! {
        res = server.run() => res?,
        _ = tokio::signal::ctrl_c() => {
            info!(target: "weatherhk::server", "Shutdown requested");
        }
    }

    Ok(())
}
