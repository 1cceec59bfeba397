// Framework bootstrap for the headless engine runtime.

use crate::frameworks::config::{self, EngineConfig};
use crate::interface_adapters::protocol::WorldDto;
use crate::use_cases::Engine;

use std::future::pending;
use std::io::{ErrorKind, Result};
use std::path::Path;
use tokio::time::{self, Interval};
use tracing::Level;

// Engine events at info, dependencies only when they warn.
const DEFAULT_LOG_FILTER: &str = "warn,slash_engine=info";

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "slash engine starting");
}

/// Runs the engine until `shutdown` resolves, then stops it and persists the world.
pub async fn run_until(config: EngineConfig, shutdown: impl Future<Output = ()>) -> Result<()> {
    let engine = Engine::new(config.engine_settings());
    restore_world(&engine, &config).await;

    if config.autostart {
        engine.run(config.tick_interval()).await;
    }
    log_status(&engine).await;

    let mut report = config.report_interval().map(|period| {
        let start = time::Instant::now() + period;
        time::interval_at(start, period)
    });

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = next_report(&mut report) => log_status(&engine).await,
        }
    }

    tracing::info!("shutting down");
    engine.stop().await;
    persist_world(&engine, &config).await
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let config = config::load().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::io::Error::other(e)
    })?;
    tracing::debug!(?config, "configuration loaded");

    run_until(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    })
    .await
}

// Restores the snapshot when one is configured, otherwise starts from an empty world.
async fn restore_world(engine: &Engine, config: &EngineConfig) {
    if let Some(path) = &config.snapshot_path {
        match tokio::fs::read(path).await {
            Ok(bytes) => match engine.apply_snapshot(&bytes, config.rtt()).await {
                Ok(()) if engine.has_world().await => {
                    tracing::info!(path = %path.display(), bytes = bytes.len(), "world restored");
                    return;
                }
                Ok(()) => tracing::info!(path = %path.display(), "snapshot empty"),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "snapshot rejected");
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no snapshot found");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read snapshot");
            }
        }
    }
    engine.create_world(config.gravity, config.boundary()).await;
}

async fn persist_world(engine: &Engine, config: &EngineConfig) -> Result<()> {
    let Some(path) = config.snapshot_path.as_deref() else {
        return Ok(());
    };
    let Some(bytes) = engine.encode_world().await else {
        return Ok(());
    };
    write_snapshot(path, &bytes).await.inspect_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to write snapshot");
    })?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    Ok(())
}

// Staged next to the target, then renamed over it.
async fn write_snapshot(path: &Path, bytes: &[u8]) -> Result<()> {
    let staging = path.with_extension("tmp");
    tokio::fs::write(&staging, bytes).await?;
    tokio::fs::rename(&staging, path).await
}

async fn next_report(report: &mut Option<Interval>) {
    match report {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn log_status(engine: &Engine) {
    let Some(world) = engine.get_world().await else {
        tracing::info!("no world");
        return;
    };
    tracing::info!(
        running = engine.is_running().await,
        ticks = engine.ticks().await,
        objects = world.len(),
        "engine status"
    );

    if tracing::enabled!(Level::DEBUG) {
        match serde_json::to_string(&WorldDto::from(&world)) {
            Ok(json) => tracing::debug!(world = %json, "world state"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize world"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Object, ObjectType, Vector, World};
    use crate::interface_adapters::codec;
    use std::path::PathBuf;
    use std::time::Duration;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("slash_engine_{}_{name}.bin", std::process::id()))
    }

    fn config_for(path: &Path) -> EngineConfig {
        EngineConfig {
            autostart: false,
            report_interval_ms: 0,
            snapshot_path: Some(path.to_path_buf()),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn when_no_filter_is_set_then_default_directives_parse() {
        let filter = tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER)
            .expect("default filter should parse");
        assert_eq!(
            filter.max_level_hint(),
            Some(tracing::level_filters::LevelFilter::INFO)
        );
    }

    #[tokio::test]
    async fn when_snapshot_exists_then_it_is_restored_and_written_back() {
        let path = scratch_path("restore");
        let world = World::new(3.0, Vector::new(200.0, 100.0))
            .with_objects([Object::new(11, ObjectType::Item).with_position(Vector::new(20.0, 0.0))]);
        tokio::fs::write(&path, codec::encode(&world))
            .await
            .expect("write snapshot");

        run_until(config_for(&path), async {})
            .await
            .expect("runner should finish");

        let bytes = tokio::fs::read(&path).await.expect("snapshot should exist");
        let _ = tokio::fs::remove_file(&path).await;
        assert_eq!(codec::decode(&bytes), Ok(Some(world)));
    }

    #[tokio::test]
    async fn when_snapshot_is_missing_then_configured_world_is_persisted() {
        let path = scratch_path("fresh");
        let _ = tokio::fs::remove_file(&path).await;
        let config = config_for(&path);

        run_until(config.clone(), time::sleep(Duration::from_millis(20)))
            .await
            .expect("runner should finish");

        let bytes = tokio::fs::read(&path).await.expect("snapshot should exist");
        let _ = tokio::fs::remove_file(&path).await;
        let restored = codec::decode(&bytes)
            .expect("snapshot should decode")
            .expect("snapshot should hold a world");
        assert_eq!(restored.gravity, config.gravity);
        assert_eq!(restored.boundary, config.boundary());
        assert!(restored.is_empty());
    }

    #[tokio::test]
    async fn when_snapshot_is_corrupt_then_runner_falls_back_to_new_world() {
        let path = scratch_path("corrupt");
        tokio::fs::write(&path, b"garbage").await.expect("write snapshot");

        run_until(config_for(&path), async {})
            .await
            .expect("runner should finish");

        let bytes = tokio::fs::read(&path).await.expect("snapshot should exist");
        let _ = tokio::fs::remove_file(&path).await;
        let restored = codec::decode(&bytes).expect("snapshot should decode");
        assert!(restored.is_some_and(|w| w.is_empty()));
    }
}
