#[tokio::main]
async fn main() {
    if let Err(e) = slash_engine::run_with_config().await {
        tracing::error!(error = %e, "engine exited with error");
        std::process::exit(1);
    }
}
