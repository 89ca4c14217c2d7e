#[tokio::main]
async fn main() {
    if let Err(e) = game_server::run_with_config().await {
        tracing::error!(error = %e, "fatal server error");
        std::process::exit(1);
    }
}
