use store_server::{print_banner, Config, Server, ServerState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Environment (.env is optional)
    let _ = dotenvy::dotenv();
    store_server::init_logger();

    print_banner();
    tracing::info!("Lapak store server starting...");

    let config = Config::from_env();
    let state = ServerState::initialize(&config).await;

    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {e}");
        return Err(e);
    }

    Ok(())
}
