use qr_label_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (dotenv) must be loaded before config reads it
    setup_environment();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Logging
    qr_label_server::utils::logger::init_logger(&config.log_level);

    tracing::info!("QR Label Server starting...");

    // 4. Initialize state (opens the store, runs legacy JSON import)
    let state = ServerState::initialize(&config)?;

    // 5. Run the HTTP server until ctrl-c
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
