use flicknet_server::{Config, Server, print_banner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Environment first: .env, then logging
    dotenv::dotenv().ok();

    let config = Config::from_env();
    flicknet_server::init_logger_with_file(config.log_dir.as_deref());

    print_banner();
    tracing::info!("FlickNet server starting...");

    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {e}");
        anyhow::bail!("server exited with error: {e}");
    }

    Ok(())
}
