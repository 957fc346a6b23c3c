use anyhow::Context;
use citadel::config::Config;
use citadel::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let mut servers = Vec::new();
    for server_config in cfg.server_configs()? {
        let addr = server_config.listen_addr;
        let mut server = Server::new(server_config);
        server
            .initialize()
            .with_context(|| format!("failed to initialize server on {addr}"))?;
        servers.push(server);
    }

    for server in &mut servers {
        server.start()?;
    }
    tracing::info!(servers = servers.len(), "Server started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping");

    for server in &servers {
        server.signal_shutdown();
    }
    for server in &mut servers {
        server.join().await;
    }

    tracing::info!("Stopped");
    Ok(())
}
