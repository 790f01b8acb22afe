//! Numbers Server - HTTP gateway for memorable number search and purchase

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Values in .env become environment variables before config is read
    dotenvy::dotenv().ok();

    let config = ServerConfig::load()?;
    server::start_server(config).await?;

    Ok(())
}
