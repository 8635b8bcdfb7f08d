use std::sync::Arc;
use anyhow::Result;
use clap::Parser;
use tokio::signal;
use cvxball::BallOptions;
use cvxball::config::{ServerConfig, set_par_by_env};
use cvxball::server::Server;
use cvxball::service::{BallHandler, ComputeService, StagingStore};

#[tokio::main]
async fn main() -> Result<()>
{
    env_logger::init();

    let config = ServerConfig::parse();

    let options = BallOptions::new().par(set_par_by_env);
    let service = ComputeService::new(BallHandler::new(options), Arc::new(StagingStore::new()));

    let server = Server::bind(config, service).await?;

    log::info!("cvxball-server starting on {}", server.local_addr()?);

    tokio::select! {
        rslt = server.run() => {
            rslt?;
        },
        _ = signal::ctrl_c() => {
            log::info!("shutdown signal received");
        },
    }

    log::info!("cvxball-server stopped");
    Ok(())
}
