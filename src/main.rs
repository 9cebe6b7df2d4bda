// src/main.rs
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use onchain_starter::config::{MintArgs, ServeArgs};
use onchain_starter::mint::{MintController, MintWallet};
use onchain_starter::paymaster::UpstreamPaymaster;
use onchain_starter::policy::AllowListPolicy;
use onchain_starter::proxy::PaymasterProxy;
use onchain_starter::server;
use onchain_starter::wallet::EthersWallet;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the paymaster sponsorship proxy
    Serve(ServeArgs),
    /// Mint one token from the collection with a local key
    Mint(MintArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Mint(args) => mint(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;

    let paymaster = UpstreamPaymaster::new(
        &config.paymaster_url,
        config.chain_id,
        config.entrypoint,
        config.upstream_timeout,
    )?;
    let policy = AllowListPolicy::new(config.chain_id, config.entrypoint)
        .with_allowed_targets(config.allowed_targets.iter().copied());
    let proxy = Arc::new(PaymasterProxy::new(Arc::new(policy), Arc::new(paymaster)));

    info!("Starting paymaster proxy on {}", config.listen_addr);
    let server_handle = server::start_server(config.listen_addr, &config.route, proxy).await?;

    // Keep the server running until Ctrl+C is pressed
    tokio::signal::ctrl_c().await?;
    server_handle.stop().await?;
    info!("Server stopped");

    Ok(())
}

async fn mint(args: MintArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;
    let wallet = Arc::new(EthersWallet::new(&config)?);
    let account = wallet.connect().await?;
    info!("Connected {:?}", account);

    let mut controller = MintController::new(wallet, config.chain_id);
    controller.refresh().await;

    if !controller.can_mint() {
        warn!(
            "Mint unavailable: {:?}",
            controller.contract_status(config.contract)
        );
        return Ok(());
    }

    controller.mint().await;
    let step = controller.track().await;
    info!("Mint flow finished at {:?}", step);

    Ok(())
}
