// src/config.rs
use std::net::SocketAddr;
use std::time::Duration;

use clap::Args;
use ethers::types::{Address, U256};

use crate::error::ConfigError;

pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;
pub const ENTRYPOINT_ADDRESS_V06: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
/// 0.0001 ETH.
pub const DEFAULT_MINT_PRICE_WEI: u64 = 100_000_000_000_000;

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[clap(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:3000")]
    pub listen_addr: SocketAddr,

    #[clap(long, env = "PAYMASTER_ROUTE", default_value = "/paymaster")]
    pub route: String,

    /// Upstream ERC-7677 paymaster service
    #[clap(long, env = "PAYMASTER_URL", default_value = "")]
    pub paymaster_url: String,

    #[clap(long, env = "CHAIN_ID", default_value_t = BASE_SEPOLIA_CHAIN_ID)]
    pub chain_id: u64,

    #[clap(long, env = "ENTRYPOINT_ADDRESS", default_value = ENTRYPOINT_ADDRESS_V06)]
    pub entrypoint: String,

    /// Contracts sponsored calls may target; any target when empty
    #[clap(long = "allowed-target", env = "ALLOWED_TARGETS", value_delimiter = ',')]
    pub allowed_targets: Vec<String>,

    #[clap(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 10)]
    pub upstream_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub listen_addr: SocketAddr,
    pub route: String,
    pub paymaster_url: String,
    pub chain_id: u64,
    pub entrypoint: Address,
    pub allowed_targets: Vec<Address>,
    pub upstream_timeout: Duration,
}

impl ServeArgs {
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        if self.paymaster_url.trim().is_empty() {
            return Err(ConfigError::MissingPaymasterUrl);
        }
        if !self.route.starts_with('/') {
            return Err(ConfigError::InvalidRoute(self.route));
        }

        let allowed_targets = self
            .allowed_targets
            .iter()
            .filter(|target| !target.trim().is_empty())
            .map(|target| parse_address("allowed target", target))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProxyConfig {
            listen_addr: self.listen_addr,
            route: self.route,
            paymaster_url: self.paymaster_url,
            chain_id: self.chain_id,
            entrypoint: parse_address("entrypoint", &self.entrypoint)?,
            allowed_targets,
            upstream_timeout: Duration::from_secs(self.upstream_timeout_secs),
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct MintArgs {
    #[clap(long, env = "RPC_URL")]
    pub rpc_url: String,

    #[clap(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// ERC-1155 collection to mint from
    #[clap(long, env = "MINT_CONTRACT_ADDRESS")]
    pub contract: String,

    #[clap(long, env = "CHAIN_ID", default_value_t = BASE_SEPOLIA_CHAIN_ID)]
    pub chain_id: u64,

    #[clap(long, env = "MINT_PRICE_WEI", default_value_t = DEFAULT_MINT_PRICE_WEI)]
    pub mint_price_wei: u64,
}

#[derive(Clone)]
pub struct MintConfig {
    pub rpc_url: String,
    pub private_key: String,
    pub contract: Address,
    pub chain_id: u64,
    pub mint_price: U256,
}

impl MintArgs {
    pub fn into_config(self) -> Result<MintConfig, ConfigError> {
        Ok(MintConfig {
            contract: parse_address("contract", &self.contract)?,
            rpc_url: self.rpc_url,
            private_key: self.private_key,
            chain_id: self.chain_id,
            mint_price: U256::from(self.mint_price_wei),
        })
    }
}

fn parse_address(name: &'static str, value: &str) -> Result<Address, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidAddress {
        name,
        value: value.to_string(),
    })
}
