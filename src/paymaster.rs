// src/paymaster.rs
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::Address;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::PaymasterError;
use crate::rpc::PaymasterRpcClient;
use crate::types::UserOperation;

/// Upstream service that produces paymaster data for a user operation.
#[async_trait]
pub trait PaymasterService: Send + Sync {
    async fn stub_data(
        &self,
        user_op: &UserOperation,
        context: Option<Value>,
    ) -> Result<Value, PaymasterError>;

    async fn paymaster_data(
        &self,
        user_op: &UserOperation,
        context: Option<Value>,
    ) -> Result<Value, PaymasterError>;
}

/// ERC-7677 paymaster reached over HTTP JSON-RPC.
///
/// The entrypoint and chain are fixed at construction; every forwarded call
/// is made for them regardless of what the caller sent.
pub struct UpstreamPaymaster {
    client: HttpClient,
    pub entrypoint: Address,
    chain_id: u64,
}

impl UpstreamPaymaster {
    pub fn new(
        url: &str,
        chain_id: u64,
        entrypoint: Address,
        request_timeout: Duration,
    ) -> Result<Self, PaymasterError> {
        let client = HttpClientBuilder::default()
            .request_timeout(request_timeout)
            .build(url)
            .map_err(|e| PaymasterError::InvalidUrl(e.to_string()))?;

        // The service URL usually embeds an API key, so it is not logged.
        info!(
            "Initialized upstream paymaster for chain {} and entrypoint {:?}",
            chain_id, entrypoint
        );

        Ok(Self {
            client,
            entrypoint,
            chain_id,
        })
    }

    fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }
}

#[async_trait]
impl PaymasterService for UpstreamPaymaster {
    async fn stub_data(
        &self,
        user_op: &UserOperation,
        context: Option<Value>,
    ) -> Result<Value, PaymasterError> {
        debug!("Forwarding pm_getPaymasterStubData for sender {:?}", user_op.sender);

        self.client
            .get_paymaster_stub_data(user_op.clone(), self.entrypoint, self.chain_id_hex(), context)
            .await
            .map_err(|e| PaymasterError::Rpc(e.to_string()))
    }

    async fn paymaster_data(
        &self,
        user_op: &UserOperation,
        context: Option<Value>,
    ) -> Result<Value, PaymasterError> {
        debug!("Forwarding pm_getPaymasterData for sender {:?}", user_op.sender);

        self.client
            .get_paymaster_data(user_op.clone(), self.entrypoint, self.chain_id_hex(), context)
            .await
            .map_err(|e| PaymasterError::Rpc(e.to_string()))
    }
}
