// src/proxy.rs
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::ProxyError;
use crate::paymaster::PaymasterService;
use crate::policy::SponsorshipPolicy;
use crate::types::{PaymasterMethod, PaymasterRequest};

/// Applies the sponsorship policy to incoming paymaster calls and forwards the
/// approved ones upstream. Holds no per-request state.
#[derive(Clone)]
pub struct PaymasterProxy {
    policy: Arc<dyn SponsorshipPolicy>,
    paymaster: Arc<dyn PaymasterService>,
}

impl PaymasterProxy {
    pub fn new(policy: Arc<dyn SponsorshipPolicy>, paymaster: Arc<dyn PaymasterService>) -> Self {
        Self { policy, paymaster }
    }

    /// Handles one request: decide, then dispatch on the method.
    ///
    /// Returns the upstream result untouched. Rejected operations and unknown
    /// methods never reach the upstream service.
    pub async fn handle(&self, request: PaymasterRequest) -> Result<Value, ProxyError> {
        debug!(
            "Received {} for sender {:?} on chain {}",
            request.method, request.user_operation.sender, request.chain_id
        );

        let sponsored = self
            .policy
            .should_sponsor(request.chain_id, request.entrypoint, &request.user_operation)
            .await;
        if !sponsored {
            warn!("Declined to sponsor operation for {:?}", request.user_operation.sender);
            return Err(ProxyError::NotSponsorable);
        }

        let method = request.method()?;
        let result = match method {
            PaymasterMethod::GetPaymasterStubData => {
                self.paymaster
                    .stub_data(&request.user_operation, request.context)
                    .await
            }
            PaymasterMethod::GetPaymasterData => {
                self.paymaster
                    .paymaster_data(&request.user_operation, request.context)
                    .await
            }
        };

        match result {
            Ok(result) => {
                info!("Served {} for {:?}", method, request.user_operation.sender);
                Ok(result)
            }
            Err(e) => {
                error!("Upstream {} failed: {}", method, e);
                Err(e.into())
            }
        }
    }
}
