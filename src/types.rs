// src/types.rs
use std::fmt;
use std::str::FromStr;

use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProxyError;

/// ERC-4337 v0.6 user operation, as sent by smart wallet SDKs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    // Stub data requests are made before these are known.
    #[serde(default)]
    pub paymaster_and_data: Bytes,
    #[serde(default)]
    pub signature: Bytes,
}

/// ERC-7677 methods the proxy forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymasterMethod {
    GetPaymasterStubData,
    GetPaymasterData,
}

impl PaymasterMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetPaymasterStubData => "pm_getPaymasterStubData",
            Self::GetPaymasterData => "pm_getPaymasterData",
        }
    }
}

impl FromStr for PaymasterMethod {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pm_getPaymasterStubData" => Ok(Self::GetPaymasterStubData),
            "pm_getPaymasterData" => Ok(Self::GetPaymasterData),
            other => Err(ProxyError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for PaymasterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    method: String,
    params: Vec<Value>,
}

/// A paymaster call received by the proxy.
///
/// `method` is kept as received: the sponsorship decision is taken before the
/// method is resolved, so an unknown method on a rejected operation is still
/// reported as not sponsorable.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymasterRequest {
    pub method: String,
    pub user_operation: UserOperation,
    pub entrypoint: Address,
    pub chain_id: u64,
    pub context: Option<Value>,
}

impl PaymasterRequest {
    /// Parses a `{ method, params: [userOperation, entrypoint, chainId, context?] }` body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ProxyError> {
        let envelope: RpcEnvelope = serde_json::from_slice(body)
            .map_err(|e| ProxyError::MalformedRequest(e.to_string()))?;

        let mut params = envelope.params.into_iter();
        let (Some(user_op), Some(entrypoint), Some(chain_id)) =
            (params.next(), params.next(), params.next())
        else {
            return Err(ProxyError::MalformedRequest(
                "expected params [userOperation, entrypoint, chainId]".to_string(),
            ));
        };

        let user_operation = serde_json::from_value(user_op)
            .map_err(|e| ProxyError::MalformedRequest(format!("invalid userOperation: {e}")))?;
        let entrypoint = serde_json::from_value(entrypoint)
            .map_err(|e| ProxyError::MalformedRequest(format!("invalid entrypoint: {e}")))?;
        let chain_id = parse_chain_id(&chain_id).ok_or_else(|| {
            ProxyError::MalformedRequest(format!("invalid chainId: {chain_id}"))
        })?;
        let context = params.next().filter(|value| !value.is_null());

        Ok(Self {
            method: envelope.method,
            user_operation,
            entrypoint,
            chain_id,
            context,
        })
    }

    pub fn method(&self) -> Result<PaymasterMethod, ProxyError> {
        self.method.parse()
    }
}

/// Accepts decimal strings, `0x` hex strings and plain JSON numbers.
fn parse_chain_id(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Arguments of the collection's `mint` call for one connected account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintRequest {
    pub recipient: Address,
    pub token_id: U256,
    pub amount: U256,
    pub signer: Address,
}

impl MintRequest {
    pub fn for_account(account: Address) -> Self {
        Self {
            recipient: account,
            token_id: U256::one(),
            amount: U256::one(),
            signer: account,
        }
    }
}

/// Progress of a submitted transaction as reported by the chain client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Pending,
    Success,
    Error(String),
}
