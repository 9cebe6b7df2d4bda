// src/rpc.rs
use ethers::types::Address;
use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use serde_json::Value;

use crate::types::UserOperation;

// ERC-7677 paymaster web service interface, as spoken by the upstream service.
// Params are positional: [userOp, entryPoint, chainId (hex), context].
#[rpc(client, namespace = "pm")]
pub trait PaymasterRpc {
    /// Returns stub paymaster data used for gas estimation.
    #[method(name = "getPaymasterStubData")]
    async fn get_paymaster_stub_data(
        &self,
        user_op: UserOperation,
        entry_point: Address,
        chain_id: String,
        context: Option<Value>,
    ) -> RpcResult<Value>;

    /// Returns the final, signed paymaster data.
    #[method(name = "getPaymasterData")]
    async fn get_paymaster_data(
        &self,
        user_op: UserOperation,
        entry_point: Address,
        chain_id: String,
        context: Option<Value>,
    ) -> RpcResult<Value>;
}
