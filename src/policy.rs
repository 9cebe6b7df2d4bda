// src/policy.rs
use std::collections::HashSet;

use async_trait::async_trait;
use ethers::abi::{self, ParamType, Token};
use ethers::types::{Address, Bytes};
use ethers::utils::id;
use tracing::debug;

use crate::types::UserOperation;

/// Decides whether a user operation qualifies for gas sponsorship.
#[async_trait]
pub trait SponsorshipPolicy: Send + Sync {
    async fn should_sponsor(
        &self,
        chain_id: u64,
        entrypoint: Address,
        user_op: &UserOperation,
    ) -> bool;
}

/// Sponsors operations for one chain and entrypoint, optionally restricted to
/// smart wallet calls into a set of target contracts.
#[derive(Debug, Clone)]
pub struct AllowListPolicy {
    chain_id: u64,
    entrypoint: Address,
    allowed_targets: HashSet<Address>,
}

impl AllowListPolicy {
    pub fn new(chain_id: u64, entrypoint: Address) -> Self {
        Self {
            chain_id,
            entrypoint,
            allowed_targets: HashSet::new(),
        }
    }

    pub fn with_allowed_targets(mut self, targets: impl IntoIterator<Item = Address>) -> Self {
        self.allowed_targets.extend(targets);
        self
    }
}

#[async_trait]
impl SponsorshipPolicy for AllowListPolicy {
    async fn should_sponsor(
        &self,
        chain_id: u64,
        entrypoint: Address,
        user_op: &UserOperation,
    ) -> bool {
        if chain_id != self.chain_id {
            debug!("Rejecting operation for chain {} (expected {})", chain_id, self.chain_id);
            return false;
        }

        if entrypoint != self.entrypoint {
            debug!("Rejecting operation for entrypoint {:?}", entrypoint);
            return false;
        }

        if self.allowed_targets.is_empty() {
            return true;
        }

        match call_targets(&user_op.call_data) {
            Some(targets) if !targets.is_empty() => {
                targets.iter().all(|target| self.allowed_targets.contains(target))
            }
            _ => {
                debug!("Rejecting operation from {:?}: call data not allowed", user_op.sender);
                false
            }
        }
    }
}

/// Extracts the call targets of a smart wallet `execute` or `executeBatch`
/// call. Returns `None` for any other call data.
fn call_targets(call_data: &Bytes) -> Option<Vec<Address>> {
    if call_data.len() < 4 {
        return None;
    }
    let (selector, args) = call_data.split_at(4);

    if selector == &id("execute(address,uint256,bytes)")[..] {
        let tokens = abi::decode(
            &[ParamType::Address, ParamType::Uint(256), ParamType::Bytes],
            args,
        )
        .ok()?;
        let target = tokens.into_iter().next()?.into_address()?;
        Some(vec![target])
    } else if selector == &id("executeBatch((address,uint256,bytes)[])")[..] {
        let call = ParamType::Tuple(vec![ParamType::Address, ParamType::Uint(256), ParamType::Bytes]);
        let tokens = abi::decode(&[ParamType::Array(Box::new(call))], args).ok()?;
        tokens
            .into_iter()
            .next()?
            .into_array()?
            .into_iter()
            .map(|call| {
                call.into_tuple()
                    .and_then(|fields| fields.into_iter().next())
                    .and_then(Token::into_address)
            })
            .collect()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::U256;

    use super::*;

    const CHAIN_ID: u64 = 84532;

    fn entrypoint() -> Address {
        "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789".parse().unwrap()
    }

    fn target() -> Address {
        "0x3333333333333333333333333333333333333333".parse().unwrap()
    }

    fn user_op(call_data: Vec<u8>) -> UserOperation {
        UserOperation {
            sender: "0x1111111111111111111111111111111111111111".parse().unwrap(),
            nonce: U256::zero(),
            init_code: Bytes::default(),
            call_data: call_data.into(),
            call_gas_limit: U256::from(21_000),
            verification_gas_limit: U256::from(100_000),
            pre_verification_gas: U256::from(50_000),
            max_fee_per_gas: U256::from(1_000_000_000u64),
            max_priority_fee_per_gas: U256::from(1_000_000_000u64),
            paymaster_and_data: Bytes::default(),
            signature: Bytes::default(),
        }
    }

    fn execute(to: Address) -> Vec<u8> {
        let mut data = id("execute(address,uint256,bytes)").to_vec();
        data.extend(abi::encode(&[
            Token::Address(to),
            Token::Uint(U256::zero()),
            Token::Bytes(vec![0xde, 0xad]),
        ]));
        data
    }

    fn execute_batch(targets: &[Address]) -> Vec<u8> {
        let calls = targets
            .iter()
            .map(|to| {
                Token::Tuple(vec![Token::Address(*to), Token::Uint(U256::zero()), Token::Bytes(vec![])])
            })
            .collect();
        let mut data = id("executeBatch((address,uint256,bytes)[])").to_vec();
        data.extend(abi::encode(&[Token::Array(calls)]));
        data
    }

    #[tokio::test]
    async fn sponsors_matching_chain_and_entrypoint() {
        let policy = AllowListPolicy::new(CHAIN_ID, entrypoint());
        assert!(policy.should_sponsor(CHAIN_ID, entrypoint(), &user_op(vec![])).await);
    }

    #[tokio::test]
    async fn rejects_other_chain_or_entrypoint() {
        let policy = AllowListPolicy::new(CHAIN_ID, entrypoint());
        assert!(!policy.should_sponsor(1, entrypoint(), &user_op(vec![])).await);
        assert!(!policy.should_sponsor(CHAIN_ID, Address::zero(), &user_op(vec![])).await);
    }

    #[tokio::test]
    async fn allow_list_checks_execute_target() {
        let policy = AllowListPolicy::new(CHAIN_ID, entrypoint()).with_allowed_targets([target()]);
        assert!(policy.should_sponsor(CHAIN_ID, entrypoint(), &user_op(execute(target()))).await);
        assert!(!policy.should_sponsor(CHAIN_ID, entrypoint(), &user_op(execute(Address::zero()))).await);
    }

    #[tokio::test]
    async fn allow_list_requires_every_batch_target() {
        let policy = AllowListPolicy::new(CHAIN_ID, entrypoint()).with_allowed_targets([target()]);
        let allowed = user_op(execute_batch(&[target(), target()]));
        let mixed = user_op(execute_batch(&[target(), Address::zero()]));
        assert!(policy.should_sponsor(CHAIN_ID, entrypoint(), &allowed).await);
        assert!(!policy.should_sponsor(CHAIN_ID, entrypoint(), &mixed).await);
    }

    #[tokio::test]
    async fn allow_list_rejects_unknown_call_data() {
        let policy = AllowListPolicy::new(CHAIN_ID, entrypoint()).with_allowed_targets([target()]);
        assert!(!policy.should_sponsor(CHAIN_ID, entrypoint(), &user_op(vec![0x12, 0x34])).await);
        assert!(!policy.should_sponsor(CHAIN_ID, entrypoint(), &user_op(execute_batch(&[]))).await);
    }
}
