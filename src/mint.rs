// src/mint.rs
use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::{Address, TxHash};
use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, info, warn};

use crate::error::{TransactionError, WalletError};
use crate::types::{MintRequest, TransactionOutcome};
use crate::view::{mint_view, ContractStatus, MintView};

/// Wallet and chain access needed by the mint flow.
#[async_trait]
pub trait MintWallet: Send + Sync {
    /// A simulated call that can be submitted as-is.
    type Call: Clone + Send + Sync + 'static;

    async fn connect(&self) -> Result<Address, WalletError>;

    async fn disconnect(&self);

    async fn account(&self) -> Option<Address>;

    async fn chain_id(&self) -> Option<u64>;

    async fn simulate(&self, request: &MintRequest) -> Result<Self::Call, WalletError>;

    async fn submit(&self, call: &Self::Call) -> Result<TxHash, WalletError>;

    /// Reports the progress of `hash` until it settles.
    fn watch_receipt(&self, hash: TxHash) -> BoxStream<'static, TransactionOutcome>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintStep {
    Start,
    Processing,
    OutOfGas,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintEvent {
    Submitted,
    Outcome(TransactionOutcome),
    Retry,
}

impl MintStep {
    pub fn next(self, event: MintEvent) -> MintStep {
        match (self, event) {
            (MintStep::Start, MintEvent::Submitted) => MintStep::Processing,
            (MintStep::Processing, MintEvent::Outcome(outcome)) => match outcome {
                TransactionOutcome::Pending => MintStep::Processing,
                TransactionOutcome::Success => MintStep::Complete,
                TransactionOutcome::Error(message) => {
                    if TransactionError::classify(message).is_out_of_gas() {
                        MintStep::OutOfGas
                    } else {
                        MintStep::Start
                    }
                }
            },
            (MintStep::OutOfGas, MintEvent::Retry) => MintStep::Start,
            (step, _) => step,
        }
    }
}

/// Drives one mint session against a wallet.
pub struct MintController<W: MintWallet> {
    wallet: Arc<W>,
    expected_chain_id: u64,
    step: MintStep,
    account: Option<Address>,
    chain_id: Option<u64>,
    simulated: Option<W::Call>,
    pending: Option<TxHash>,
}

impl<W: MintWallet> MintController<W> {
    pub fn new(wallet: Arc<W>, expected_chain_id: u64) -> Self {
        Self {
            wallet,
            expected_chain_id,
            step: MintStep::Start,
            account: None,
            chain_id: None,
            simulated: None,
            pending: None,
        }
    }

    pub fn step(&self) -> MintStep {
        self.step
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn pending_transaction(&self) -> Option<TxHash> {
        self.pending
    }

    pub fn on_correct_network(&self) -> bool {
        self.chain_id == Some(self.expected_chain_id)
    }

    pub fn can_mint(&self) -> bool {
        self.step == MintStep::Start && self.on_correct_network() && self.simulated.is_some()
    }

    pub fn contract_status(&self, contract: Address) -> ContractStatus {
        match (self.account, self.on_correct_network()) {
            (None, _) => ContractStatus::NotConnected,
            (Some(_), false) => ContractStatus::UnsupportedNetwork,
            (Some(_), true) => ContractStatus::Ready(contract),
        }
    }

    pub fn view(&self, collection_name: Option<&str>) -> MintView {
        mint_view(self.step, self.on_correct_network(), collection_name)
    }

    pub fn apply(&mut self, event: MintEvent) -> MintStep {
        let next = self.step.next(event);
        if next != self.step {
            debug!("Mint step {:?} -> {:?}", self.step, next);
            self.step = next;
        }
        next
    }

    /// Re-reads the account and network and re-simulates the mint call.
    /// Simulation only runs on the expected network with a known account.
    pub async fn refresh(&mut self) {
        self.account = self.wallet.account().await;
        self.chain_id = self.wallet.chain_id().await;
        self.simulated = None;

        let Some(account) = self.account else {
            return;
        };
        if !self.on_correct_network() {
            return;
        }

        match self.wallet.simulate(&MintRequest::for_account(account)).await {
            Ok(call) => self.simulated = Some(call),
            Err(e) => warn!("Mint simulation failed for {:?}: {}", account, e),
        }
    }

    /// Submits the simulated mint. A no-op unless the flow is at `Start`, the
    /// wallet is on the expected network and a simulated call is available.
    pub async fn mint(&mut self) -> Option<TxHash> {
        if self.step != MintStep::Start {
            debug!("Ignoring mint while {:?}", self.step);
            return None;
        }
        if !self.on_correct_network() {
            debug!("Ignoring mint on chain {:?}", self.chain_id);
            return None;
        }
        let call = self.simulated.clone()?;

        self.apply(MintEvent::Submitted);
        match self.wallet.submit(&call).await {
            Ok(hash) => {
                info!("Submitted mint transaction {:?}", hash);
                self.pending = Some(hash);
                Some(hash)
            }
            Err(e) => {
                warn!("Mint submission failed: {}", e);
                self.apply(MintEvent::Outcome(TransactionOutcome::Error(e.to_string())));
                None
            }
        }
    }

    /// Follows the pending transaction until it leaves `Processing`. The hash
    /// is kept while the transaction is unsettled, so a watch that ends early
    /// can be resumed by calling `track` again.
    pub async fn track(&mut self) -> MintStep {
        let Some(hash) = self.pending else {
            return self.step;
        };

        let mut outcomes = self.wallet.watch_receipt(hash);
        while let Some(outcome) = outcomes.next().await {
            if let TransactionOutcome::Error(message) = &outcome {
                warn!("Mint transaction {:?} failed: {}", hash, message);
            }
            if self.apply(MintEvent::Outcome(outcome)) != MintStep::Processing {
                break;
            }
        }

        match self.step {
            MintStep::Processing => debug!("Mint transaction {:?} still pending", hash),
            MintStep::Complete => info!("Mint transaction {:?} confirmed", hash),
            _ => {}
        }
        if self.step != MintStep::Processing {
            self.pending = None;
        }
        self.step
    }

    pub fn retry(&mut self) -> MintStep {
        self.apply(MintEvent::Retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(message: &str) -> MintEvent {
        MintEvent::Outcome(TransactionOutcome::Error(message.to_string()))
    }

    #[test]
    fn happy_path() {
        let step = MintStep::Start
            .next(MintEvent::Submitted)
            .next(MintEvent::Outcome(TransactionOutcome::Pending));
        assert_eq!(step, MintStep::Processing);
        assert_eq!(step.next(MintEvent::Outcome(TransactionOutcome::Success)), MintStep::Complete);
    }

    #[test]
    fn failures_are_routed_by_message() {
        let processing = MintStep::Processing;
        assert_eq!(processing.next(failure("Out Of Gas: insufficient funds")), MintStep::OutOfGas);
        assert_eq!(processing.next(failure("nonce too low")), MintStep::Start);
    }

    #[test]
    fn retry_only_leaves_out_of_gas() {
        assert_eq!(MintStep::OutOfGas.next(MintEvent::Retry), MintStep::Start);
        assert_eq!(MintStep::Processing.next(MintEvent::Retry), MintStep::Processing);
    }

    #[test]
    fn complete_is_terminal() {
        let complete = MintStep::Complete;
        assert_eq!(complete.next(MintEvent::Submitted), MintStep::Complete);
        assert_eq!(complete.next(failure("out of gas")), MintStep::Complete);
        assert_eq!(complete.next(MintEvent::Retry), MintStep::Complete);
    }

    #[test]
    fn outcomes_outside_processing_are_ignored() {
        assert_eq!(MintStep::Start.next(MintEvent::Outcome(TransactionOutcome::Success)), MintStep::Start);
        assert_eq!(MintStep::OutOfGas.next(MintEvent::Submitted), MintStep::OutOfGas);
    }
}
