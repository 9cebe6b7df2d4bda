// src/wallet.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{info, warn};

use crate::config::MintConfig;
use crate::error::WalletError;
use crate::mint::MintWallet;
use crate::types::{MintRequest, TransactionOutcome};

abigen!(
    Custom1155,
    r#"[
        function mint(address to, uint256 id, uint256 amount, address minter) external payable
    ]"#
);

type SignerClient<P> = SignerMiddleware<Provider<P>, LocalWallet>;

/// Mints with a local key through a JSON-RPC node.
pub struct EthersWallet<P: JsonRpcClient = Http> {
    client: Arc<SignerClient<P>>,
    contract: Custom1155<SignerClient<P>>,
    mint_price: U256,
    connected: AtomicBool,
}

impl EthersWallet<Http> {
    pub fn new(config: &MintConfig) -> Result<Self, WalletError> {
        let wallet = config
            .private_key
            .parse::<LocalWallet>()
            .map_err(|e| WalletError::InvalidKey(e.to_string()))?
            .with_chain_id(config.chain_id);

        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| WalletError::Provider(e.to_string()))?;

        Ok(Self::with_provider(provider, wallet, config.contract, config.mint_price))
    }
}

impl<P: JsonRpcClient + Clone + 'static> EthersWallet<P> {
    pub fn with_provider(
        provider: Provider<P>,
        wallet: LocalWallet,
        contract: Address,
        mint_price: U256,
    ) -> Self {
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract_client = Custom1155::new(contract, client.clone());

        info!("Initialized wallet {:?} for collection {:?}", client.address(), contract);

        Self {
            client,
            contract: contract_client,
            mint_price,
            connected: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl<P: JsonRpcClient + Clone + 'static> MintWallet for EthersWallet<P> {
    type Call = TypedTransaction;

    async fn connect(&self) -> Result<Address, WalletError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.client.address())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn account(&self) -> Option<Address> {
        self.connected
            .load(Ordering::SeqCst)
            .then(|| self.client.address())
    }

    async fn chain_id(&self) -> Option<u64> {
        match self.client.get_chainid().await {
            Ok(chain_id) => Some(chain_id.as_u64()),
            Err(e) => {
                warn!("Failed to read chain id: {}", e);
                None
            }
        }
    }

    async fn simulate(&self, request: &MintRequest) -> Result<TypedTransaction, WalletError> {
        if self.account().await.is_none() {
            return Err(WalletError::NotConnected);
        }

        let call = self
            .contract
            .mint(request.recipient, request.token_id, request.amount, request.signer)
            .value(self.mint_price);
        call.call()
            .await
            .map_err(|e| WalletError::Simulation(e.to_string()))?;

        Ok(call.tx)
    }

    async fn submit(&self, call: &TypedTransaction) -> Result<TxHash, WalletError> {
        let pending = self
            .client
            .send_transaction(call.clone(), None)
            .await
            .map_err(|e| WalletError::Submission(e.to_string()))?;

        Ok(*pending)
    }

    fn watch_receipt(&self, hash: TxHash) -> BoxStream<'static, TransactionOutcome> {
        let provider = self.client.provider().clone();
        let settled = async move {
            let receipt = PendingTransaction::new(hash, &provider).await;
            receipt_outcome(hash, receipt)
        };

        stream::iter([TransactionOutcome::Pending])
            .chain(stream::once(settled))
            .boxed()
    }
}

fn receipt_outcome(
    hash: TxHash,
    receipt: Result<Option<TransactionReceipt>, ProviderError>,
) -> TransactionOutcome {
    match receipt {
        Ok(Some(receipt)) if receipt.status == Some(U64::from(1)) => TransactionOutcome::Success,
        Ok(Some(_)) => TransactionOutcome::Error(format!("transaction {hash:?} reverted")),
        Ok(None) => TransactionOutcome::Error(format!("transaction {hash:?} was dropped")),
        Err(e) => TransactionOutcome::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{BASE_SEPOLIA_CHAIN_ID, DEFAULT_MINT_PRICE_WEI};

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn mocked_wallet() -> (EthersWallet<MockProvider>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        let provider = provider.interval(Duration::from_millis(10));
        let key = KEY.parse::<LocalWallet>().unwrap().with_chain_id(BASE_SEPOLIA_CHAIN_ID);
        let wallet = EthersWallet::with_provider(
            provider,
            key,
            Address::repeat_byte(0x33),
            U256::from(DEFAULT_MINT_PRICE_WEI),
        );
        (wallet, mock)
    }

    fn receipt(status: u64) -> TransactionReceipt {
        TransactionReceipt {
            status: Some(U64::from(status)),
            ..Default::default()
        }
    }

    #[test]
    fn receipt_status_maps_to_outcome() {
        let hash = TxHash::repeat_byte(0x42);

        assert_eq!(receipt_outcome(hash, Ok(Some(receipt(1)))), TransactionOutcome::Success);
        assert!(matches!(
            receipt_outcome(hash, Ok(Some(receipt(0)))),
            TransactionOutcome::Error(message) if message.ends_with("reverted")
        ));
        assert!(matches!(
            receipt_outcome(hash, Ok(None)),
            TransactionOutcome::Error(message) if message.ends_with("was dropped")
        ));
        assert!(matches!(
            receipt_outcome(hash, Err(ProviderError::CustomError("out of gas".into()))),
            TransactionOutcome::Error(message) if message.contains("out of gas")
        ));
    }

    #[tokio::test]
    async fn account_is_hidden_until_connected() {
        let (wallet, _mock) = mocked_wallet();
        let request = MintRequest::for_account(Address::repeat_byte(0xab));

        assert_eq!(wallet.account().await, None);
        assert!(matches!(wallet.simulate(&request).await, Err(WalletError::NotConnected)));

        let address = wallet.connect().await.unwrap();
        assert_eq!(wallet.account().await, Some(address));

        wallet.disconnect().await;
        assert_eq!(wallet.account().await, None);
    }

    #[tokio::test]
    async fn simulation_errors_are_reported() {
        // No mocked response, so the eth_call fails.
        let (wallet, _mock) = mocked_wallet();
        let address = wallet.connect().await.unwrap();

        let result = wallet.simulate(&MintRequest::for_account(address)).await;
        assert!(matches!(result, Err(WalletError::Simulation(_))));
    }

    #[tokio::test]
    async fn chain_id_comes_from_the_node() {
        let (wallet, mock) = mocked_wallet();
        mock.push::<U256, _>(U256::from(BASE_SEPOLIA_CHAIN_ID)).unwrap();

        assert_eq!(wallet.chain_id().await, Some(BASE_SEPOLIA_CHAIN_ID));
        assert_eq!(wallet.chain_id().await, None);
    }

    #[tokio::test]
    async fn dropped_transaction_ends_the_watch_with_an_error() {
        let (wallet, mock) = mocked_wallet();
        // The lookup is retried three times before the transaction counts as dropped.
        for _ in 0..4 {
            mock.push::<serde_json::Value, _>(serde_json::Value::Null).unwrap();
        }

        let outcomes: Vec<_> = wallet.watch_receipt(TxHash::repeat_byte(0x42)).collect().await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0], TransactionOutcome::Pending);
        assert!(matches!(&outcomes[1], TransactionOutcome::Error(message) if message.ends_with("was dropped")));
    }

    #[tokio::test]
    async fn mined_transaction_ends_the_watch_with_success() {
        let (wallet, mock) = mocked_wallet();
        // Responses are served last in, first out.
        mock.push::<TransactionReceipt, _>(TransactionReceipt {
            block_number: Some(U64::from(7)),
            ..receipt(1)
        })
        .unwrap();
        mock.push::<Transaction, _>(Transaction {
            block_number: Some(U64::from(7)),
            ..Default::default()
        })
        .unwrap();

        let outcomes: Vec<_> = wallet.watch_receipt(TxHash::repeat_byte(0x42)).collect().await;

        assert_eq!(outcomes, vec![TransactionOutcome::Pending, TransactionOutcome::Success]);
    }

    #[test]
    fn unparsable_key_is_an_invalid_key() {
        let config = MintConfig {
            rpc_url: "http://127.0.0.1:8545".into(),
            private_key: "not-a-key".into(),
            contract: Address::repeat_byte(0x33),
            chain_id: BASE_SEPOLIA_CHAIN_ID,
            mint_price: U256::from(DEFAULT_MINT_PRICE_WEI),
        };
        assert!(matches!(EthersWallet::new(&config), Err(WalletError::InvalidKey(_))));
    }
}
