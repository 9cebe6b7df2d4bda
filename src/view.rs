// src/view.rs
//! Render-agnostic view models for the mint demo page.

use ethers::types::{Address, U256};

use crate::mint::MintStep;

/// What the mint area of the page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintView {
    /// The mint button; disabled off the expected network.
    MintButton { enabled: bool },
    Processing,
    /// Offers a retry that returns the flow to `Start`.
    OutOfGas,
    Complete { collection_name: Option<String> },
}

pub fn mint_view(step: MintStep, on_correct_network: bool, collection_name: Option<&str>) -> MintView {
    match step {
        MintStep::Start => MintView::MintButton {
            enabled: on_correct_network,
        },
        MintStep::Processing => MintView::Processing,
        MintStep::OutOfGas => MintView::OutOfGas,
        MintStep::Complete => MintView::Complete {
            collection_name: collection_name.map(str::to_string),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractStatus {
    NotConnected,
    UnsupportedNetwork,
    Ready(Address),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemoView {
    NotConnected,
    SwitchNetwork,
    Loading,
    Collection {
        metadata: CollectionMetadata,
        price: U256,
        mint: MintView,
    },
}

/// Whole-page view. Metadata is `None` while it is still being read.
pub fn demo_view(
    status: ContractStatus,
    metadata: Option<&CollectionMetadata>,
    price: U256,
    mint: MintView,
) -> DemoView {
    match (status, metadata) {
        (ContractStatus::NotConnected, _) => DemoView::NotConnected,
        (ContractStatus::UnsupportedNetwork, _) => DemoView::SwitchNetwork,
        (ContractStatus::Ready(_), None) => DemoView::Loading,
        (ContractStatus::Ready(_), Some(metadata)) => DemoView::Collection {
            metadata: metadata.clone(),
            price,
            mint,
        },
    }
}
