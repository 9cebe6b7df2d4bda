// src/lib.rs
//! Server-side core of the onchain starter apps: the ERC-7677 paymaster
//! sponsorship proxy and the NFT mint flow, plus the view logic the page
//! templates render.

pub mod config;
pub mod error;
pub mod header;
pub mod mint;
pub mod paymaster;
pub mod policy;
pub mod proxy;
pub mod rpc;
pub mod server;
pub mod types;
pub mod view;
pub mod wallet;
