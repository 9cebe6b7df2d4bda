// src/error.rs
use thiserror::Error;

/// Failures of the sponsorship proxy. Each variant maps to one HTTP status.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Not a sponsorable operation")]
    NotSponsorable,

    #[error("Method not found: {0}")]
    UnsupportedMethod(String),

    #[error("Upstream paymaster failure: {0}")]
    UpstreamFailure(#[from] PaymasterError),
}

#[derive(Error, Debug)]
pub enum PaymasterError {
    #[error("Invalid paymaster service URL: {0}")]
    InvalidUrl(String),

    #[error("Paymaster RPC error: {0}")]
    Rpc(String),
}

/// Classified on-chain failure of a mint transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Transaction ran out of gas: {0}")]
    OutOfGas(String),

    #[error("Transaction failed: {0}")]
    Failed(String),
}

impl TransactionError {
    /// Classifies a failure by its message. Only the "out of gas" wording is
    /// recognised; everything else is a generic failure.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.to_lowercase().contains("out of gas") {
            Self::OutOfGas(message)
        } else {
            Self::Failed(message)
        }
    }

    pub fn is_out_of_gas(&self) -> bool {
        matches!(self, Self::OutOfGas(_))
    }
}

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Contract simulation failed: {0}")]
    Simulation(String),

    #[error("Transaction submission failed: {0}")]
    Submission(String),

    #[error("Ethereum provider error: {0}")]
    Provider(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {name} address: {value}")]
    InvalidAddress { name: &'static str, value: String },

    #[error("Missing paymaster service URL (set PAYMASTER_URL)")]
    MissingPaymasterUrl,

    #[error("Route must start with '/': {0}")]
    InvalidRoute(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_gas_is_matched_case_insensitively() {
        let err = TransactionError::classify("Out Of Gas: insufficient funds");
        assert!(err.is_out_of_gas());
        assert_eq!(err, TransactionError::OutOfGas("Out Of Gas: insufficient funds".into()));
    }

    #[test]
    fn other_messages_are_generic_failures() {
        let err = TransactionError::classify("nonce too low");
        assert!(!err.is_out_of_gas());
        assert_eq!(err.to_string(), "Transaction failed: nonce too low");
    }

    #[test]
    fn upstream_failure_wraps_paymaster_error() {
        let err: ProxyError = PaymasterError::Rpc("connection refused".into()).into();
        assert!(matches!(err, ProxyError::UpstreamFailure(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
