//! Typed errors for the ledger.
//!
//! Public methods are marked `#[handle_result]`, so returning
//! `Err(MultiNftError::Xxx)` aborts the call with the `Display` message.

use near_sdk::AccountId;

#[derive(near_sdk::FunctionError, Debug, Clone, PartialEq, Eq)]
pub enum MultiNftError {
    /// Signer lacks minter or admin rights.
    NotAuthorized(String),
    /// Wrong signer count or malformed arguments.
    MalformedRequest(String),
    /// Token, collection or pending grant does not exist.
    NotFound(String),
    /// Declared token type does not match.
    TypeMismatch(String),
    /// Operation not possible in the current contract state.
    InvalidState(String),
}

impl std::fmt::Display for MultiNftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthorized(msg) => write!(f, "Not authorized: {}", msg),
            Self::MalformedRequest(msg) => write!(f, "Malformed request: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::TypeMismatch(msg) => write!(f, "Type mismatch: {}", msg),
            Self::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl MultiNftError {
    pub fn not_a_minter() -> Self {
        Self::NotAuthorized(
            "Unable to mint token for type, where this account is not a minter".into(),
        )
    }
    pub fn cannot_grant() -> Self {
        Self::NotAuthorized("Could not borrow a reference to the NFT minter".into())
    }
    pub fn missing_nft(token_id: u64) -> Self {
        Self::NotFound(format!("missing NFT {}", token_id))
    }
    pub fn missing_collection(account_id: &AccountId) -> Self {
        Self::NotFound(format!("Account {} has no collection", account_id))
    }
    pub fn no_such_token_type(token_type: &str) -> Self {
        Self::TypeMismatch(format!("No such token type {}", token_type))
    }
    pub fn signer_count(expected: usize, got: usize) -> Self {
        Self::MalformedRequest(format!(
            "authorizer count mismatch for transaction: expected {}, got {}",
            expected, got
        ))
    }
}
