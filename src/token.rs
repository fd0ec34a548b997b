use near_sdk::near;

pub type TokenId = u64;
pub type TokenType = String;

/// A single non-fungible token. Immutable once minted; only its owner changes.
#[near(serializers = [borsh, json])]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: TokenId,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub metadata: String,
}
