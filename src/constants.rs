// --- Events (NEP-297) ---

pub const EVENT_STANDARD: &str = "multi_nft";
pub const EVENT_VERSION: &str = "1.0.0";
pub const EVENT_PREFIX: &str = "EVENT_JSON:";

// --- Transactions ---

/// Status code reported for a committed transaction.
pub const STATUS_SEALED: u8 = 4;

pub const ADD_MINTER_SIGNERS: usize = 2;
pub const SINGLE_SIGNER: usize = 1;
