//! In-process transaction and script surface.
//!
//! A [`Transaction`] carries a template and its ordered signers, so operations
//! that need more than one signer (adding a minter) can be replayed without a
//! host. Signer count is validated before anything else runs.

use near_sdk::serde_json::{Map, Value};
use near_sdk::{env, AccountId};

use crate::constants::{ADD_MINTER_SIGNERS, EVENT_STANDARD, SINGLE_SIGNER, STATUS_SEALED};
use crate::errors::MultiNftError;
use crate::events::{emit_all, NftEvent};
use crate::token::{TokenId, TokenType};
use crate::MultiNftContract;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    SetupAccount,
    AddMinter {
        token_type: TokenType,
    },
    Mint {
        recipient: AccountId,
        metadata: String,
        token_type: TokenType,
    },
    Transfer {
        recipient: AccountId,
        token_id: TokenId,
    },
    Burn {
        token_id: TokenId,
        token_type: TokenType,
    },
}

impl TransactionKind {
    pub fn expected_signers(&self) -> usize {
        match self {
            Self::AddMinter { .. } => ADD_MINTER_SIGNERS,
            _ => SINGLE_SIGNER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub signers: Vec<AccountId>,
}

impl Transaction {
    pub fn new(kind: TransactionKind, signers: Vec<AccountId>) -> Self {
        Self { kind, signers }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Sealed,
}

impl TransactionStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Sealed => STATUS_SEALED,
        }
    }
}

/// Event as reported to the submitter: namespaced type plus payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
    /// `<contract account>.<standard>.<EventName>`
    pub event_type: String,
    pub data: Map<String, Value>,
}

impl EmittedEvent {
    fn new(contract_id: &AccountId, event: &NftEvent) -> Self {
        Self {
            event_type: format!("{}.{}.{}", contract_id, EVENT_STANDARD, event.name()),
            data: event.data(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionOutcome {
    pub status: TransactionStatus,
    pub events: Vec<EmittedEvent>,
}

/// Read-only queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    TokenIdsByAddress {
        account: AccountId,
        token_type: TokenType,
    },
    Metadata {
        account: AccountId,
        token_id: TokenId,
        token_type: TokenType,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptValue {
    TokenIds(Vec<TokenId>),
    Metadata(String),
}

impl MultiNftContract {
    /// Applies a transaction atomically. On error nothing is stored or logged.
    pub fn execute(&mut self, tx: Transaction) -> Result<TransactionOutcome, MultiNftError> {
        let Transaction { kind, signers } = tx;
        let expected = kind.expected_signers();

        let events = match (kind, signers.as_slice()) {
            (TransactionKind::SetupAccount, [signer]) => {
                self.internal_setup_account(signer);
                Vec::new()
            }
            (TransactionKind::AddMinter { token_type }, [authority, minter]) => {
                self.internal_add_minter(authority, minter, &token_type)?
            }
            (
                TransactionKind::Mint {
                    recipient,
                    metadata,
                    token_type,
                },
                [minter],
            ) => {
                self.internal_mint(minter, &recipient, metadata, &token_type)?
                    .1
            }
            (
                TransactionKind::Transfer {
                    recipient,
                    token_id,
                },
                [sender],
            ) => self.internal_transfer(sender, &recipient, token_id)?,
            (
                TransactionKind::Burn {
                    token_id,
                    token_type,
                },
                [owner],
            ) => self.internal_burn(owner, token_id, &token_type)?,
            (_, signers) => return Err(MultiNftError::signer_count(expected, signers.len())),
        };

        emit_all(&events);
        let contract_id = env::current_account_id();
        Ok(TransactionOutcome {
            status: TransactionStatus::Sealed,
            events: events
                .iter()
                .map(|event| EmittedEvent::new(&contract_id, event))
                .collect(),
        })
    }

    pub fn run_script(&self, script: Script) -> Result<ScriptValue, MultiNftError> {
        match script {
            Script::TokenIdsByAddress {
                account,
                token_type,
            } => Ok(ScriptValue::TokenIds(
                self.internal_token_ids_by_owner(&account, &token_type),
            )),
            Script::Metadata {
                account,
                token_id,
                token_type,
            } => self
                .internal_metadata(&account, token_id, &token_type)
                .map(ScriptValue::Metadata),
        }
    }
}
