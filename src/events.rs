use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::serde_json::{self, Map, Value};
use near_sdk::{env, AccountId};

use crate::constants::{EVENT_PREFIX, EVENT_STANDARD, EVENT_VERSION};
use crate::token::{TokenId, TokenType};

/// NEP-297 envelope written to the host log.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct Event {
    pub standard: String,
    pub version: String,
    pub event: String,
    pub data: Vec<Map<String, Value>>,
}

/// Ledger events. Operations return them in emission order; nothing is logged
/// until the operation has committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NftEvent {
    Minted {
        id: TokenId,
        token_type: TokenType,
        to: AccountId,
    },
    Withdraw {
        id: TokenId,
        from: AccountId,
    },
    Deposit {
        id: TokenId,
        to: AccountId,
    },
    MinterAdded {
        token_type: TokenType,
        minter: AccountId,
    },
}

impl NftEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Minted { .. } => "Minted",
            Self::Withdraw { .. } => "Withdraw",
            Self::Deposit { .. } => "Deposit",
            Self::MinterAdded { .. } => "MinterAdded",
        }
    }

    fn log_name(&self) -> &'static str {
        match self {
            Self::Minted { .. } => "minted",
            Self::Withdraw { .. } => "withdraw",
            Self::Deposit { .. } => "deposit",
            Self::MinterAdded { .. } => "minter_added",
        }
    }

    /// Payload as field name to value, e.g. `{"id": 0, "from": "dave.near"}`.
    pub fn data(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        match self {
            Self::Minted { id, token_type, to } => {
                fields.insert("id".into(), Value::Number((*id).into()));
                fields.insert("type".into(), Value::String(token_type.clone()));
                fields.insert("to".into(), Value::String(to.to_string()));
            }
            Self::Withdraw { id, from } => {
                fields.insert("id".into(), Value::Number((*id).into()));
                fields.insert("from".into(), Value::String(from.to_string()));
            }
            Self::Deposit { id, to } => {
                fields.insert("id".into(), Value::Number((*id).into()));
                fields.insert("to".into(), Value::String(to.to_string()));
            }
            Self::MinterAdded { token_type, minter } => {
                fields.insert("type".into(), Value::String(token_type.clone()));
                fields.insert("minter".into(), Value::String(minter.to_string()));
            }
        }
        fields
    }

    pub fn to_event(&self) -> Event {
        Event {
            standard: EVENT_STANDARD.into(),
            version: EVENT_VERSION.into(),
            event: self.log_name().into(),
            data: vec![self.data()],
        }
    }

    pub(crate) fn emit(&self) {
        let json = serde_json::to_string(&self.to_event())
            .unwrap_or_else(|err| env::panic_str(&format!("event serialization failed: {err}")));
        env::log_str(&format!("{EVENT_PREFIX}{json}"));
    }
}

pub(crate) fn emit_all(events: &[NftEvent]) {
    events.iter().for_each(NftEvent::emit);
}

/// Parses a log line written by [`NftEvent::emit`]. Returns `None` for plain logs.
pub fn parse_event_log(log: &str) -> Option<Event> {
    let json = log.strip_prefix(EVENT_PREFIX)?;
    serde_json::from_str(json).ok()
}
