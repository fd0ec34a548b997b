pub mod constants;
mod errors;
mod events;
mod minters;
mod token;
mod transaction;

use crate::events::emit_all;
use near_sdk::borsh::BorshSerialize;
use near_sdk::json_types::U128;
use near_sdk::store::{IterableMap, IterableSet, LookupMap};
use near_sdk::{env, near, AccountId, BorshStorageKey, PanicOnDefault};

pub use crate::errors::MultiNftError;
pub use crate::events::{parse_event_log, Event, NftEvent};
pub use crate::token::{Token, TokenId, TokenType};
pub use crate::transaction::{
    EmittedEvent, Script, ScriptValue, Transaction, TransactionKind, TransactionOutcome,
    TransactionStatus,
};

#[derive(BorshStorageKey, BorshSerialize)]
#[borsh(crate = "near_sdk::borsh")]
pub enum KeyPrefix {
    TokensById,
    Collections,
    CollectionInner { account_id_hash: Vec<u8> },
    Minters,
    MintersInner { token_type_hash: Vec<u8> },
    TokenTypes,
    PendingMinters,
}

#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct MultiNftContract {
    /// May grant minter rights for any token type.
    pub admin_id: AccountId,
    pub(crate) tokens_by_id: IterableMap<TokenId, Token>,
    // Collection invariant: a live token id is in exactly one set.
    pub(crate) collections: LookupMap<AccountId, IterableSet<TokenId>>,
    pub(crate) minters: LookupMap<TokenType, IterableSet<AccountId>>,
    pub(crate) token_types: IterableSet<TokenType>,
    /// (candidate, token type) -> authority that proposed the grant.
    pub(crate) pending_minters: LookupMap<(AccountId, TokenType), AccountId>,
    /// Shared by every token type; only advanced by a successful mint.
    pub next_token_id: u64,
}

#[near]
impl MultiNftContract {
    /// Creates an empty ledger.
    ///
    /// # Arguments
    /// * `admin_id` - account allowed to grant minter rights for any token type.
    #[init]
    pub fn new(admin_id: AccountId) -> Self {
        Self {
            admin_id,
            tokens_by_id: IterableMap::new(KeyPrefix::TokensById),
            collections: LookupMap::new(KeyPrefix::Collections),
            minters: LookupMap::new(KeyPrefix::Minters),
            token_types: IterableSet::new(KeyPrefix::TokenTypes),
            pending_minters: LookupMap::new(KeyPrefix::PendingMinters),
            next_token_id: 0,
        }
    }

    /// Creates an empty collection for the caller. Calling it again is a no-op.
    pub fn setup_account(&mut self) {
        self.internal_setup_account(&env::predecessor_account_id());
    }

    /// Mints a new token of `token_type`. The caller must be a minter of that type.
    ///
    /// # Arguments
    /// * `receiver_id` - owner of the new token, must have a collection.
    /// * `metadata` - metadata URL, stored as given.
    /// * `token_type` - registered token type.
    ///
    /// Returns the id of the minted token.
    #[handle_result]
    pub fn mint(
        &mut self,
        receiver_id: AccountId,
        metadata: String,
        token_type: TokenType,
    ) -> Result<TokenId, MultiNftError> {
        let (token_id, events) = self.internal_mint(
            &env::predecessor_account_id(),
            &receiver_id,
            metadata,
            &token_type,
        )?;
        emit_all(&events);
        Ok(token_id)
    }

    /// Moves a token from the caller's collection to `receiver_id`'s.
    #[handle_result]
    pub fn transfer(
        &mut self,
        receiver_id: AccountId,
        token_id: TokenId,
    ) -> Result<(), MultiNftError> {
        let events =
            self.internal_transfer(&env::predecessor_account_id(), &receiver_id, token_id)?;
        emit_all(&events);
        Ok(())
    }

    /// Destroys a token owned by the caller. `token_type` must match the token's type.
    ///
    /// Type is checked before ownership: if the caller holds no token of
    /// `token_type` the call fails with `TypeMismatch` ("No such token type"),
    /// even when `token_id` exists in another account. `NotFound` ("missing NFT")
    /// is returned only when the caller holds that type but not that id.
    #[handle_result]
    pub fn burn(&mut self, token_id: TokenId, token_type: TokenType) -> Result<(), MultiNftError> {
        let events = self.internal_burn(&env::predecessor_account_id(), token_id, &token_type)?;
        emit_all(&events);
        Ok(())
    }

    /// Ids of `token_type` owned by `account_id`, in mint order.
    pub fn token_ids_by_owner(&self, account_id: AccountId, token_type: TokenType) -> Vec<TokenId> {
        self.internal_token_ids_by_owner(&account_id, &token_type)
    }

    #[handle_result]
    pub fn metadata(
        &self,
        account_id: AccountId,
        token_id: TokenId,
        token_type: TokenType,
    ) -> Result<String, MultiNftError> {
        self.internal_metadata(&account_id, token_id, &token_type)
    }

    pub fn has_collection(&self, account_id: AccountId) -> bool {
        self.collections.contains_key(&account_id)
    }

    /// Returns a live token.
    ///
    /// # Arguments
    /// * `token_id` - id of a token to return.
    pub fn token(&self, token_id: TokenId) -> Option<Token> {
        self.tokens_by_id.get(&token_id).cloned()
    }

    /// Number of live tokens. Burned tokens are not counted.
    pub fn total_supply(&self) -> u64 {
        u64::from(self.tokens_by_id.len())
    }

    /// Get a list of all live tokens (with pagination), in storage order.
    ///
    /// # Arguments:
    /// * `from_index` - Index to start from, defaults to 0 if not provided
    /// * `limit` - The maximum number of tokens to return
    pub fn tokens(&self, from_index: Option<U128>, limit: Option<u64>) -> Vec<Token> {
        self.tokens_by_id
            .values()
            .skip(page_start(from_index))
            .take(page_limit(limit))
            .cloned()
            .collect()
    }

    /// Get list of all tokens owned by a given account, ascending by id.
    ///
    /// # Arguments:
    /// * `account_id`: a valid NEAR account
    /// * `from_index` - Index to start from, defaults to 0 if not provided
    /// * `limit` - The maximum number of tokens to return
    pub fn tokens_for_owner(
        &self,
        account_id: AccountId,
        from_index: Option<U128>,
        limit: Option<u64>,
    ) -> Vec<Token> {
        self.owned_token_ids(&account_id)
            .into_iter()
            .skip(page_start(from_index))
            .take(page_limit(limit))
            .filter_map(|token_id| self.tokens_by_id.get(&token_id).cloned())
            .collect()
    }
}

impl MultiNftContract {
    /// Returns `true` when a new collection was created.
    pub(crate) fn internal_setup_account(&mut self, account_id: &AccountId) -> bool {
        if self.collections.contains_key(account_id) {
            return false;
        }
        self.collections.insert(
            account_id.clone(),
            IterableSet::new(KeyPrefix::CollectionInner {
                account_id_hash: env::sha256(account_id.as_bytes()),
            }),
        );
        true
    }

    pub(crate) fn internal_mint(
        &mut self,
        minter_id: &AccountId,
        receiver_id: &AccountId,
        metadata: String,
        token_type: &str,
    ) -> Result<(TokenId, Vec<NftEvent>), MultiNftError> {
        if !self.internal_is_minter(minter_id, token_type) {
            return Err(MultiNftError::not_a_minter());
        }
        self.require_collection(minter_id)?;

        let token_id = self.next_token_id;
        let next_token_id = token_id.checked_add(1).ok_or_else(|| {
            MultiNftError::InvalidState("token_id overflow, can't mint any more tokens".into())
        })?;

        // First mutation is the only fallible one; nothing changes if it fails.
        self.collection_mut(receiver_id)?.insert(token_id);
        self.tokens_by_id.insert(
            token_id,
            Token {
                id: token_id,
                token_type: token_type.to_string(),
                metadata,
            },
        );
        self.next_token_id = next_token_id;

        Ok((
            token_id,
            vec![NftEvent::Minted {
                id: token_id,
                token_type: token_type.to_string(),
                to: receiver_id.clone(),
            }],
        ))
    }

    pub(crate) fn internal_transfer(
        &mut self,
        sender_id: &AccountId,
        receiver_id: &AccountId,
        token_id: TokenId,
    ) -> Result<Vec<NftEvent>, MultiNftError> {
        if !self.owns(sender_id, token_id) {
            return Err(MultiNftError::missing_nft(token_id));
        }
        self.require_collection(receiver_id)?;

        self.collection_mut(sender_id)?.remove(&token_id);
        self.collection_mut(receiver_id)?.insert(token_id);

        Ok(vec![
            NftEvent::Withdraw {
                id: token_id,
                from: sender_id.clone(),
            },
            NftEvent::Deposit {
                id: token_id,
                to: receiver_id.clone(),
            },
        ])
    }

    pub(crate) fn internal_burn(
        &mut self,
        owner_id: &AccountId,
        token_id: TokenId,
        token_type: &str,
    ) -> Result<Vec<NftEvent>, MultiNftError> {
        let owned = self
            .collections
            .get(owner_id)
            .ok_or_else(|| MultiNftError::missing_collection(owner_id))?;
        let holds_type = owned.iter().any(|id| {
            self.tokens_by_id
                .get(id)
                .is_some_and(|token| token.token_type == token_type)
        });
        if !holds_type {
            return Err(MultiNftError::no_such_token_type(token_type));
        }
        if !owned.contains(&token_id) {
            return Err(MultiNftError::missing_nft(token_id));
        }
        match self.tokens_by_id.get(&token_id) {
            Some(token) if token.token_type != token_type => {
                return Err(MultiNftError::no_such_token_type(token_type));
            }
            Some(_) => {}
            None => return Err(MultiNftError::missing_nft(token_id)),
        }

        self.collection_mut(owner_id)?.remove(&token_id);
        self.tokens_by_id.remove(&token_id);

        Ok(vec![NftEvent::Withdraw {
            id: token_id,
            from: owner_id.clone(),
        }])
    }

    pub(crate) fn internal_token_ids_by_owner(
        &self,
        account_id: &AccountId,
        token_type: &str,
    ) -> Vec<TokenId> {
        self.owned_token_ids(account_id)
            .into_iter()
            .filter(|token_id| {
                self.tokens_by_id
                    .get(token_id)
                    .is_some_and(|token| token.token_type == token_type)
            })
            .collect()
    }

    pub(crate) fn internal_metadata(
        &self,
        account_id: &AccountId,
        token_id: TokenId,
        token_type: &str,
    ) -> Result<String, MultiNftError> {
        if !self.owns(account_id, token_id) {
            return Err(MultiNftError::missing_nft(token_id));
        }
        self.tokens_by_id
            .get(&token_id)
            .filter(|token| token.token_type == token_type)
            .map(|token| token.metadata.clone())
            .ok_or_else(|| MultiNftError::missing_nft(token_id))
    }

    // Ascending ids; ids are allocated in mint order.
    fn owned_token_ids(&self, account_id: &AccountId) -> Vec<TokenId> {
        let mut ids: Vec<TokenId> = self
            .collections
            .get(account_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    fn owns(&self, account_id: &AccountId, token_id: TokenId) -> bool {
        self.collections
            .get(account_id)
            .is_some_and(|set| set.contains(&token_id))
    }

    fn require_collection(&self, account_id: &AccountId) -> Result<(), MultiNftError> {
        if self.collections.contains_key(account_id) {
            Ok(())
        } else {
            Err(MultiNftError::missing_collection(account_id))
        }
    }

    fn collection_mut(
        &mut self,
        account_id: &AccountId,
    ) -> Result<&mut IterableSet<TokenId>, MultiNftError> {
        self.collections
            .get_mut(account_id)
            .ok_or_else(|| MultiNftError::missing_collection(account_id))
    }
}

// Saturates instead of truncating on 32-bit targets.
fn page_start(from_index: Option<U128>) -> usize {
    usize::try_from(from_index.unwrap_or_default().0).unwrap_or(usize::MAX)
}

fn page_limit(limit: Option<u64>) -> usize {
    limit.map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX))
}
