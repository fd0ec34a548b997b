//! Minter registry and the two-party minter grant.
//!
//! Adding a minter needs two signers: an authority (the admin, or an existing
//! minter of the same type) and the account receiving the right. On a host
//! that delivers one predecessor per call the grant is split in two calls:
//! the authority proposes, the candidate accepts.

use near_sdk::store::IterableSet;
use near_sdk::{env, near, AccountId};

use crate::errors::MultiNftError;
use crate::events::{emit_all, NftEvent};
use crate::token::TokenType;
use crate::{KeyPrefix, MultiNftContract, MultiNftContractExt};

#[near]
impl MultiNftContract {
    /// Proposes `minter_id` as a minter of `token_type`. Signed by the authority.
    #[handle_result]
    pub fn propose_minter(
        &mut self,
        minter_id: AccountId,
        token_type: TokenType,
    ) -> Result<(), MultiNftError> {
        let authority_id = env::predecessor_account_id();
        validate_token_type(&token_type)?;
        if !self.can_grant(&authority_id, &token_type) {
            return Err(MultiNftError::cannot_grant());
        }
        if self.internal_is_minter(&minter_id, &token_type) {
            return Err(MultiNftError::InvalidState(format!(
                "{minter_id} is already a minter of {token_type}"
            )));
        }
        self.pending_minters
            .insert((minter_id, token_type), authority_id);
        Ok(())
    }

    /// Withdraws a pending grant. Only the authority that proposed it may cancel.
    #[handle_result]
    pub fn cancel_minter(
        &mut self,
        minter_id: AccountId,
        token_type: TokenType,
    ) -> Result<(), MultiNftError> {
        let key = (minter_id, token_type);
        let authority_id = self
            .pending_minters
            .get(&key)
            .ok_or_else(|| no_pending_grant(&key.0, &key.1))?;
        if *authority_id != env::predecessor_account_id() {
            return Err(MultiNftError::cannot_grant());
        }
        self.pending_minters.remove(&key);
        Ok(())
    }

    /// Accepts a pending grant. Signed by the new minter.
    #[handle_result]
    pub fn accept_minter(&mut self, token_type: TokenType) -> Result<(), MultiNftError> {
        let minter_id = env::predecessor_account_id();
        let key = (minter_id, token_type);
        let authority_id = self
            .pending_minters
            .get(&key)
            .cloned()
            .ok_or_else(|| no_pending_grant(&key.0, &key.1))?;

        // Authority is checked again at acceptance.
        let events = self.internal_add_minter(&authority_id, &key.0, &key.1)?;
        self.pending_minters.remove(&key);
        emit_all(&events);
        Ok(())
    }

    pub fn token_types(&self) -> Vec<TokenType> {
        self.token_types.iter().cloned().collect()
    }

    pub fn is_minter(&self, account_id: AccountId, token_type: TokenType) -> bool {
        self.internal_is_minter(&account_id, &token_type)
    }

    pub fn minters_of(&self, token_type: TokenType) -> Vec<AccountId> {
        self.minters
            .get(&token_type)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl MultiNftContract {
    pub(crate) fn internal_is_minter(&self, account_id: &AccountId, token_type: &str) -> bool {
        self.minters
            .get(token_type)
            .is_some_and(|set| set.contains(account_id))
    }

    pub(crate) fn can_grant(&self, authority_id: &AccountId, token_type: &str) -> bool {
        *authority_id == self.admin_id || self.internal_is_minter(authority_id, token_type)
    }

    /// Grants `minter_id` the right to mint `token_type`, registering the type
    /// on first grant. Granting an existing minter changes nothing.
    pub(crate) fn internal_add_minter(
        &mut self,
        authority_id: &AccountId,
        minter_id: &AccountId,
        token_type: &str,
    ) -> Result<Vec<NftEvent>, MultiNftError> {
        validate_token_type(token_type)?;
        if !self.can_grant(authority_id, token_type) {
            return Err(MultiNftError::cannot_grant());
        }
        if self.internal_is_minter(minter_id, token_type) {
            return Ok(Vec::new());
        }

        if !self.minters.contains_key(token_type) {
            self.minters.insert(
                token_type.to_string(),
                IterableSet::new(KeyPrefix::MintersInner {
                    token_type_hash: env::sha256(token_type.as_bytes()),
                }),
            );
            self.token_types.insert(token_type.to_string());
        }
        if let Some(set) = self.minters.get_mut(token_type) {
            set.insert(minter_id.clone());
        }

        Ok(vec![NftEvent::MinterAdded {
            token_type: token_type.to_string(),
            minter: minter_id.clone(),
        }])
    }
}

fn no_pending_grant(minter_id: &AccountId, token_type: &str) -> MultiNftError {
    MultiNftError::NotFound(format!(
        "No pending minter grant for {minter_id} on {token_type}"
    ))
}

fn validate_token_type(token_type: &str) -> Result<(), MultiNftError> {
    if token_type.is_empty() {
        return Err(MultiNftError::MalformedRequest(
            "Token type must not be empty".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::events::parse_event_log;
    use crate::{MultiNftContract, MultiNftError, NftEvent};
    use near_sdk::test_utils::{accounts, get_logs, VMContextBuilder};
    use near_sdk::{testing_env, AccountId};

    const ADMIN: usize = 0;

    fn setup_contract() -> (VMContextBuilder, MultiNftContract) {
        let mut context = VMContextBuilder::new();
        testing_env!(context.predecessor_account_id(accounts(ADMIN)).build());
        let contract = MultiNftContract::new(accounts(ADMIN));
        (context, contract)
    }

    fn act_as(context: &mut VMContextBuilder, account: AccountId) {
        testing_env!(context.predecessor_account_id(account).build());
    }

    #[test]
    fn admin_grant_registers_type() {
        let (_, mut contract) = setup_contract();
        assert!(contract.token_types().is_empty());

        let events = contract
            .internal_add_minter(&accounts(ADMIN), &accounts(1), "TOKEN_1")
            .unwrap();

        assert_eq!(
            events,
            vec![NftEvent::MinterAdded {
                token_type: "TOKEN_1".into(),
                minter: accounts(1),
            }]
        );
        assert_eq!(contract.token_types(), vec!["TOKEN_1".to_string()]);
        assert!(contract.is_minter(accounts(1), "TOKEN_1".into()));
        assert!(!contract.is_minter(accounts(1), "TOKEN_2".into()));
        // The admin grants but is not itself a minter.
        assert!(!contract.is_minter(accounts(ADMIN), "TOKEN_1".into()));
    }

    #[test]
    fn non_minter_cannot_grant() {
        let (_, mut contract) = setup_contract();
        let err = contract
            .internal_add_minter(&accounts(3), &accounts(1), "TOKEN_1")
            .unwrap_err();

        assert_eq!(err, MultiNftError::cannot_grant());
        assert!(contract.token_types().is_empty());
        assert!(contract.minters_of("TOKEN_1".into()).is_empty());
    }

    #[test]
    fn minter_grants_only_its_own_type() {
        let (_, mut contract) = setup_contract();
        contract
            .internal_add_minter(&accounts(ADMIN), &accounts(1), "TOKEN_1")
            .unwrap();

        contract
            .internal_add_minter(&accounts(1), &accounts(2), "TOKEN_1")
            .unwrap();
        assert!(contract.is_minter(accounts(2), "TOKEN_1".into()));

        let err = contract
            .internal_add_minter(&accounts(1), &accounts(2), "TOKEN_2")
            .unwrap_err();
        assert!(matches!(err, MultiNftError::NotAuthorized(_)));
    }

    #[test]
    fn repeated_grant_is_a_no_op() {
        let (_, mut contract) = setup_contract();
        contract
            .internal_add_minter(&accounts(ADMIN), &accounts(1), "TOKEN_1")
            .unwrap();
        let events = contract
            .internal_add_minter(&accounts(ADMIN), &accounts(1), "TOKEN_1")
            .unwrap();

        assert!(events.is_empty());
        assert_eq!(contract.minters_of("TOKEN_1".into()), vec![accounts(1)]);
    }

    #[test]
    fn empty_token_type_is_malformed() {
        let (_, mut contract) = setup_contract();
        let err = contract
            .internal_add_minter(&accounts(ADMIN), &accounts(1), "")
            .unwrap_err();
        assert!(matches!(err, MultiNftError::MalformedRequest(_)));
    }

    #[test]
    fn propose_then_accept_grants_and_logs() {
        let (mut ctx, mut contract) = setup_contract();
        contract
            .propose_minter(accounts(1), "TOKEN_1".into())
            .unwrap();
        assert!(!contract.is_minter(accounts(1), "TOKEN_1".into()));

        act_as(&mut ctx, accounts(1));
        contract.accept_minter("TOKEN_1".into()).unwrap();

        assert!(contract.is_minter(accounts(1), "TOKEN_1".into()));
        let logs = get_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(parse_event_log(&logs[0]).unwrap().event, "minter_added");

        // The proposal is consumed.
        let err = contract.accept_minter("TOKEN_1".into()).unwrap_err();
        assert!(matches!(err, MultiNftError::NotFound(_)));
    }

    #[test]
    fn propose_by_non_authority_fails_fast() {
        let (mut ctx, mut contract) = setup_contract();
        act_as(&mut ctx, accounts(3));
        let err = contract
            .propose_minter(accounts(1), "TOKEN_1".into())
            .unwrap_err();
        assert!(err.to_string().contains("Could not borrow a reference to the NFT minter"));

        act_as(&mut ctx, accounts(1));
        assert!(contract.accept_minter("TOKEN_1".into()).is_err());
    }

    #[test]
    fn accept_requires_matching_candidate() {
        let (mut ctx, mut contract) = setup_contract();
        contract
            .propose_minter(accounts(1), "TOKEN_1".into())
            .unwrap();

        act_as(&mut ctx, accounts(2));
        let err = contract.accept_minter("TOKEN_1".into()).unwrap_err();
        assert!(matches!(err, MultiNftError::NotFound(_)));
        assert!(!contract.is_minter(accounts(2), "TOKEN_1".into()));
    }

    #[test]
    fn propose_to_existing_minter_is_rejected() {
        let (mut ctx, mut contract) = setup_contract();
        contract
            .internal_add_minter(&accounts(ADMIN), &accounts(1), "TOKEN_1")
            .unwrap();

        let err = contract
            .propose_minter(accounts(1), "TOKEN_1".into())
            .unwrap_err();
        assert!(matches!(err, MultiNftError::InvalidState(_)));

        // Nothing was left pending for the existing minter.
        act_as(&mut ctx, accounts(1));
        let err = contract.accept_minter("TOKEN_1".into()).unwrap_err();
        assert!(matches!(err, MultiNftError::NotFound(_)));
    }

    #[test]
    fn cancel_removes_pending_grant_and_only_by_proposer() {
        let (mut ctx, mut contract) = setup_contract();
        contract
            .propose_minter(accounts(1), "TOKEN_1".into())
            .unwrap();

        act_as(&mut ctx, accounts(2));
        let err = contract
            .cancel_minter(accounts(1), "TOKEN_1".into())
            .unwrap_err();
        assert_eq!(err, MultiNftError::cannot_grant());

        act_as(&mut ctx, accounts(ADMIN));
        contract
            .cancel_minter(accounts(1), "TOKEN_1".into())
            .unwrap();
        let err = contract
            .cancel_minter(accounts(1), "TOKEN_1".into())
            .unwrap_err();
        assert!(matches!(err, MultiNftError::NotFound(_)));

        act_as(&mut ctx, accounts(1));
        let err = contract.accept_minter("TOKEN_1".into()).unwrap_err();
        assert!(matches!(err, MultiNftError::NotFound(_)));
        assert!(!contract.is_minter(accounts(1), "TOKEN_1".into()));
        assert!(get_logs().is_empty());
    }
}
