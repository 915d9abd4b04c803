use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{TokenError, TokenEvent, TokenResult};

/// Default token metadata.
pub const TOKEN_NAME: &str = "Homelend Token";
pub const TOKEN_SYMBOL: &str = "HLD";
pub const TOKEN_DECIMALS: u8 = 18;

/// Transfer-locked token ledger.
///
/// Supply starts at zero and transfers start disabled; the owner (the
/// crowdsale, once wired) mints via [`issue`](Self::issue) and lifts the lock
/// exactly once at finalize. Until then only the owner may move tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLedger {
    /// Token metadata
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,

    /// Balance mapping: address => balance
    pub balances: HashMap<H160, U256>,

    /// Allowance mapping: owner => spender => amount
    pub allowances: HashMap<H160, HashMap<H160, U256>>,

    /// Owner of the ledger, sole minter while transfers are locked
    pub owner: H160,

    /// Proposed next owner; holds no authority until it claims
    pub pending_owner: Option<H160>,

    /// Whether transfers are enabled; one-way false -> true
    pub transfers_enabled: bool,
}

impl TokenLedger {
    /// Create a new ledger with zero supply and transfers locked.
    pub fn new(owner: H160) -> Self {
        Self::with_metadata(owner, TOKEN_NAME, TOKEN_SYMBOL, TOKEN_DECIMALS)
    }

    /// Create a new ledger with explicit metadata.
    pub fn with_metadata(owner: H160, name: &str, symbol: &str, decimals: u8) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            total_supply: U256::zero(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            owner,
            pending_owner: None,
            transfers_enabled: false,
        }
    }

    /// Get balance of an address
    pub fn balance_of(&self, account: H160) -> U256 {
        *self.balances.get(&account).unwrap_or(&U256::zero())
    }

    /// Get allowance amount
    pub fn allowance(&self, owner: H160, spender: H160) -> U256 {
        self.allowances
            .get(&owner)
            .and_then(|allowances| allowances.get(&spender))
            .copied()
            .unwrap_or(U256::zero())
    }

    /// Mint new tokens (only owner)
    pub fn issue(&mut self, caller: H160, to: H160, amount: U256) -> TokenResult<TokenEvent> {
        if caller != self.owner {
            return Err(TokenError::Unauthorized);
        }
        if to.is_zero() {
            return Err(TokenError::InvalidAddress { address: to });
        }
        if amount.is_zero() {
            return Err(TokenError::InvalidAmount);
        }

        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert(to, new_balance);
        self.total_supply = new_supply;

        Ok(TokenEvent::Issue { to, amount })
    }

    /// Transfer tokens. Locked for everyone but the owner until
    /// transfers are enabled.
    pub fn transfer(&mut self, from: H160, to: H160, amount: U256) -> TokenResult<TokenEvent> {
        if !self.transfers_enabled && from != self.owner {
            return Err(TokenError::TransfersDisabled);
        }
        if to.is_zero() {
            return Err(TokenError::InvalidAddress { address: to });
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available: from_balance,
            });
        }

        self.balances.insert(from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.insert(to, to_balance + amount);

        Ok(TokenEvent::Transfer { from, to, amount })
    }

    /// Approve spender to spend tokens
    pub fn approve(&mut self, owner: H160, spender: H160, amount: U256) -> TokenResult<TokenEvent> {
        self.allowances
            .entry(owner)
            .or_insert_with(HashMap::new)
            .insert(spender, amount);

        Ok(TokenEvent::Approval {
            owner,
            spender,
            amount,
        })
    }

    /// Transfer tokens on behalf of another address (requires allowance).
    /// Gated by the transfer lock the same way as [`transfer`](Self::transfer).
    pub fn transfer_from(
        &mut self,
        spender: H160,
        from: H160,
        to: H160,
        amount: U256,
    ) -> TokenResult<TokenEvent> {
        if !self.transfers_enabled && spender != self.owner {
            return Err(TokenError::TransfersDisabled);
        }
        if to.is_zero() {
            return Err(TokenError::InvalidAddress { address: to });
        }

        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                required: amount,
                available: allowance,
            });
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available: from_balance,
            });
        }

        self.allowances
            .entry(from)
            .or_insert_with(HashMap::new)
            .insert(spender, allowance - amount);

        self.balances.insert(from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.insert(to, to_balance + amount);

        Ok(TokenEvent::Transfer { from, to, amount })
    }

    /// Burn tokens. The owner may always burn; anyone else may burn only
    /// their own balance and only once transfers are enabled. The ledger
    /// does not know about sale phases; the transfer lock is the upstream
    /// signal.
    pub fn destroy(&mut self, caller: H160, from: H160, amount: U256) -> TokenResult<TokenEvent> {
        if caller != self.owner {
            if !self.transfers_enabled {
                return Err(TokenError::TransfersDisabled);
            }
            if caller != from {
                return Err(TokenError::Unauthorized);
            }
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available: from_balance,
            });
        }

        self.balances.insert(from, from_balance - amount);
        self.total_supply -= amount;

        Ok(TokenEvent::Destroy { from, amount })
    }

    /// Toggle the transfer lock (only owner). Enabling is one-way: once
    /// transfers are enabled they cannot be locked again.
    pub fn disable_transfers(&mut self, caller: H160, disable: bool) -> TokenResult<TokenEvent> {
        if caller != self.owner {
            return Err(TokenError::Unauthorized);
        }
        if disable && self.transfers_enabled {
            return Err(TokenError::AlreadyUnlocked);
        }

        self.transfers_enabled = !disable;
        Ok(TokenEvent::TransferLockChanged {
            enabled: self.transfers_enabled,
        })
    }

    /// Propose an ownership handover (only owner). The current owner keeps
    /// authority until the proposed owner claims.
    pub fn transfer_ownership(&mut self, caller: H160, new_owner: H160) -> TokenResult<TokenEvent> {
        if caller != self.owner {
            return Err(TokenError::Unauthorized);
        }
        if new_owner.is_zero() {
            return Err(TokenError::InvalidAddress { address: new_owner });
        }

        self.pending_owner = Some(new_owner);
        Ok(TokenEvent::OwnershipTransferStarted {
            owner: self.owner,
            pending_owner: new_owner,
        })
    }

    /// Claim a proposed ownership handover (only the pending owner).
    pub fn claim_ownership(&mut self, caller: H160) -> TokenResult<TokenEvent> {
        match self.pending_owner {
            Some(pending) if pending == caller => {
                let old_owner = self.owner;
                self.owner = caller;
                self.pending_owner = None;
                Ok(TokenEvent::OwnershipTransferred {
                    old_owner,
                    new_owner: caller,
                })
            }
            _ => Err(TokenError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> H160 {
        H160::from_low_u64_be(n)
    }

    #[test]
    fn test_ledger_creation() {
        let owner = addr(1);
        let token = TokenLedger::new(owner);

        assert_eq!(token.name, "Homelend Token");
        assert_eq!(token.symbol, "HLD");
        assert_eq!(token.decimals, 18);
        assert_eq!(token.total_supply, U256::zero());
        assert_eq!(token.owner, owner);
        assert!(!token.transfers_enabled);
        assert_eq!(token.pending_owner, None);
    }

    #[test]
    fn test_issue_only_owner() {
        let owner = addr(1);
        let other = addr(2);
        let mut token = TokenLedger::new(owner);

        assert_eq!(
            token.issue(other, other, U256::from(100)),
            Err(TokenError::Unauthorized)
        );

        token.issue(owner, other, U256::from(100)).unwrap();
        assert_eq!(token.balance_of(other), U256::from(100));
        assert_eq!(token.total_supply, U256::from(100));
    }

    #[test]
    fn test_issue_rejects_zero_amount_and_zero_address() {
        let owner = addr(1);
        let mut token = TokenLedger::new(owner);

        assert_eq!(
            token.issue(owner, addr(2), U256::zero()),
            Err(TokenError::InvalidAmount)
        );
        assert_eq!(
            token.issue(owner, H160::zero(), U256::from(1)),
            Err(TokenError::InvalidAddress {
                address: H160::zero()
            })
        );
        assert_eq!(token.total_supply, U256::zero());
    }

    #[test]
    fn test_issue_rejects_supply_overflow() {
        let owner = addr(1);
        let mut token = TokenLedger::new(owner);
        token.issue(owner, addr(2), U256::from(100)).unwrap();

        assert_eq!(
            token.issue(owner, addr(3), U256::MAX),
            Err(TokenError::Overflow)
        );
        assert_eq!(token.total_supply, U256::from(100));
        assert_eq!(token.balance_of(addr(3)), U256::zero());
    }

    #[test]
    fn test_transfer_locked_by_default() {
        let owner = addr(1);
        let holder = addr(2);
        let mut token = TokenLedger::new(owner);
        token.issue(owner, holder, U256::from(1000)).unwrap();

        assert_eq!(
            token.transfer(holder, addr(3), U256::from(100)),
            Err(TokenError::TransfersDisabled)
        );
        assert_eq!(token.balance_of(holder), U256::from(1000));
    }

    #[test]
    fn test_owner_may_transfer_while_locked() {
        let owner = addr(1);
        let mut token = TokenLedger::new(owner);
        token.issue(owner, owner, U256::from(1000)).unwrap();

        token.transfer(owner, addr(3), U256::from(100)).unwrap();
        assert_eq!(token.balance_of(addr(3)), U256::from(100));
        assert_eq!(token.balance_of(owner), U256::from(900));
    }

    #[test]
    fn test_transfer_after_unlock() {
        let owner = addr(1);
        let holder = addr(2);
        let mut token = TokenLedger::new(owner);
        token.issue(owner, holder, U256::from(1000)).unwrap();
        token.disable_transfers(owner, false).unwrap();

        token.transfer(holder, addr(3), U256::from(100)).unwrap();
        assert_eq!(token.balance_of(holder), U256::from(900));
        assert_eq!(token.balance_of(addr(3)), U256::from(100));
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let owner = addr(1);
        let mut token = TokenLedger::new(owner);
        token.issue(owner, owner, U256::from(100)).unwrap();

        assert_eq!(
            token.transfer(owner, addr(2), U256::from(200)),
            Err(TokenError::InsufficientBalance {
                required: U256::from(200),
                available: U256::from(100),
            })
        );
    }

    #[test]
    fn test_unlock_is_one_way() {
        let owner = addr(1);
        let mut token = TokenLedger::new(owner);

        // locking while already locked is a no-op
        token.disable_transfers(owner, true).unwrap();
        assert!(!token.transfers_enabled);

        token.disable_transfers(owner, false).unwrap();
        assert!(token.transfers_enabled);

        assert_eq!(
            token.disable_transfers(owner, true),
            Err(TokenError::AlreadyUnlocked)
        );
        assert!(token.transfers_enabled);
    }

    #[test]
    fn test_approve_and_transfer_from() {
        let owner = addr(1);
        let holder = addr(2);
        let spender = addr(3);
        let recipient = addr(4);
        let mut token = TokenLedger::new(owner);
        token.issue(owner, holder, U256::from(1000)).unwrap();
        token.disable_transfers(owner, false).unwrap();

        token.approve(holder, spender, U256::from(200)).unwrap();
        assert_eq!(token.allowance(holder, spender), U256::from(200));

        token
            .transfer_from(spender, holder, recipient, U256::from(150))
            .unwrap();
        assert_eq!(token.balance_of(holder), U256::from(850));
        assert_eq!(token.balance_of(recipient), U256::from(150));
        assert_eq!(token.allowance(holder, spender), U256::from(50));

        assert_eq!(
            token.transfer_from(spender, holder, recipient, U256::from(100)),
            Err(TokenError::InsufficientAllowance {
                required: U256::from(100),
                available: U256::from(50),
            })
        );
    }

    #[test]
    fn test_transfer_from_locked_by_default() {
        let owner = addr(1);
        let holder = addr(2);
        let spender = addr(3);
        let mut token = TokenLedger::new(owner);
        token.issue(owner, holder, U256::from(1000)).unwrap();
        token.approve(holder, spender, U256::from(200)).unwrap();

        assert_eq!(
            token.transfer_from(spender, holder, addr(4), U256::from(100)),
            Err(TokenError::TransfersDisabled)
        );
    }

    #[test]
    fn test_destroy_gated_before_unlock() {
        let owner = addr(1);
        let holder = addr(2);
        let mut token = TokenLedger::new(owner);
        token.issue(owner, holder, U256::from(1000)).unwrap();

        assert_eq!(
            token.destroy(holder, holder, U256::from(20)),
            Err(TokenError::TransfersDisabled)
        );

        // owner may burn regardless of the lock
        token.destroy(owner, holder, U256::from(100)).unwrap();
        assert_eq!(token.balance_of(holder), U256::from(900));
        assert_eq!(token.total_supply, U256::from(900));
    }

    #[test]
    fn test_destroy_after_unlock() {
        let owner = addr(1);
        let holder = addr(2);
        let mut token = TokenLedger::new(owner);
        token.issue(owner, holder, U256::from(1000)).unwrap();
        token.disable_transfers(owner, false).unwrap();

        token.destroy(holder, holder, U256::from(20)).unwrap();
        assert_eq!(token.balance_of(holder), U256::from(980));
        assert_eq!(token.total_supply, U256::from(980));

        // still may not burn someone else's balance
        assert_eq!(
            token.destroy(holder, addr(3), U256::from(1)),
            Err(TokenError::Unauthorized)
        );
    }

    #[test]
    fn test_destroy_insufficient_balance() {
        let owner = addr(1);
        let mut token = TokenLedger::new(owner);
        token.issue(owner, owner, U256::from(10)).unwrap();

        assert_eq!(
            token.destroy(owner, owner, U256::from(20)),
            Err(TokenError::InsufficientBalance {
                required: U256::from(20),
                available: U256::from(10),
            })
        );
    }

    #[test]
    fn test_two_step_ownership_handover() {
        let owner = addr(1);
        let next = addr(2);
        let stranger = addr(3);
        let mut token = TokenLedger::new(owner);

        assert_eq!(
            token.transfer_ownership(stranger, next),
            Err(TokenError::Unauthorized)
        );
        assert_eq!(
            token.transfer_ownership(owner, H160::zero()),
            Err(TokenError::InvalidAddress {
                address: H160::zero()
            })
        );

        token.transfer_ownership(owner, next).unwrap();
        // old owner retains authority until the claim
        assert_eq!(token.owner, owner);
        token.issue(owner, owner, U256::from(1)).unwrap();

        assert_eq!(token.claim_ownership(stranger), Err(TokenError::Unauthorized));

        token.claim_ownership(next).unwrap();
        assert_eq!(token.owner, next);
        assert_eq!(token.pending_owner, None);
        assert_eq!(token.issue(owner, owner, U256::from(1)), Err(TokenError::Unauthorized));
    }
}
