//! Transactional wrapper around the crowdsale.
//!
//! Reproduces the execution model the sale was designed for: every
//! state-changing call runs alone inside one exclusive critical section and
//! commits all-or-nothing. A call that fails leaves no trace; there is no
//! partial success and no retry concept.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use primitive_types::{H160, U256};
use tracing::debug;

use crate::clock::Clock;
use crate::sale::{
    Crowdsale, SaleConfig, SaleEvent, SalePhase, SaleResult,
};
use crate::token::TokenLedger;
use crate::Timestamp;

/// Serialized, all-or-nothing front door to a [`Crowdsale`].
///
/// Each mutating call reads the clock once, runs against a working copy of
/// the sale state, and swaps the copy in only on success. Committed events
/// accumulate in an in-memory log from which an external indexer can
/// reconstruct the sale.
pub struct SaleEngine {
    state: Mutex<EngineState>,
    clock: Arc<dyn Clock>,
}

struct EngineState {
    sale: Crowdsale,
    events: Vec<SaleEvent>,
}

impl SaleEngine {
    /// Deploy a fresh ledger and sale. The ledger owner starts as `owner`
    /// (the deployer); the ownership handshake
    /// ([`transfer_token_ownership_to_sale`](Self::transfer_token_ownership_to_sale)
    /// then [`claim_token_ownership`](Self::claim_token_ownership)) must
    /// complete before contributions can mint.
    pub fn deploy(
        owner: H160,
        config: SaleConfig,
        clock: Arc<dyn Clock>,
    ) -> SaleResult<Self> {
        let token = TokenLedger::new(owner);
        let sale = Crowdsale::new(Self::sale_address(), owner, config, token)?;

        Ok(Self {
            state: Mutex::new(EngineState {
                sale,
                events: Vec::new(),
            }),
            clock,
        })
    }

    /// Engine-assigned contract address of the sale.
    pub fn sale_address() -> H160 {
        H160::from_low_u64_be(0x1000)
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one logical call. The closure mutates a working copy; on error
    /// the copy is dropped and nothing is written.
    fn transact(
        &self,
        f: impl FnOnce(&mut Crowdsale, Timestamp) -> SaleResult<SaleEvent>,
    ) -> SaleResult<SaleEvent> {
        let now = self.clock.now();
        let mut guard = self.lock();

        let mut working = guard.sale.clone();
        let event = f(&mut working, now)?;

        guard.sale = working;
        guard.events.push(event.clone());
        debug!("committed: {:?}", event);
        Ok(event)
    }

    // --- deployment wiring ---

    /// Propose the ledger ownership to the sale address. `caller` must be
    /// the current ledger owner (the deployer).
    pub fn transfer_token_ownership_to_sale(&self, caller: H160) -> SaleResult<SaleEvent> {
        self.transact(|sale, _now| {
            let sale_address = sale.address;
            let event = sale.token.transfer_ownership(caller, sale_address)?;
            Ok(SaleEvent::Token(event))
        })
    }

    /// Have the sale claim the ledger ownership proposed to it (only sale
    /// owner).
    pub fn claim_token_ownership(&self, caller: H160) -> SaleResult<SaleEvent> {
        self.transact(|sale, _now| sale.claim_token_ownership(caller))
    }

    /// Claim a pending ledger ownership as `caller` directly, e.g. the sale
    /// owner taking the ledger back after finalize.
    pub fn token_claim_ownership(&self, caller: H160) -> SaleResult<SaleEvent> {
        self.transact(|sale, _now| {
            let event = sale.token.claim_ownership(caller)?;
            Ok(SaleEvent::Token(event))
        })
    }

    // --- sale operations ---

    /// Send value to the sale.
    pub fn contribute(&self, purchaser: H160, value: U256) -> SaleResult<SaleEvent> {
        self.transact(|sale, now| sale.contribute(now, purchaser, value))
    }

    pub fn add_update_grantee(
        &self,
        caller: H160,
        grantee: H160,
        amount: U256,
    ) -> SaleResult<SaleEvent> {
        self.transact(|sale, now| sale.add_update_grantee(now, caller, grantee, amount))
    }

    pub fn delete_grantee(&self, caller: H160, grantee: H160) -> SaleResult<SaleEvent> {
        self.transact(|sale, now| sale.delete_grantee(now, caller, grantee))
    }

    pub fn set_fiat_raised_converted_to_wei(
        &self,
        caller: H160,
        amount: U256,
    ) -> SaleResult<SaleEvent> {
        self.transact(|sale, now| sale.set_fiat_raised_converted_to_wei(now, caller, amount))
    }

    pub fn finalize(&self, caller: H160) -> SaleResult<SaleEvent> {
        self.transact(|sale, now| sale.finalize(now, caller))
    }

    // --- token operations routed through the same transaction door ---

    pub fn transfer(&self, caller: H160, to: H160, amount: U256) -> SaleResult<SaleEvent> {
        self.transact(|sale, _now| Ok(SaleEvent::Token(sale.token.transfer(caller, to, amount)?)))
    }

    pub fn approve(&self, caller: H160, spender: H160, amount: U256) -> SaleResult<SaleEvent> {
        self.transact(|sale, _now| {
            Ok(SaleEvent::Token(sale.token.approve(caller, spender, amount)?))
        })
    }

    pub fn transfer_from(
        &self,
        caller: H160,
        from: H160,
        to: H160,
        amount: U256,
    ) -> SaleResult<SaleEvent> {
        self.transact(|sale, _now| {
            Ok(SaleEvent::Token(sale.token.transfer_from(caller, from, to, amount)?))
        })
    }

    pub fn destroy(&self, caller: H160, from: H160, amount: U256) -> SaleResult<SaleEvent> {
        self.transact(|sale, _now| {
            Ok(SaleEvent::Token(sale.token.destroy(caller, from, amount)?))
        })
    }

    // --- reads ---

    pub fn phase(&self) -> SalePhase {
        let now = self.clock.now();
        self.lock().sale.phase(now)
    }

    /// Tokens per wei at the current clock reading.
    pub fn rate(&self) -> u64 {
        let now = self.clock.now();
        self.lock().sale.rate_at(now)
    }

    pub fn total_funds_raised(&self) -> U256 {
        self.lock().sale.total_funds_raised()
    }

    pub fn wei_raised(&self) -> U256 {
        self.lock().sale.wei_raised
    }

    pub fn fiat_raised_converted_to_wei(&self) -> U256 {
        self.lock().sale.fiat_raised_converted_to_wei
    }

    pub fn is_finalized(&self) -> bool {
        self.lock().sale.is_finalized
    }

    pub fn balance_of(&self, account: H160) -> U256 {
        self.lock().sale.token.balance_of(account)
    }

    pub fn token_total_supply(&self) -> U256 {
        self.lock().sale.token.total_supply
    }

    pub fn transfers_enabled(&self) -> bool {
        self.lock().sale.token.transfers_enabled
    }

    pub fn token_owner(&self) -> H160 {
        self.lock().sale.token.owner
    }

    pub fn grantee_amount(&self, grantee: H160) -> U256 {
        self.lock().sale.grantees.amount_of(grantee)
    }

    pub fn grantee_count(&self) -> usize {
        self.lock().sale.grantees.len()
    }

    /// Grantees and amounts in insertion order.
    pub fn grantees(&self) -> Vec<(H160, U256)> {
        self.lock().sale.grantees.iter().collect()
    }

    /// Committed events in commit order.
    pub fn events(&self) -> Vec<SaleEvent> {
        self.lock().events.clone()
    }

    /// Point-in-time copy of the whole sale state.
    pub fn snapshot(&self) -> Crowdsale {
        self.lock().sale.clone()
    }
}
