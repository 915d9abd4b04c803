use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{
    phase, rate, GranteeRegistry, SaleError, SaleEvent, SalePhase, SaleResult,
};
use crate::token::TokenLedger;
use crate::Timestamp;

/// Share of the post-presale supply minted to each of team and advisor
/// at finalize, in percent.
pub const TEAM_ALLOCATION_PERCENT: u64 = 10;
pub const ADVISOR_ALLOCATION_PERCENT: u64 = 10;

/// Construction parameters of a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Sale window, `start_time < end_time`
    pub start_time: Timestamp,
    pub end_time: Timestamp,

    /// Destination for contributed funds
    pub wallet: H160,

    /// Allocation addresses minted to at finalize
    pub wallet_team: H160,
    pub wallet_advisor: H160,

    /// Hard cap in wei; reaching it ends the sale
    pub goal: U256,
}

impl SaleConfig {
    /// Reject zero addresses, a zero goal, and an inverted window before any
    /// state is created.
    pub fn validate(&self) -> SaleResult<()> {
        if self.start_time >= self.end_time {
            return Err(SaleError::InvalidTimeRange {
                start: self.start_time,
                end: self.end_time,
            });
        }
        for address in [self.wallet, self.wallet_team, self.wallet_advisor] {
            if address.is_zero() {
                return Err(SaleError::InvalidAddress { address });
            }
        }
        if self.goal.is_zero() {
            return Err(SaleError::InvalidAmount);
        }
        Ok(())
    }
}

/// The crowdsale: owns the sale lifecycle and the token ledger it sells.
///
/// Phase is derived per call from the supplied timestamp, never stored.
/// Minting requires the ledger ownership handshake to have completed
/// ([`claim_token_ownership`](Self::claim_token_ownership)); until then
/// contributions fail at the ledger with `Unauthorized`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crowdsale {
    /// Address this sale acts under when calling the ledger
    pub address: H160,

    /// Sale owner: may manage grants, report fiat, and finalize
    pub owner: H160,

    pub config: SaleConfig,

    /// The ledger this sale controls
    pub token: TokenLedger,

    /// Cumulative wei received via contributions
    pub wei_raised: U256,

    /// Owner-reported fiat contributions converted to wei, counted toward
    /// the cap without an on-chain payment
    pub fiat_raised_converted_to_wei: U256,

    /// Presale grants, minted in insertion order at finalize
    pub grantees: GranteeRegistry,

    /// One-way flag set by a successful finalize
    pub is_finalized: bool,
}

impl Crowdsale {
    pub fn new(
        address: H160,
        owner: H160,
        config: SaleConfig,
        token: TokenLedger,
    ) -> SaleResult<Self> {
        config.validate()?;
        for required in [address, owner] {
            if required.is_zero() {
                return Err(SaleError::InvalidAddress { address: required });
            }
        }

        Ok(Self {
            address,
            owner,
            config,
            token,
            wei_raised: U256::zero(),
            fiat_raised_converted_to_wei: U256::zero(),
            grantees: GranteeRegistry::new(),
            is_finalized: false,
        })
    }

    /// Current phase for the given timestamp.
    pub fn phase(&self, now: Timestamp) -> SalePhase {
        phase::derive(
            now,
            self.config.start_time,
            self.config.end_time,
            self.total_funds_raised(),
            self.config.goal,
            self.is_finalized,
        )
    }

    /// Tokens per wei at the given timestamp.
    pub fn rate_at(&self, now: Timestamp) -> u64 {
        rate::rate_at(self.config.start_time, now)
    }

    /// Wei received plus the reported fiat equivalent.
    pub fn total_funds_raised(&self) -> U256 {
        self.wei_raised
            .saturating_add(self.fiat_raised_converted_to_wei)
    }

    /// Accept a contribution: mint `value * rate` tokens to the purchaser
    /// and forward the value to the sale wallet.
    ///
    /// A contribution that crosses the hard cap is accepted in full; only
    /// once the cap is already met do further attempts fail.
    pub fn contribute(
        &mut self,
        now: Timestamp,
        purchaser: H160,
        value: U256,
    ) -> SaleResult<SaleEvent> {
        if purchaser.is_zero() {
            return Err(SaleError::InvalidAddress { address: purchaser });
        }
        match self.phase(now) {
            SalePhase::Active => {}
            SalePhase::EndedAwaitingFinalize
                if self.total_funds_raised() >= self.config.goal =>
            {
                return Err(SaleError::HardCapReached {
                    raised: self.total_funds_raised(),
                    goal: self.config.goal,
                });
            }
            _ => return Err(SaleError::NotActive),
        }
        if value.is_zero() {
            return Err(SaleError::ZeroContribution);
        }

        let rate = self.rate_at(now);
        let tokens = value
            .checked_mul(U256::from(rate))
            .ok_or(SaleError::Overflow)?;
        let wei_raised = self
            .wei_raised
            .checked_add(value)
            .ok_or(SaleError::Overflow)?;

        self.token.issue(self.address, purchaser, tokens)?;
        self.wei_raised = wei_raised;

        info!(
            "contribution accepted: {} wei from {:?} at rate {} ({} tokens), forwarded to {:?}",
            value, purchaser, rate, tokens, self.config.wallet
        );

        Ok(SaleEvent::TokenPurchase {
            purchaser,
            value,
            tokens,
        })
    }

    /// Register or overwrite a presale grant (only owner, only while active).
    pub fn add_update_grantee(
        &mut self,
        now: Timestamp,
        caller: H160,
        grantee: H160,
        amount: U256,
    ) -> SaleResult<SaleEvent> {
        if caller != self.owner {
            return Err(SaleError::Unauthorized);
        }
        if grantee.is_zero() {
            return Err(SaleError::InvalidAddress { address: grantee });
        }
        if amount.is_zero() {
            return Err(SaleError::InvalidAmount);
        }
        if self.phase(now) != SalePhase::Active {
            return Err(SaleError::NotActive);
        }

        let added = self.grantees.upsert(grantee, amount)?;
        if added {
            info!("grant added: {} tokens to {:?}", amount, grantee);
            Ok(SaleEvent::GrantAdded { grantee, amount })
        } else {
            info!("grant updated: {} tokens to {:?}", amount, grantee);
            Ok(SaleEvent::GrantUpdated { grantee, amount })
        }
    }

    /// Remove a presale grant (only owner, only while active). Removing an
    /// absent grantee is a no-op, not an error.
    pub fn delete_grantee(
        &mut self,
        now: Timestamp,
        caller: H160,
        grantee: H160,
    ) -> SaleResult<SaleEvent> {
        if caller != self.owner {
            return Err(SaleError::Unauthorized);
        }
        if grantee.is_zero() {
            return Err(SaleError::InvalidAddress { address: grantee });
        }
        if self.phase(now) != SalePhase::Active {
            return Err(SaleError::NotActive);
        }

        let amount = self.grantees.remove(grantee);
        warn!("grant deleted: {:?} (held {} tokens)", grantee, amount);
        Ok(SaleEvent::GrantDeleted { grantee, amount })
    }

    /// Replace the reported fiat-equivalent figure (only owner, only before
    /// the window closes and before finalize). Overwrites, does not
    /// accumulate.
    pub fn set_fiat_raised_converted_to_wei(
        &mut self,
        now: Timestamp,
        caller: H160,
        amount: U256,
    ) -> SaleResult<SaleEvent> {
        if caller != self.owner {
            return Err(SaleError::Unauthorized);
        }
        if self.is_finalized {
            return Err(SaleError::AlreadyFinalized);
        }
        if now >= self.config.end_time {
            return Err(SaleError::AlreadyEnded);
        }

        let previous = self.fiat_raised_converted_to_wei;
        self.fiat_raised_converted_to_wei = amount;

        info!("fiat raised updated: {} -> {} wei equivalent", previous, amount);
        Ok(SaleEvent::FiatRaisedUpdated { previous, amount })
    }

    /// Finalize the sale (only owner, once, after the window closes or the
    /// cap is met): mint every presale grant in insertion order, mint the
    /// team and advisor allocations, unlock transfers, and hand the ledger
    /// ownership back to the sale owner.
    ///
    /// Callers needing all-or-nothing semantics go through
    /// [`SaleEngine`](crate::engine::SaleEngine), which discards every write
    /// of a failed call.
    pub fn finalize(&mut self, now: Timestamp, caller: H160) -> SaleResult<SaleEvent> {
        if caller != self.owner {
            return Err(SaleError::Unauthorized);
        }
        if self.is_finalized {
            return Err(SaleError::AlreadyFinalized);
        }
        if self.phase(now) != SalePhase::EndedAwaitingFinalize {
            return Err(SaleError::TooEarly);
        }

        let grants: Vec<(H160, U256)> = self.grantees.iter().collect();
        for (grantee, amount) in grants {
            self.token.issue(self.address, grantee, amount)?;
            info!("presale grant minted: {} tokens to {:?}", amount, grantee);
        }

        let supply_after_presale = self.token.total_supply;
        let team_allocation = supply_after_presale * U256::from(TEAM_ALLOCATION_PERCENT) / 100;
        let advisor_allocation =
            supply_after_presale * U256::from(ADVISOR_ALLOCATION_PERCENT) / 100;

        if !team_allocation.is_zero() {
            self.token
                .issue(self.address, self.config.wallet_team, team_allocation)?;
        }
        if !advisor_allocation.is_zero() {
            self.token
                .issue(self.address, self.config.wallet_advisor, advisor_allocation)?;
        }

        self.token.disable_transfers(self.address, false)?;
        self.token.transfer_ownership(self.address, self.owner)?;
        self.is_finalized = true;

        info!(
            "sale finalized: team {}, advisor {}, total supply {}",
            team_allocation, advisor_allocation, self.token.total_supply
        );

        Ok(SaleEvent::Finalized {
            team_allocation,
            advisor_allocation,
            total_supply: self.token.total_supply,
        })
    }

    /// Claim the ledger ownership previously proposed to this sale's
    /// address (only owner). Completes the deployment handshake that must
    /// precede any contribution.
    pub fn claim_token_ownership(&mut self, caller: H160) -> SaleResult<SaleEvent> {
        if caller != self.owner {
            return Err(SaleError::Unauthorized);
        }
        let event = self.token.claim_ownership(self.address)?;
        info!("sale {:?} claimed token ledger ownership", self.address);
        Ok(SaleEvent::Token(event))
    }
}
