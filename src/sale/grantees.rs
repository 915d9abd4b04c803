//! Bounded presale grant registry.
//!
//! One insertion-ordered address -> amount container. Iteration order is the
//! order grantees were first added, which is the mint order at finalize.

use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{SaleError, SaleResult};

/// Maximum number of distinct presale grantees.
pub const MAX_TOKEN_GRANTEES: usize = 100;

/// Insertion-ordered, capacity-bounded grant registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GranteeRegistry {
    amounts: HashMap<H160, U256>,
    order: Vec<H160>,
    capacity: usize,
}

impl GranteeRegistry {
    pub fn new() -> Self {
        Self::with_capacity(MAX_TOKEN_GRANTEES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            amounts: HashMap::new(),
            order: Vec::new(),
            capacity,
        }
    }

    /// Insert or overwrite a grant. Returns `true` when the grantee is new.
    /// Inserting a new grantee at capacity fails; overwriting never does.
    pub fn upsert(&mut self, grantee: H160, amount: U256) -> SaleResult<bool> {
        if self.amounts.contains_key(&grantee) {
            self.amounts.insert(grantee, amount);
            return Ok(false);
        }

        if self.order.len() >= self.capacity {
            return Err(SaleError::RegistryFull { max: self.capacity });
        }

        self.order.push(grantee);
        self.amounts.insert(grantee, amount);
        Ok(true)
    }

    /// Remove a grant, returning the amount it held. Absent grantees are a
    /// no-op returning zero.
    pub fn remove(&mut self, grantee: H160) -> U256 {
        match self.amounts.remove(&grantee) {
            Some(amount) => {
                self.order.retain(|key| *key != grantee);
                amount
            }
            None => U256::zero(),
        }
    }

    /// Amount granted to an address, zero when absent.
    pub fn amount_of(&self, grantee: H160) -> U256 {
        self.amounts.get(&grantee).copied().unwrap_or_default()
    }

    pub fn contains(&self, grantee: H160) -> bool {
        self.amounts.contains_key(&grantee)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Grantees and amounts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (H160, U256)> + '_ {
        self.order
            .iter()
            .map(move |key| (*key, self.amounts[key]))
    }

    /// Grantee addresses in insertion order.
    pub fn addresses(&self) -> &[H160] {
        &self.order
    }
}

impl Default for GranteeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> H160 {
        H160::from_low_u64_be(n)
    }

    #[test]
    fn test_upsert_add_then_update() {
        let mut registry = GranteeRegistry::new();

        assert!(registry.upsert(addr(1), U256::from(100)).unwrap());
        assert_eq!(registry.amount_of(addr(1)), U256::from(100));
        assert_eq!(registry.len(), 1);

        // overwrite, not sum, and no key growth
        assert!(!registry.upsert(addr(1), U256::from(50)).unwrap());
        assert_eq!(registry.amount_of(addr(1)), U256::from(50));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_capacity_bound_hits_on_overflow_only() {
        let mut registry = GranteeRegistry::with_capacity(3);
        for i in 1..=3 {
            registry.upsert(addr(i), U256::from(100)).unwrap();
        }

        assert_eq!(
            registry.upsert(addr(4), U256::from(100)),
            Err(SaleError::RegistryFull { max: 3 })
        );
        // updating an existing grantee still works at capacity
        registry.upsert(addr(2), U256::from(7)).unwrap();
        assert_eq!(registry.amount_of(addr(2)), U256::from(7));
    }

    #[test]
    fn test_remove_is_safe_and_frees_a_slot() {
        let mut registry = GranteeRegistry::with_capacity(2);
        registry.upsert(addr(1), U256::from(100)).unwrap();
        registry.upsert(addr(2), U256::from(200)).unwrap();

        assert_eq!(registry.remove(addr(1)), U256::from(100));
        assert_eq!(registry.amount_of(addr(1)), U256::zero());
        assert_eq!(registry.len(), 1);

        // removing again is a no-op
        assert_eq!(registry.remove(addr(1)), U256::zero());

        registry.upsert(addr(3), U256::from(300)).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_iteration_preserves_insertion_order() {
        let mut registry = GranteeRegistry::new();
        for i in [5u64, 3, 9, 1] {
            registry.upsert(addr(i), U256::from(i)).unwrap();
        }
        registry.upsert(addr(3), U256::from(33)).unwrap();

        let order: Vec<H160> = registry.iter().map(|(key, _)| key).collect();
        assert_eq!(order, vec![addr(5), addr(3), addr(9), addr(1)]);
        assert_eq!(registry.amount_of(addr(3)), U256::from(33));
    }
}
