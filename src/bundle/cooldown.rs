//! Per-route cooldown with escalating backoff, so a structurally dead
//! route (pool drained, contract paused) doesn't eat a bundle-build
//! attempt every single scan: each repeat failure multiplies the cooldown
//! window instead of resetting it to the initial value.

use std::collections::HashMap;

use alloy::primitives::Address;

use crate::domain::router::RouterKind;

pub type RouteKey = (Address, RouterKind, RouterKind);

const ESCALATION_FACTOR: u64 = 5;
const DEFAULT_MAX_COOLDOWN_BLOCKS: u64 = 1800;

struct CooldownEntry {
    last_failed_block: u64,
    cooldown_blocks: u64,
    failure_count: u32,
}

pub struct RouteCooldown {
    initial_cooldown_blocks: u64,
    max_cooldown_blocks: u64,
    entries: HashMap<RouteKey, CooldownEntry>,
}

impl RouteCooldown {
    pub fn new(initial_cooldown_blocks: u64) -> Self {
        Self {
            initial_cooldown_blocks,
            max_cooldown_blocks: DEFAULT_MAX_COOLDOWN_BLOCKS,
            entries: HashMap::new(),
        }
    }

    pub fn is_cooled_down(&self, key: &RouteKey, current_block: u64) -> bool {
        if self.initial_cooldown_blocks == 0 {
            return true;
        }
        match self.entries.get(key) {
            None => true,
            Some(entry) => current_block >= entry.last_failed_block + entry.cooldown_blocks,
        }
    }

    pub fn record_failure(&mut self, key: RouteKey, current_block: u64) {
        let entry = self.entries.entry(key).or_insert(CooldownEntry {
            last_failed_block: current_block,
            cooldown_blocks: self.initial_cooldown_blocks,
            failure_count: 0,
        });
        entry.failure_count += 1;
        entry.last_failed_block = current_block;
        let escalated = self
            .initial_cooldown_blocks
            .saturating_mul(ESCALATION_FACTOR.saturating_pow(entry.failure_count - 1));
        entry.cooldown_blocks = escalated.min(self.max_cooldown_blocks);
    }

    pub fn record_success(&mut self, key: &RouteKey) {
        self.entries.remove(key);
    }

    pub fn cleanup(&mut self, current_block: u64) {
        self.entries
            .retain(|_, entry| current_block < entry.last_failed_block + entry.cooldown_blocks);
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> RouteKey {
        (Address::ZERO, RouterKind::V2Amm, RouterKind::V3Amm)
    }

    #[test]
    fn no_cooldown_initially() {
        let cooldown = RouteCooldown::new(10);
        assert!(cooldown.is_cooled_down(&key(), 0));
    }

    #[test]
    fn cooldown_after_failure() {
        let mut cooldown = RouteCooldown::new(10);
        cooldown.record_failure(key(), 100);
        assert!(!cooldown.is_cooled_down(&key(), 105));
        assert!(cooldown.is_cooled_down(&key(), 111));
    }

    #[test]
    fn escalates_on_repeat_failure() {
        let mut cooldown = RouteCooldown::new(10);
        cooldown.record_failure(key(), 100);
        cooldown.record_failure(key(), 100);
        assert!(!cooldown.is_cooled_down(&key(), 120)); // 10*5 = 50 blocks
        assert!(cooldown.is_cooled_down(&key(), 151));
    }

    #[test]
    fn success_resets_cooldown() {
        let mut cooldown = RouteCooldown::new(10);
        cooldown.record_failure(key(), 100);
        cooldown.record_success(&key());
        assert!(cooldown.is_cooled_down(&key(), 100));
    }

    #[test]
    fn disabled_when_zero() {
        let mut cooldown = RouteCooldown::new(0);
        cooldown.record_failure(key(), 100);
        assert!(cooldown.is_cooled_down(&key(), 100));
    }
}
