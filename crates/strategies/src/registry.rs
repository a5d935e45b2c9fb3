//! Strategy registry for lookup and discovery.

use crate::strategy::StrategyKind;
use anyhow::{ensure, Result};

/// Insertion-ordered set of selectable strategies. Populated once at
/// startup; duplicate ids are a configuration error and fatal there.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    strategies: Vec<StrategyKind>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    pub fn with_default_strategies() -> Self {
        let mut registry = Self::new();
        for strategy in StrategyKind::ALL {
            registry
                .register(strategy)
                .expect("default catalog registers each strategy once");
        }
        registry
    }

    pub fn register(&mut self, strategy: StrategyKind) -> Result<()> {
        ensure!(
            self.find(strategy.id()).is_none(),
            "strategy id {:?} already registered",
            strategy.id()
        );
        self.strategies.push(strategy);
        Ok(())
    }

    pub fn all(&self) -> &[StrategyKind] {
        &self.strategies
    }

    pub fn find(&self, id: &str) -> Option<StrategyKind> {
        self.strategies
            .iter()
            .copied()
            .find(|strategy| strategy.id() == id)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_holds_the_whole_catalog() {
        let registry = StrategyRegistry::with_default_strategies();
        assert_eq!(registry.len(), StrategyKind::ALL.len());
        assert_eq!(registry.all(), &StrategyKind::ALL);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = StrategyRegistry::new();
        registry
            .register(StrategyKind::ForLoop)
            .expect("first registration");
        let err = registry
            .register(StrategyKind::ForLoop)
            .expect_err("duplicate registration");
        assert!(err.to_string().contains("already registered"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn find_by_id() {
        let registry = StrategyRegistry::with_default_strategies();
        assert_eq!(registry.find("LinqQuery"), Some(StrategyKind::LinqQuery));
        assert_eq!(registry.find("DoWhile"), None);
    }
}
