//! Resource stockpile.

use setlerio_core::{InsufficientResources, MissingResource, ResourceCounts, ResourceKind};

/// Resource stockpile owned by a world.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceLedger {
    stock: ResourceCounts,
}

impl ResourceLedger {
    /// Creates a ledger holding the provided stock.
    #[must_use]
    pub const fn new(stock: ResourceCounts) -> Self {
        Self { stock }
    }

    /// Current stock.
    #[must_use]
    pub const fn balance(&self) -> ResourceCounts {
        self.stock
    }

    /// Units of a single resource kind.
    #[must_use]
    pub const fn amount(&self, kind: ResourceKind) -> u32 {
        self.stock.get(kind)
    }

    /// Shortfall against `requirements`, or `None` when the stock covers them.
    #[must_use]
    pub fn missing_amount(&self, requirements: &ResourceCounts) -> Option<InsufficientResources> {
        let missing: Vec<MissingResource> = requirements
            .iter()
            .filter_map(|(kind, required)| {
                let available = self.stock.get(kind);
                (available < required).then_some(MissingResource {
                    kind,
                    required,
                    available,
                })
            })
            .collect();

        (!missing.is_empty()).then_some(InsufficientResources { missing })
    }

    /// Removes `requirements` from the stock. Nothing is removed on failure.
    pub fn deduct(&mut self, requirements: &ResourceCounts) -> Result<(), InsufficientResources> {
        if let Some(missing) = self.missing_amount(requirements) {
            return Err(missing);
        }
        for (kind, amount) in requirements.iter() {
            *self.stock.get_mut(kind) -= amount;
        }
        Ok(())
    }

    /// Returns `fraction` of `requirements` to the stock, rounding down per
    /// resource, and reports what was returned.
    pub fn restore(&mut self, requirements: &ResourceCounts, fraction: f64) -> ResourceCounts {
        let refund = requirements.scaled(fraction);
        self.stock.add(&refund);
        refund
    }

    /// Adds delivered resources to the stock.
    pub fn credit(&mut self, counts: &ResourceCounts) {
        self.stock.add(counts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(wood: u32, stone: u32) -> ResourceCounts {
        ResourceCounts {
            wood,
            stone,
            ..ResourceCounts::default()
        }
    }

    #[test]
    fn missing_amount_reports_each_short_kind() {
        let ledger = ResourceLedger::new(stock(5, 1));
        let missing = ledger.missing_amount(&stock(2, 3)).expect("short on stone");
        assert_eq!(
            missing.missing,
            vec![MissingResource {
                kind: ResourceKind::Stone,
                required: 3,
                available: 1,
            }]
        );
        assert!(ledger.missing_amount(&stock(5, 1)).is_none());
    }

    #[test]
    fn failed_deduct_leaves_stock_untouched() {
        let mut ledger = ResourceLedger::new(stock(1, 10));
        assert!(ledger.deduct(&stock(2, 3)).is_err());
        assert_eq!(ledger.balance(), stock(1, 10));

        ledger.deduct(&stock(1, 3)).expect("affordable");
        assert_eq!(ledger.balance(), stock(0, 7));
    }

    #[test]
    fn restore_rounds_down_per_resource() {
        let mut ledger = ResourceLedger::default();
        let refund = ledger.restore(&stock(3, 3), 0.5);
        assert_eq!(refund, stock(1, 1));
        assert_eq!(ledger.balance(), stock(1, 1));
    }
}
