//! Renewable resource held by every grid cell.

use serde::{Deserialize, Serialize};

/// A resource patch with bounded logistic-style regrowth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePatch {
    cap: f64,
    regrowth: f64,
    amount: f64,
}

impl ResourcePatch {
    /// The initial amount is clamped into `[0, cap]`.
    pub fn new(cap: f64, regrowth: f64, init: f64) -> Self {
        Self {
            cap,
            regrowth,
            amount: init.min(cap).max(0.0),
        }
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }

    pub fn regrowth(&self) -> f64 {
        self.regrowth
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Regrow toward capacity: `amount += regrowth * (cap - amount)`.
    pub fn step(&mut self) {
        self.amount += self.regrowth * (self.cap - self.amount);
        self.amount = self.amount.min(self.cap).max(0.0);
    }

    /// Remove up to `want` and return what was actually taken.
    pub fn take(&mut self, want: f64) -> f64 {
        let taken = self.amount.min(want.max(0.0));
        self.amount = (self.amount - taken).max(0.0);
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_initial_amount_is_clamped() {
        assert_eq!(ResourcePatch::new(10.0, 0.1, 50.0).amount(), 10.0);
        assert_eq!(ResourcePatch::new(10.0, 0.1, -2.0).amount(), 0.0);
        assert_eq!(ResourcePatch::new(10.0, 0.1, 5.0).amount(), 5.0);
    }

    #[test]
    fn test_regrowth_step() {
        let mut patch = ResourcePatch::new(10.0, 0.1, 5.0);
        patch.step();
        assert!((patch.amount() - 5.5).abs() < 1e-12);
        patch.step();
        assert!((patch.amount() - 5.95).abs() < 1e-12);
    }

    #[test]
    fn test_regrowth_converges_to_cap() {
        let mut patch = ResourcePatch::new(10.0, 0.1, 0.0);
        for _ in 0..1_000 {
            patch.step();
        }
        assert!((patch.amount() - 10.0).abs() < 1e-9);
        assert!(patch.amount() <= patch.cap());
    }

    #[test]
    fn test_overshooting_rate_is_clamped() {
        let mut patch = ResourcePatch::new(10.0, 2.5, 1.0);
        patch.step();
        assert_eq!(patch.amount(), 10.0);
    }

    #[test]
    fn test_take_is_bounded_by_amount() {
        let mut patch = ResourcePatch::new(10.0, 0.1, 0.75);
        assert_eq!(patch.take(1.0), 0.75);
        assert_eq!(patch.amount(), 0.0);
        assert_eq!(patch.take(1.0), 0.0);
    }

    proptest! {
        #[test]
        fn amount_stays_within_cap(
            cap in 0.0f64..100.0,
            regrowth in 0.0f64..3.0,
            init in -10.0f64..200.0,
            takes in proptest::collection::vec(0.0f64..20.0, 0..50),
        ) {
            let mut patch = ResourcePatch::new(cap, regrowth, init);
            prop_assert!(patch.amount() >= 0.0 && patch.amount() <= cap);
            for want in takes {
                let taken = patch.take(want);
                prop_assert!(taken >= 0.0 && taken <= want);
                patch.step();
                prop_assert!(patch.amount() >= 0.0 && patch.amount() <= cap);
            }
        }
    }
}
