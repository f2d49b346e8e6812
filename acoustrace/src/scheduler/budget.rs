//! Per-frame ray budget.

/// Ray counters for one frame.
///
/// `occlusion_rays + reflection_rays == total_used <= total_budget` holds
/// after every successful spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RayBudget {
    pub occlusion_rays: u32,
    pub reflection_rays: u32,
    pub total_used: u32,
    pub total_budget: u32,
}

impl RayBudget {
    pub fn new(total_budget: u32) -> Self {
        Self {
            total_budget,
            ..Self::default()
        }
    }

    /// Clears the counters and sets a new ceiling.
    pub fn reset(&mut self, total_budget: u32) {
        *self = Self::new(total_budget);
    }

    pub fn remaining(&self) -> u32 {
        self.total_budget.saturating_sub(self.total_used)
    }

    pub fn is_exhausted(&self) -> bool {
        self.total_used >= self.total_budget
    }

    pub fn can_afford(&self, rays: u32) -> bool {
        rays <= self.remaining()
    }

    /// Spends `rays` on occlusion. Nothing is spent if they do not fit.
    pub fn try_spend_occlusion(&mut self, rays: u32) -> bool {
        if !self.can_afford(rays) {
            return false;
        }
        self.occlusion_rays += rays;
        self.total_used += rays;
        true
    }

    /// Spends `rays` on reflections. Nothing is spent if they do not fit.
    pub fn try_spend_reflection(&mut self, rays: u32) -> bool {
        if !self.can_afford(rays) {
            return false;
        }
        self.reflection_rays += rays;
        self.total_used += rays;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_within_budget() {
        let mut budget = RayBudget::new(30);
        assert!(budget.try_spend_occlusion(1));
        assert!(budget.try_spend_reflection(24));
        assert!(!budget.try_spend_reflection(24));
        assert_eq!(budget.remaining(), 5);
        assert_eq!(budget.total_used, budget.occlusion_rays + budget.reflection_rays);

        for _ in 0..5 {
            assert!(budget.try_spend_occlusion(1));
        }
        assert!(budget.is_exhausted());
        assert!(!budget.try_spend_occlusion(1));
        assert_eq!(budget.total_used, 30);
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut budget = RayBudget::new(4);
        budget.try_spend_occlusion(3);
        budget.reset(10);
        assert_eq!(budget, RayBudget::new(10));
    }

    #[test]
    fn test_zero_budget() {
        let mut budget = RayBudget::new(0);
        assert!(budget.is_exhausted());
        assert!(!budget.try_spend_occlusion(1));
    }
}
