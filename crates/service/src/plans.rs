//! Plan tiers and the features each one unlocks.

use serde::Serialize;

use models::PlanType;

/// Feature set granted by a plan.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PlanFeatures {
    pub plan: PlanType,
    pub max_products: u32,
    pub public_page: bool,
    pub store: bool,
    /// Monthly price shown on the plans page, in centavos.
    pub monthly_price_cents: i64,
}

pub fn features(plan: PlanType) -> PlanFeatures {
    let (max_products, public_page, store, monthly_price_cents) = match plan {
        PlanType::Gratuito => (3, false, false, 0),
        PlanType::Essencial => (10, true, false, 4990),
        PlanType::Premium => (50, true, true, 9990),
        PlanType::PremiumVip => (300, true, true, 19990),
    };
    PlanFeatures { plan, max_products, public_page, store, monthly_price_cents }
}

/// Every plan in upgrade order.
pub fn catalog() -> Vec<PlanFeatures> {
    PlanType::ALL.iter().copied().map(features).collect()
}

pub fn is_upgrade(from: PlanType, to: PlanType) -> bool {
    to.rank() > from.rank()
}

pub fn is_downgrade(from: PlanType, to: PlanType) -> bool {
    to.rank() < from.rank()
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ProductAllowance {
    pub can_add: bool,
    pub current: u64,
    pub limit: u32,
    pub remaining: u64,
}

/// Whether a subscriber with `current` active products may add one more.
pub fn can_add_product(plan: PlanType, current: u64) -> ProductAllowance {
    let limit = features(plan).max_products;
    ProductAllowance {
        can_add: current < u64::from(limit),
        current,
        limit,
        remaining: u64::from(limit).saturating_sub(current),
    }
}
