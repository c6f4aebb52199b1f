use crate::pricing_source::PriceTier;

/// Total cost of `quantity` under a cumulative volume-tiered schedule.
///
/// Tiers are walked in order; each is charged only for the part of the
/// quantity between the previous bound and its own. Non-positive quantities
/// and empty schedules cost nothing. Quantity beyond the last bounded tier is
/// not charged.
pub fn calculate_tiered_cost(quantity: f64, tiers: &[PriceTier]) -> f64 {
    if quantity.is_nan() || quantity <= 0.0 || tiers.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    let mut lower = 0.0;

    for tier in tiers {
        let upper = tier.upper_bound.unwrap_or(f64::INFINITY).min(quantity);
        if upper > lower {
            total += (upper - lower) * tier.rate;
            lower = upper;
        }
        if lower >= quantity {
            break;
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric_tiers() -> Vec<PriceTier> {
        vec![
            PriceTier::new(10_000.0, 0.30),
            PriceTier::new(250_000.0, 0.10),
            PriceTier::new(1_000_000.0, 0.05),
            PriceTier::unbounded(0.02),
        ]
    }

    #[test]
    fn test_two_tier_example() {
        let tiers = [PriceTier::new(10_000.0, 0.30), PriceTier::new(250_000.0, 0.10)];
        let cost = calculate_tiered_cost(50_000.0, &tiers);
        assert!((cost - 7_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_within_first_tier() {
        assert!((calculate_tiered_cost(500.0, &metric_tiers()) - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_exact_boundary() {
        assert!((calculate_tiered_cost(10_000.0, &metric_tiers()) - 3_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_into_unbounded_tier() {
        // 3000 + 24000 + 37500 + 1_000_000 * 0.02
        let cost = calculate_tiered_cost(2_000_000.0, &metric_tiers());
        assert!((cost - 84_500.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_negative_and_empty() {
        assert_eq!(calculate_tiered_cost(0.0, &metric_tiers()), 0.0);
        assert_eq!(calculate_tiered_cost(-5.0, &metric_tiers()), 0.0);
        assert_eq!(calculate_tiered_cost(100.0, &[]), 0.0);
        assert_eq!(calculate_tiered_cost(f64::NAN, &metric_tiers()), 0.0);
    }

    #[test]
    fn test_single_unbounded_tier_is_flat_rate() {
        let cost = calculate_tiered_cost(123.0, &[PriceTier::unbounded(0.045)]);
        assert!((cost - 5.535).abs() < 1e-9);
    }
}
