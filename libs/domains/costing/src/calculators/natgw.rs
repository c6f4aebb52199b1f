use tracing::debug;

use super::{EstimateContext, RateCard, missing_components_note, usd};
use crate::attributes::{self, NumericPolicy};
use crate::error::CostResult;
use crate::models::{BillingMode, CostEstimate, HOURS_PER_MONTH, ResourceDescriptor};
use crate::tiered::calculate_tiered_cost;

/// `data_processed_gb` is always parsed strictly: the caller typed it in,
/// and a silently wrong data volume is worse than a rejected request.
pub fn estimate(
    resource: &ResourceDescriptor,
    ctx: &EstimateContext<'_>,
) -> CostResult<CostEstimate> {
    let data_gb = attributes::numeric(
        &resource.tags,
        &["data_processed_gb"],
        0.0,
        NumericPolicy::Strict,
    )?;

    let hourly = ctx.pricing.nat_gateway_hourly();
    let tiers = ctx.pricing.nat_gateway_data_tiers();

    if hourly.is_none() && tiers.is_empty() {
        debug!("NAT gateway rates not found");
        return Ok(CostEstimate::zero("NAT gateway pricing not found in pricing data"));
    }

    let mut missing = Vec::new();
    let fixed = match hourly {
        Some(rate) => rate * HOURS_PER_MONTH,
        None => {
            missing.push("hourly");
            0.0
        }
    };
    if tiers.is_empty() {
        missing.push("data processing");
    }
    let data_cost = calculate_tiered_cost(data_gb.value, &tiers);

    let mut parts = vec![
        format!("{}/hour x {HOURS_PER_MONTH} hours", usd(hourly.unwrap_or(0.0))),
        format!("{} GB processed = {}", data_gb.value, usd(data_cost)),
    ];
    parts.extend(missing_components_note(&missing));

    Ok(CostEstimate::new(
        fixed + data_cost,
        hourly.unwrap_or(0.0),
        format!("NAT gateway: {}", parts.join("; ")),
    ))
}

pub fn rate_card(_resource: &ResourceDescriptor, ctx: &EstimateContext<'_>) -> RateCard {
    RateCard {
        billing_mode: BillingMode::PerHour,
        rate: ctx.pricing.nat_gateway_hourly().unwrap_or(0.0),
        unit: "hour",
        description: "NAT gateway, billed per hour plus per GB of data processed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CostError;
    use crate::pricing_source::{MockPricingSource, PriceTier};

    fn pricing() -> MockPricingSource {
        let mut mock = MockPricingSource::new();
        mock.expect_nat_gateway_hourly().returning(|| Some(0.045));
        mock.expect_nat_gateway_data_tiers()
            .returning(|| vec![PriceTier::unbounded(0.045)]);
        mock
    }

    #[test]
    fn test_hourly_plus_data() {
        let pricing = pricing();
        let ctx = EstimateContext::new(&pricing);
        let resource =
            ResourceDescriptor::new("natgw", "", "us-east-1").with_tag("data_processed_gb", "100");

        let estimate = estimate(&resource, &ctx).unwrap();
        assert!((estimate.monthly_cost - (0.045 * 730.0 + 4.5)).abs() < 1e-9);
    }

    #[test]
    fn test_no_data_tag_is_hourly_only() {
        let pricing = pricing();
        let ctx = EstimateContext::new(&pricing);
        let estimate = estimate(&ResourceDescriptor::new("natgw", "", "us-east-1"), &ctx).unwrap();
        assert!((estimate.monthly_cost - 32.85).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_data_tag_is_rejected() {
        let pricing = pricing();
        let ctx = EstimateContext::new(&pricing);
        let resource =
            ResourceDescriptor::new("natgw", "", "us-east-1").with_tag("data_processed_gb", "abc");

        let err = estimate(&resource, &ctx).unwrap_err();
        assert_eq!(
            err,
            CostError::InvalidNumericTag {
                key: "data_processed_gb".to_string(),
                value: "abc".to_string()
            }
        );
    }
}
