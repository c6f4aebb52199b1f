use tracing::debug;

use super::{EstimateContext, RateCard, usd};
use crate::attributes::{self, NumericPolicy};
use crate::error::CostResult;
use crate::models::{BillingMode, CostEstimate, HOURS_PER_MONTH, ImpactMetric, ResourceDescriptor};

/// Utilization assumed for carbon estimates when no `utilization` tag is set
const DEFAULT_UTILIZATION: f64 = 0.5;

pub fn estimate(
    resource: &ResourceDescriptor,
    ctx: &EstimateContext<'_>,
) -> CostResult<CostEstimate> {
    let platform = attributes::platform(&resource.tags);
    let tenancy = attributes::tenancy(&resource.tags);

    let Some(hourly) = ctx.pricing.ec2_hourly(&resource.sku, platform, tenancy) else {
        debug!(sku = %resource.sku, %platform, %tenancy, "EC2 rate not found");
        return Ok(CostEstimate::zero(format!(
            "EC2 instance type '{}' not found in pricing data ({platform}/{tenancy})",
            resource.sku
        )));
    };

    let monthly = hourly * HOURS_PER_MONTH;
    let mut estimate = CostEstimate::new(
        monthly,
        hourly,
        format!(
            "On-demand {platform}/{tenancy} {}: {}/hour x {HOURS_PER_MONTH} hours/month",
            resource.sku,
            usd(hourly)
        ),
    );

    if let Some(carbon) = ctx.carbon {
        // Carbon is best effort; a bad utilization tag never fails the estimate
        let utilization = attributes::numeric(
            &resource.tags,
            &["utilization"],
            DEFAULT_UTILIZATION,
            NumericPolicy::Lenient,
        )?
        .value
        .min(1.0);

        if let Some(grams) =
            carbon.grams_co2e(&resource.sku, &resource.region, utilization, HOURS_PER_MONTH)
        {
            estimate = estimate.with_impact(ImpactMetric::carbon(grams));
        }
    }

    Ok(estimate)
}

pub fn rate_card(resource: &ResourceDescriptor, ctx: &EstimateContext<'_>) -> RateCard {
    let platform = attributes::platform(&resource.tags);
    let tenancy = attributes::tenancy(&resource.tags);
    let rate = ctx.pricing.ec2_hourly(&resource.sku, platform, tenancy);

    RateCard {
        billing_mode: BillingMode::PerHour,
        rate: rate.unwrap_or(0.0),
        unit: "hour",
        description: match rate {
            Some(_) => format!(
                "EC2 on-demand {} ({platform}/{tenancy}), billed per instance-hour",
                resource.sku
            ),
            None => format!("EC2 instance type '{}' not found in pricing data", resource.sku),
        },
    }
}
