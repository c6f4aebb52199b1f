use tracing::debug;

use super::{EstimateContext, RateCard, usd};
use crate::attributes;
use crate::error::CostResult;
use crate::models::{BillingMode, CostEstimate, HOURS_PER_MONTH, ResourceDescriptor};

fn extended_support(resource: &ResourceDescriptor) -> bool {
    attributes::first_text(&resource.tags, &["support_type", "supportType"])
        .is_some_and(|v| v.eq_ignore_ascii_case("extended"))
}

fn support_label(extended: bool) -> &'static str {
    if extended { "extended" } else { "standard" }
}

/// Control plane only; worker nodes are priced as compute instances.
pub fn estimate(
    resource: &ResourceDescriptor,
    ctx: &EstimateContext<'_>,
) -> CostResult<CostEstimate> {
    let extended = extended_support(resource);
    let label = support_label(extended);

    let Some(hourly) = ctx.pricing.eks_cluster_hourly(extended) else {
        debug!(support = label, "EKS rate not found");
        return Ok(CostEstimate::zero(format!(
            "EKS {label} support control plane rate not found in pricing data"
        )));
    };

    Ok(CostEstimate::new(
        hourly * HOURS_PER_MONTH,
        hourly,
        format!(
            "EKS control plane ({label} support): {}/hour x {HOURS_PER_MONTH} hours/month; \
             worker nodes billed separately",
            usd(hourly)
        ),
    ))
}

pub fn rate_card(resource: &ResourceDescriptor, ctx: &EstimateContext<'_>) -> RateCard {
    let extended = extended_support(resource);
    let rate = ctx.pricing.eks_cluster_hourly(extended);

    RateCard {
        billing_mode: BillingMode::PerHour,
        rate: rate.unwrap_or(0.0),
        unit: "hour",
        description: format!(
            "EKS control plane ({} support), billed per cluster-hour",
            support_label(extended)
        ),
    }
}
