use tracing::{debug, warn};

use super::{EstimateContext, RateCard, missing_components_note, usd};
use crate::attributes::{self, LoadBalancerKind};
use crate::error::CostResult;
use crate::models::{BillingMode, CostEstimate, HOURS_PER_MONTH, ResourceDescriptor};

pub const DEFAULT_CAPACITY_UNITS: f64 = 1.0;
const CAPACITY_UNIT_WARN_THRESHOLD: f64 = 1000.0;

fn kind(resource: &ResourceDescriptor) -> LoadBalancerKind {
    attributes::load_balancer_kind(&resource.tags, &resource.sku, &resource.resource_type)
}

pub fn estimate(
    resource: &ResourceDescriptor,
    ctx: &EstimateContext<'_>,
) -> CostResult<CostEstimate> {
    let kind = kind(resource);
    let unit_name = kind.capacity_unit_name();
    let units = attributes::numeric(
        &resource.tags,
        &[kind.capacity_unit_tag(), "capacity_units"],
        DEFAULT_CAPACITY_UNITS,
        ctx.numeric_policy,
    )?;
    if units.value > CAPACITY_UNIT_WARN_THRESHOLD {
        warn!(%kind, units = units.value, "Unusually large capacity unit value");
    }

    let hourly = ctx.pricing.load_balancer_hourly(kind);
    let unit_rate = ctx.pricing.load_balancer_capacity_unit_hourly(kind);

    if hourly.is_none() && unit_rate.is_none() {
        debug!(%kind, "Load balancer rates not found");
        return Ok(CostEstimate::zero(format!(
            "{kind} load balancer pricing not found in pricing data"
        )));
    }

    let mut missing = Vec::new();
    if hourly.is_none() {
        missing.push("hourly");
    }
    if unit_rate.is_none() {
        missing.push(unit_name);
    }

    let fixed = hourly.unwrap_or(0.0);
    let variable = units.value * unit_rate.unwrap_or(0.0);

    let mut parts = vec![
        format!("fixed {}/hour", usd(fixed)),
        format!(
            "{} {unit_name} x {}/{unit_name}-hour",
            units.value,
            usd(unit_rate.unwrap_or(0.0))
        ),
        format!("x {HOURS_PER_MONTH} hours/month"),
    ];
    if units.assumed {
        parts.push(format!("{unit_name} assumed: {DEFAULT_CAPACITY_UNITS}"));
    }
    parts.extend(missing_components_note(&missing));

    Ok(CostEstimate::new(
        (fixed + variable) * HOURS_PER_MONTH,
        fixed,
        format!("{kind} load balancer: {}", parts.join("; ")),
    ))
}

pub fn rate_card(resource: &ResourceDescriptor, ctx: &EstimateContext<'_>) -> RateCard {
    let kind = kind(resource);
    RateCard {
        billing_mode: BillingMode::PerHour,
        rate: ctx.pricing.load_balancer_hourly(kind).unwrap_or(0.0),
        unit: "hour",
        description: format!(
            "{kind} load balancer, billed per hour plus per {}-hour",
            kind.capacity_unit_name()
        ),
    }
}
