use tracing::debug;

use super::{EstimateContext, RateCard, missing_components_note, usd};
use crate::attributes;
use crate::error::CostResult;
use crate::models::{BillingMode, CostEstimate, ResourceDescriptor};

pub const DEFAULT_MEMORY_MB: f64 = 128.0;
pub const DEFAULT_DURATION_MS: f64 = 100.0;

pub fn estimate(
    resource: &ResourceDescriptor,
    ctx: &EstimateContext<'_>,
) -> CostResult<CostEstimate> {
    let tags = &resource.tags;
    let policy = ctx.numeric_policy;
    let memory_mb =
        attributes::numeric(tags, &["memory_mb", "memorySize"], DEFAULT_MEMORY_MB, policy)?;
    let requests = attributes::numeric(tags, &["requests_per_month"], 0.0, policy)?;
    let duration_ms = attributes::numeric(tags, &["avg_duration_ms"], DEFAULT_DURATION_MS, policy)?;
    let architecture = attributes::architecture(tags);

    let request_price = ctx.pricing.lambda_request_price();
    let gb_second_price = ctx.pricing.lambda_gb_second_price(architecture);

    if request_price.is_none() && gb_second_price.is_none() {
        debug!(%architecture, "Lambda rates not found");
        return Ok(CostEstimate::zero(format!(
            "Lambda pricing ({architecture}) not found in pricing data"
        )));
    }

    let gb_seconds = (memory_mb.value / 1024.0) * (duration_ms.value / 1000.0) * requests.value;

    let mut missing = Vec::new();
    let request_cost = match request_price {
        Some(price) => requests.value * price,
        None => {
            debug!("Lambda request price not found");
            missing.push("requests");
            0.0
        }
    };
    let compute_cost = match gb_second_price {
        Some(price) => gb_seconds * price,
        None => {
            debug!(%architecture, "Lambda GB-second price not found");
            missing.push("GB-seconds");
            0.0
        }
    };

    let mut parts = vec![
        format!("Architecture: {architecture}"),
        format!(
            "{} requests x {}/request",
            requests.value,
            usd(request_price.unwrap_or(0.0))
        ),
        format!(
            "{gb_seconds} GB-seconds ({} MB, {} ms avg) x {}/GB-second",
            memory_mb.value,
            duration_ms.value,
            usd(gb_second_price.unwrap_or(0.0))
        ),
    ];
    if requests.assumed {
        parts.push("no requests_per_month tag, assuming 0 requests".to_string());
    }
    parts.extend(missing_components_note(&missing));

    Ok(CostEstimate::new(
        request_cost + compute_cost,
        gb_second_price.unwrap_or(0.0),
        format!("Lambda {}", parts.join("; ")),
    ))
}

pub fn rate_card(resource: &ResourceDescriptor, ctx: &EstimateContext<'_>) -> RateCard {
    let architecture = attributes::architecture(&resource.tags);
    let rate = ctx.pricing.lambda_gb_second_price(architecture);

    RateCard {
        billing_mode: BillingMode::PerRequest,
        rate: rate.unwrap_or(0.0),
        unit: "GB-second",
        description: format!(
            "Lambda ({architecture}), billed per request plus per GB-second of compute"
        ),
    }
}
