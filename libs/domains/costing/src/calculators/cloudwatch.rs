use tracing::debug;

use super::{EstimateContext, RateCard, missing_components_note, usd};
use crate::attributes::{self, NumericPolicy};
use crate::error::CostResult;
use crate::models::{BillingMode, CostEstimate, ResourceDescriptor};
use crate::tiered::calculate_tiered_cost;

/// Log ingestion and custom metrics are volume-tiered; log storage is flat.
/// Usage tags are parsed strictly.
pub fn estimate(
    resource: &ResourceDescriptor,
    ctx: &EstimateContext<'_>,
) -> CostResult<CostEstimate> {
    let tags = &resource.tags;
    let strict = NumericPolicy::Strict;
    let ingestion_gb = attributes::numeric(tags, &["log_ingestion_gb"], 0.0, strict)?;
    let storage_gb = attributes::numeric(tags, &["log_storage_gb"], 0.0, strict)?;
    let metrics = attributes::numeric(tags, &["custom_metrics"], 0.0, strict)?;

    let ingestion_tiers = ctx.pricing.log_ingestion_tiers();
    let storage_rate = ctx.pricing.log_storage_gb_month();
    let metric_tiers = ctx.pricing.custom_metric_tiers();

    if ingestion_tiers.is_empty() && storage_rate.is_none() && metric_tiers.is_empty() {
        debug!("CloudWatch rates not found");
        return Ok(CostEstimate::zero("CloudWatch pricing not found in pricing data"));
    }

    let mut missing = Vec::new();
    if ingestion_tiers.is_empty() {
        missing.push("log ingestion");
    }
    if storage_rate.is_none() {
        missing.push("log storage");
    }
    if metric_tiers.is_empty() {
        missing.push("custom metrics");
    }

    let ingestion_cost = calculate_tiered_cost(ingestion_gb.value, &ingestion_tiers);
    let storage_cost = storage_gb.value * storage_rate.unwrap_or(0.0);
    let metrics_cost = calculate_tiered_cost(metrics.value, &metric_tiers);

    let mut parts = vec![
        format!("{} GB logs ingested = {}", ingestion_gb.value, usd(ingestion_cost)),
        format!("{} GB logs stored = {}", storage_gb.value, usd(storage_cost)),
        format!("{} custom metrics = {}", metrics.value, usd(metrics_cost)),
    ];
    parts.extend(missing_components_note(&missing));

    let unit_price = ingestion_tiers.first().map_or(0.0, |tier| tier.rate);

    Ok(CostEstimate::new(
        ingestion_cost + storage_cost + metrics_cost,
        unit_price,
        format!("CloudWatch: {}", parts.join("; ")),
    ))
}

pub fn rate_card(_resource: &ResourceDescriptor, ctx: &EstimateContext<'_>) -> RateCard {
    RateCard {
        billing_mode: BillingMode::Tiered,
        rate: ctx
            .pricing
            .log_ingestion_tiers()
            .first()
            .map_or(0.0, |tier| tier.rate),
        unit: "GB ingested",
        description: "CloudWatch, tiered log ingestion and custom metrics plus flat log storage"
            .to_string(),
    }
}
