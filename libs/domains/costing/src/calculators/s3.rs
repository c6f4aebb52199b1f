use tracing::debug;

use super::{EstimateContext, RateCard, usd};
use crate::attributes;
use crate::error::CostResult;
use crate::models::{BillingMode, CostEstimate, ResourceDescriptor};

pub const DEFAULT_STORAGE_CLASS: &str = "STANDARD";

fn storage_class(resource: &ResourceDescriptor) -> String {
    let sku = resource.sku.trim();
    if sku.is_empty() {
        DEFAULT_STORAGE_CLASS.to_string()
    } else {
        sku.to_ascii_uppercase()
    }
}

pub fn estimate(
    resource: &ResourceDescriptor,
    ctx: &EstimateContext<'_>,
) -> CostResult<CostEstimate> {
    let class = storage_class(resource);
    let size = attributes::numeric(&resource.tags, &["size_gb"], 0.0, ctx.numeric_policy)?;

    let Some(rate) = ctx.pricing.s3_gb_month(&class) else {
        debug!(storage_class = %class, "S3 rate not found");
        return Ok(CostEstimate::zero(format!(
            "S3 storage class '{class}' not found in pricing data"
        )));
    };

    let mut detail = format!("S3 {class}: {} GB x {}/GB-month", size.value, usd(rate));
    if size.assumed {
        detail.push_str(" (no size_gb tag; bucket size unknown, assuming 0 GB)");
    }

    Ok(CostEstimate::new(rate * size.value, rate, detail))
}

pub fn rate_card(resource: &ResourceDescriptor, ctx: &EstimateContext<'_>) -> RateCard {
    let class = storage_class(resource);
    let rate = ctx.pricing.s3_gb_month(&class);

    RateCard {
        billing_mode: BillingMode::PerGbMonth,
        rate: rate.unwrap_or(0.0),
        unit: "GB-month",
        description: match rate {
            Some(_) => format!("S3 {class} storage, billed per stored GB-month"),
            None => format!("S3 storage class '{class}' not found in pricing data"),
        },
    }
}
