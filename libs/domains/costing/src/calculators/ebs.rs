use tracing::debug;

use super::{EstimateContext, RateCard, usd};
use crate::attributes;
use crate::error::CostResult;
use crate::models::{BillingMode, CostEstimate, ResourceDescriptor};

pub const DEFAULT_VOLUME_TYPE: &str = "gp2";
pub const DEFAULT_SIZE_GB: f64 = 8.0;

/// Volume type from the SKU, lowercased
pub fn volume_type(resource: &ResourceDescriptor) -> String {
    let sku = resource.sku.trim();
    if sku.is_empty() {
        DEFAULT_VOLUME_TYPE.to_string()
    } else {
        sku.to_ascii_lowercase()
    }
}

pub fn estimate(
    resource: &ResourceDescriptor,
    ctx: &EstimateContext<'_>,
) -> CostResult<CostEstimate> {
    let volume_type = volume_type(resource);
    let size = attributes::numeric(
        &resource.tags,
        &["size", "volume_size"],
        DEFAULT_SIZE_GB,
        ctx.numeric_policy,
    )?;

    let Some(rate) = ctx.pricing.ebs_gb_month(&volume_type) else {
        debug!(volume_type = %volume_type, "EBS rate not found");
        return Ok(CostEstimate::zero(format!(
            "EBS volume type '{volume_type}' not found in pricing data"
        )));
    };

    let mut detail = format!(
        "EBS {volume_type}: {} GB x {}/GB-month",
        size.value,
        usd(rate)
    );
    if size.assumed {
        detail.push_str(&format!(" (size assumed: {DEFAULT_SIZE_GB} GB default)"));
    }

    Ok(CostEstimate::new(rate * size.value, rate, detail))
}

pub fn rate_card(resource: &ResourceDescriptor, ctx: &EstimateContext<'_>) -> RateCard {
    let volume_type = volume_type(resource);
    let rate = ctx.pricing.ebs_gb_month(&volume_type);

    RateCard {
        billing_mode: BillingMode::PerGbMonth,
        rate: rate.unwrap_or(0.0),
        unit: "GB-month",
        description: match rate {
            Some(_) => format!("EBS {volume_type} storage, billed per provisioned GB-month"),
            None => format!("EBS volume type '{volume_type}' not found in pricing data"),
        },
    }
}
