use tracing::warn;

use super::{EstimateContext, RateCard, missing_components_note, usd};
use crate::attributes::{self, CapacityMode};
use crate::error::CostResult;
use crate::models::{BillingMode, CostEstimate, HOURS_PER_MONTH, ResourceDescriptor};

/// Usage-rate pair; a missing rate is recorded by name and charged as zero
struct Component {
    name: &'static str,
    quantity: f64,
    rate: Option<f64>,
    multiplier: f64,
}

impl Component {
    fn cost(&self) -> f64 {
        self.rate.map_or(0.0, |rate| self.quantity * rate * self.multiplier)
    }
}

fn components(
    resource: &ResourceDescriptor,
    ctx: &EstimateContext<'_>,
    mode: CapacityMode,
) -> CostResult<Vec<Component>> {
    let tags = &resource.tags;
    let policy = ctx.numeric_policy;
    let pricing = ctx.pricing;
    let storage = attributes::numeric(tags, &["storage_gb"], 0.0, policy)?;
    let quantity = |keys: &[&str]| -> CostResult<f64> {
        Ok(attributes::numeric(tags, keys, 0.0, policy)?.value)
    };

    let mut components = match mode {
        CapacityMode::OnDemand => vec![
            Component {
                name: "read requests",
                quantity: quantity(&["read_requests_per_month"])?,
                rate: pricing.dynamodb_read_request_price(),
                multiplier: 1.0,
            },
            Component {
                name: "write requests",
                quantity: quantity(&["write_requests_per_month"])?,
                rate: pricing.dynamodb_write_request_price(),
                multiplier: 1.0,
            },
        ],
        CapacityMode::Provisioned => vec![
            Component {
                name: "RCU",
                quantity: quantity(&["read_capacity_units", "readCapacity"])?,
                rate: pricing.dynamodb_rcu_hourly(),
                multiplier: HOURS_PER_MONTH,
            },
            Component {
                name: "WCU",
                quantity: quantity(&["write_capacity_units", "writeCapacity"])?,
                rate: pricing.dynamodb_wcu_hourly(),
                multiplier: HOURS_PER_MONTH,
            },
        ],
    };

    components.push(Component {
        name: "storage",
        quantity: storage.value,
        rate: pricing.dynamodb_storage_gb_month(),
        multiplier: 1.0,
    });

    Ok(components)
}

pub fn estimate(
    resource: &ResourceDescriptor,
    ctx: &EstimateContext<'_>,
) -> CostResult<CostEstimate> {
    let mode = attributes::capacity_mode(&resource.tags, &resource.sku);
    let components = components(resource, ctx, mode)?;

    let mut missing = Vec::new();
    let mut parts = vec![format!("mode: {mode}")];
    for component in &components {
        match component.rate {
            Some(rate) => parts.push(format!(
                "{} {} x {}",
                component.quantity,
                component.name,
                usd(rate)
            )),
            None => {
                warn!(component = component.name, %mode, "DynamoDB pricing component unavailable");
                missing.push(component.name);
            }
        }
    }

    if missing.len() == components.len() {
        return Ok(CostEstimate::zero(format!(
            "DynamoDB {mode} pricing not found in pricing data ({})",
            missing.join(", ")
        )));
    }
    parts.extend(missing_components_note(&missing));

    let monthly: f64 = components.iter().map(Component::cost).sum();
    let unit_price = components.first().and_then(|c| c.rate).unwrap_or(0.0);

    Ok(CostEstimate::new(
        monthly,
        unit_price,
        format!("DynamoDB {}", parts.join("; ")),
    ))
}

pub fn rate_card(resource: &ResourceDescriptor, ctx: &EstimateContext<'_>) -> RateCard {
    match attributes::capacity_mode(&resource.tags, &resource.sku) {
        CapacityMode::OnDemand => RateCard {
            billing_mode: BillingMode::PerRequest,
            rate: ctx.pricing.dynamodb_read_request_price().unwrap_or(0.0),
            unit: "read request unit",
            description: "DynamoDB on-demand, billed per read/write request unit plus storage"
                .to_string(),
        },
        CapacityMode::Provisioned => RateCard {
            billing_mode: BillingMode::PerCapacityUnit,
            rate: ctx.pricing.dynamodb_rcu_hourly().unwrap_or(0.0),
            unit: "RCU-hour",
            description: "DynamoDB provisioned, billed per RCU/WCU-hour plus storage".to_string(),
        },
    }
}
