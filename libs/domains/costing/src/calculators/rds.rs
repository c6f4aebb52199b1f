use tracing::debug;

use super::{EstimateContext, RateCard, missing_components_note, usd};
use crate::attributes::{self, DbEngine};
use crate::error::CostResult;
use crate::models::{BillingMode, CostEstimate, HOURS_PER_MONTH, ResourceDescriptor};

pub const DEFAULT_STORAGE_TYPE: &str = "gp2";
pub const DEFAULT_STORAGE_GB: f64 = 20.0;

fn multi_az(resource: &ResourceDescriptor) -> bool {
    attributes::first_text(&resource.tags, &["multi_az", "multiAz"])
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

pub fn estimate(
    resource: &ResourceDescriptor,
    ctx: &EstimateContext<'_>,
) -> CostResult<CostEstimate> {
    let engine = attributes::db_engine(&resource.tags);
    let storage_type = attributes::first_text(&resource.tags, &["storage_type"])
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_STORAGE_TYPE.to_string());
    let storage = attributes::numeric(
        &resource.tags,
        &["allocated_storage", "storage_size"],
        DEFAULT_STORAGE_GB,
        ctx.numeric_policy,
    )?;
    let multiplier = if multi_az(resource) { 2.0 } else { 1.0 };

    let hourly = ctx.pricing.rds_hourly(&resource.sku, engine.value);
    let storage_rate = ctx.pricing.rds_storage_gb_month(&storage_type);

    if hourly.is_none() && storage_rate.is_none() {
        debug!(sku = %resource.sku, engine = %engine.value, "RDS rates not found");
        return Ok(CostEstimate::zero(format!(
            "RDS instance class '{}' ({}) and storage type '{storage_type}' \
             not found in pricing data",
            resource.sku, engine.value
        )));
    }

    let mut parts = Vec::new();
    let mut missing = Vec::new();

    if engine.assumed {
        let state = if attributes::first_text(&resource.tags, &["engine"]).is_some() {
            "not recognized"
        } else {
            "not specified"
        };
        parts.push(format!("engine {state}, assuming {}", DbEngine::default()));
    }

    let instance_cost = match hourly {
        Some(rate) => {
            parts.push(format!(
                "{} {}: {}/hour x {HOURS_PER_MONTH} hours",
                resource.sku,
                engine.value,
                usd(rate)
            ));
            rate * HOURS_PER_MONTH * multiplier
        }
        None => {
            debug!(sku = %resource.sku, engine = %engine.value, "RDS instance rate not found");
            missing.push("instance");
            0.0
        }
    };

    let storage_cost = match storage_rate {
        Some(rate) => {
            let mut part = format!(
                "{storage_type} storage: {} GB x {}/GB-month",
                storage.value,
                usd(rate)
            );
            if storage.assumed {
                part.push_str(" (size assumed)");
            }
            parts.push(part);
            rate * storage.value * multiplier
        }
        None => {
            debug!(storage_type = %storage_type, "RDS storage rate not found");
            missing.push("storage");
            0.0
        }
    };

    if multiplier > 1.0 {
        parts.push("Multi-AZ (x2)".to_string());
    }
    parts.extend(missing_components_note(&missing));

    Ok(CostEstimate::new(
        instance_cost + storage_cost,
        hourly.unwrap_or(0.0),
        format!("RDS {}", parts.join("; ")),
    ))
}

pub fn rate_card(resource: &ResourceDescriptor, ctx: &EstimateContext<'_>) -> RateCard {
    let engine = attributes::db_engine(&resource.tags).value;
    let rate = ctx.pricing.rds_hourly(&resource.sku, engine);

    RateCard {
        billing_mode: BillingMode::PerHour,
        rate: rate.unwrap_or(0.0),
        unit: "hour",
        description: match rate {
            Some(_) => format!(
                "RDS {} ({engine}) billed per instance-hour, storage billed per GB-month",
                resource.sku
            ),
            None => format!(
                "RDS instance class '{}' ({engine}) not found in pricing data",
                resource.sku
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing_source::MockPricingSource;

    fn pricing(storage: Option<f64>) -> MockPricingSource {
        let mut mock = MockPricingSource::new();
        mock.expect_rds_hourly().returning(|class, engine| match (class, engine) {
            ("db.t3.micro", DbEngine::Postgres) => Some(0.018),
            ("db.t3.micro", DbEngine::Mysql) => Some(0.017),
            _ => None,
        });
        mock.expect_rds_storage_gb_month()
            .returning(move |storage_type| if storage_type == "gp2" { storage } else { None });
        mock
    }

    #[test]
    fn test_instance_plus_storage() {
        let pricing = pricing(Some(0.115));
        let ctx = EstimateContext::new(&pricing);
        let resource = ResourceDescriptor::new("rds", "db.t3.micro", "us-east-1")
            .with_tag("engine", "postgresql")
            .with_tag("allocated_storage", "100");

        let estimate = estimate(&resource, &ctx).unwrap();
        let expected = 0.018 * 730.0 + 0.115 * 100.0;
        assert!((estimate.monthly_cost - expected).abs() < 1e-9);
        assert!(estimate.billing_detail.contains("postgres"));
    }

    #[test]
    fn test_unknown_engine_defaults_with_note() {
        let pricing = pricing(Some(0.115));
        let ctx = EstimateContext::new(&pricing);
        let resource = ResourceDescriptor::new("rds", "db.t3.micro", "us-east-1")
            .with_tag("engine", "cockroach");

        let estimate = estimate(&resource, &ctx).unwrap();
        let expected = 0.017 * 730.0 + 0.115 * 20.0;
        assert!((estimate.monthly_cost - expected).abs() < 1e-9);
        assert!(estimate.billing_detail.contains("engine not recognized, assuming mysql"));
    }

    #[test]
    fn test_missing_engine_is_reported_as_not_specified() {
        let pricing = pricing(Some(0.115));
        let ctx = EstimateContext::new(&pricing);
        let resource = ResourceDescriptor::new("rds", "db.t3.micro", "us-east-1");

        let estimate = estimate(&resource, &ctx).unwrap();
        assert!((estimate.monthly_cost - (0.017 * 730.0 + 0.115 * 20.0)).abs() < 1e-9);
        assert!(estimate.billing_detail.contains("engine not specified, assuming mysql"));
    }

    #[test]
    fn test_storage_missing_is_partial() {
        let pricing = pricing(None);
        let ctx = EstimateContext::new(&pricing);
        let resource = ResourceDescriptor::new("rds", "db.t3.micro", "us-east-1")
            .with_tag("engine", "postgres");

        let estimate = estimate(&resource, &ctx).unwrap();
        assert!((estimate.monthly_cost - 0.018 * 730.0).abs() < 1e-9);
        assert!(estimate.billing_detail.contains("unavailable pricing: storage"));
    }

    #[test]
    fn test_multi_az_doubles() {
        let pricing = pricing(Some(0.115));
        let ctx = EstimateContext::new(&pricing);
        let resource = ResourceDescriptor::new("rds", "db.t3.micro", "us-east-1")
            .with_tag("engine", "postgres")
            .with_tag("multi_az", "true");

        let estimate = estimate(&resource, &ctx).unwrap();
        let expected = 2.0 * (0.018 * 730.0 + 0.115 * 20.0);
        assert!((estimate.monthly_cost - expected).abs() < 1e-9);
    }

    #[test]
    fn test_nothing_found() {
        let pricing = pricing(None);
        let ctx = EstimateContext::new(&pricing);
        let resource = ResourceDescriptor::new("rds", "db.z9.huge", "us-east-1");

        let estimate = estimate(&resource, &ctx).unwrap();
        assert_eq!(estimate.monthly_cost, 0.0);
        assert!(estimate.billing_detail.contains("db.z9.huge"));
    }
}
