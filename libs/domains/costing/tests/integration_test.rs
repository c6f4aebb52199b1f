//! Integration tests for the Costing domain
//!
//! These tests drive `CostService` end to end over the bundled us-east-1
//! pricing catalog to ensure:
//! - Projected and actual cost agree with published list prices
//! - Invalid input and region mismatches are surfaced as errors
//! - Pricing misses and partial data are absorbed into the result
//! - Recommendations never propose a more expensive SKU

use chrono::{DateTime, Duration, TimeZone, Utc};
use domain_costing::*;
use std::sync::Arc;

fn catalog() -> PricingCatalog {
    PricingCatalog::bundled().unwrap()
}

fn service() -> CostService {
    CostService::new(Arc::new(catalog()), EngineSettings::default())
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
}

fn within(actual: f64, expected: f64, relative: f64) -> bool {
    (actual - expected).abs() <= expected.abs() * relative
}

// ============================================================================
// Actual Cost Scenarios
// ============================================================================

#[test]
fn test_t3_micro_over_24_hours() {
    let request = ActualCostRequest {
        resource: ResourceDescriptor::new("aws:ec2/instance:Instance", "t3.micro", "us-east-1")
            .with_tag("platform", "linux")
            .with_tag("tenancy", "shared"),
        start: Some(start()),
        end: Some(start() + Duration::hours(24)),
    };

    let response = service().actual_cost(&request).unwrap();
    assert_eq!(response.results.len(), 1);

    let result = &response.results[0];
    assert!(within(result.cost, 0.2496, 1e-4), "cost was {}", result.cost);
    assert_eq!(result.source, "aws-public-fallback[confidence:HIGH]");
    assert_eq!(result.timestamp, start());
}

#[test]
fn test_gp3_volume_over_one_week() {
    let request = ActualCostRequest {
        resource: ResourceDescriptor::new("ebs", "gp3", "us-east-1").with_tag("size", "100"),
        start: Some(start()),
        end: Some(start() + Duration::hours(168)),
    };

    let result = &service().actual_cost(&request).unwrap().results[0];
    assert!(within(result.cost, 1.841_095_89, 1e-4), "cost was {}", result.cost);
}

#[test]
fn test_zero_duration_is_free_for_any_type() {
    let service = service();
    for resource_type in ["aws:sqs/queue:Queue", "ec2", "aws:iam/role:Role", "natgw"] {
        let request = ActualCostRequest {
            resource: ResourceDescriptor::new(resource_type, "t3.micro", "us-east-1"),
            start: Some(start()),
            end: Some(start()),
        };

        let result = &service.actual_cost(&request).unwrap().results[0];
        assert_eq!(result.cost, 0.0, "{resource_type}");
    }
}

#[test]
fn test_created_tag_window_for_imported_resource() {
    let created = (Utc::now() - Duration::hours(48)).to_rfc3339();
    let request = ActualCostRequest {
        resource: ResourceDescriptor::new("ec2", "t3.micro", "us-east-1")
            .with_tag("pulumi:created", created)
            .with_tag("pulumi:imported", "true"),
        start: None,
        end: None,
    };

    let result = &service().actual_cost(&request).unwrap().results[0];
    assert_eq!(result.source, "aws-public-fallback[confidence:MEDIUM]");
    assert!(within(result.usage_amount, 48.0, 1e-3));
}

#[test]
fn test_missing_start_is_rejected() {
    let request = ActualCostRequest {
        resource: ResourceDescriptor::new("ec2", "t3.micro", "us-east-1")
            .with_tag("pulumi:modified", "2025-01-01T00:00:00Z"),
        start: None,
        end: None,
    };

    let err = service().actual_cost(&request).unwrap_err();
    assert!(err.to_string().contains("start time required"));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// ============================================================================
// Projected Cost
// ============================================================================

#[test]
fn test_monthly_equals_rate_times_hours() {
    let service = service();
    let catalog = catalog();

    for sku in ["t3.micro", "m5.large", "c6g.large", "r5.large"] {
        let estimate = service
            .projected_cost(&ResourceDescriptor::new("ec2", sku, "us-east-1"))
            .unwrap();
        let hourly = catalog
            .ec2_hourly(sku, Default::default(), Default::default())
            .unwrap();
        assert!(within(estimate.monthly_cost, hourly * 730.0, 1e-12), "{sku}");
    }
}

#[test]
fn test_unknown_sku_names_the_sku() {
    let estimate = service()
        .projected_cost(&ResourceDescriptor::new("ec2", "z9.enormous", "us-east-1"))
        .unwrap();
    assert_eq!(estimate.monthly_cost, 0.0);
    assert!(estimate.billing_detail.contains("z9.enormous"));
}

#[test]
fn test_region_mismatch_is_distinct() {
    let err = service()
        .projected_cost(&ResourceDescriptor::new("rds", "db.t3.micro", "ap-south-1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RegionMismatch);

    let detail = err.detail(Some("db-1"));
    assert_eq!(detail.correlation_id.as_deref(), Some("db-1"));
}

#[test]
fn test_rds_multi_az_postgres() {
    let resource = ResourceDescriptor::new("rds", "db.t3.micro", "us-east-1")
        .with_tag("engine", "postgres")
        .with_tag("allocated_storage", "100")
        .with_tag("multi_az", "true");

    let estimate = service().projected_cost(&resource).unwrap();
    let expected = (0.018 * 730.0 + 100.0 * 0.115) * 2.0;
    assert!(within(estimate.monthly_cost, expected, 1e-9));
}

#[test]
fn test_cloudwatch_tiered_metrics() {
    let resource = ResourceDescriptor::new("aws:cloudwatch/logGroup:LogGroup", "", "us-east-1")
        .with_tag("custom_metrics", "50000");

    let estimate = service().projected_cost(&resource).unwrap();
    assert!(within(estimate.monthly_cost, 7000.0, 1e-9));
}

#[test]
fn test_partial_dynamodb_pricing_is_named() {
    let catalog = PricingCatalog::from_json_str(
        r#"{
            "region": "us-east-1",
            "dynamodb": { "rcu_hourly": 0.00013, "storage_gb_month": 0.25 }
        }"#,
    )
    .unwrap();
    let service = CostService::new(Arc::new(catalog), EngineSettings::default());
    let resource = ResourceDescriptor::new("dynamodb", "", "us-east-1")
        .with_tag("read_capacity_units", "10")
        .with_tag("write_capacity_units", "5");

    let estimate = service.projected_cost(&resource).unwrap();
    assert!(within(estimate.monthly_cost, 10.0 * 0.00013 * 730.0, 1e-9));
    assert!(estimate.billing_detail.contains("WCU"));
}

#[test]
fn test_load_balancer_falls_back_past_invalid_tag() {
    let resource = ResourceDescriptor::new("aws:lb/loadBalancer:LoadBalancer", "alb", "us-east-1")
        .with_tag("lcu_per_hour", "n/a")
        .with_tag("capacity_units", "10");

    let estimate = service().projected_cost(&resource).unwrap();
    assert!(within(estimate.monthly_cost, 74.825, 1e-9), "cost was {}", estimate.monthly_cost);
}

#[test]
fn test_other_provider_wins_over_region_mismatch() {
    let mut resource = ResourceDescriptor::new("ec2", "t3.micro", "eastus");
    resource.provider = "azure".to_string();

    let estimate = service().projected_cost(&resource).unwrap();
    assert_eq!(estimate.monthly_cost, 0.0);
    assert!(estimate.billing_detail.contains("azure"));

    let request = ActualCostRequest {
        resource,
        start: Some(start()),
        end: Some(start() + Duration::hours(24)),
    };
    assert_eq!(service().actual_cost(&request).unwrap().results[0].cost, 0.0);
}

#[test]
fn test_nat_gateway_rejects_malformed_data_tag() {
    let resource = ResourceDescriptor::new("natgw", "", "us-east-1")
        .with_tag("data_processed_gb", "plenty");

    let err = service().projected_cost(&resource).unwrap_err();
    assert!(matches!(err, CostError::InvalidNumericTag { .. }));
}

#[test]
fn test_pricing_spec_reports_billing_mode() {
    let service = service();

    let ec2 = service
        .pricing_spec(&ResourceDescriptor::new("ec2", "t3.micro", "us-east-1"))
        .unwrap();
    assert_eq!(ec2.billing_mode, BillingMode::PerHour);
    assert_eq!(ec2.rate_per_unit, 0.0104);

    let logs = service
        .pricing_spec(&ResourceDescriptor::new("cloudwatch", "", "us-east-1"))
        .unwrap();
    assert_eq!(logs.billing_mode, BillingMode::Tiered);
}

#[test]
fn test_normalization_is_idempotent() {
    for raw in [
        "aws:ec2/instance:Instance",
        "aws:ebs/volume:Volume",
        "aws:lb/loadBalancer:LoadBalancer",
        "aws:sqs/queue:Queue",
        "ec2",
    ] {
        let once = normalize_resource_type(raw);
        assert_eq!(normalize_resource_type(&once), once, "{raw}");
    }
}

// ============================================================================
// Recommendations
// ============================================================================

#[test]
fn test_recommendations_never_cost_more() {
    let catalog = catalog();
    let service = service();
    let resources = vec![
        ResourceDescriptor::new("ec2", "t2.micro", "us-east-1").with_id("i-1"),
        ResourceDescriptor::new("ec2", "m5.large", "us-east-1").with_id("i-2"),
        ResourceDescriptor::new("ec2", "c4.large", "us-east-1").with_id("i-3"),
        ResourceDescriptor::new("ec2", "r5.large", "us-east-1").with_id("i-4"),
        ResourceDescriptor::new("rds", "db.m5.large", "us-east-1").with_tag("engine", "mysql"),
        ResourceDescriptor::new("ebs", "gp2", "us-east-1").with_tag("size", "200"),
        ResourceDescriptor::new("s3", "STANDARD", "us-east-1"),
    ];

    let response = service
        .recommendations(&RecommendationsRequest {
            resources,
            filter: None,
        })
        .unwrap();
    assert!(!response.recommendations.is_empty());

    for rec in &response.recommendations {
        let impact = rec.impact.as_ref().unwrap();
        assert!(impact.projected_cost <= impact.current_cost, "{}", rec.id);

        if rec.resource_type == "ec2" {
            let current = catalog
                .ec2_hourly(&rec.current_sku, Default::default(), Default::default())
                .unwrap();
            let candidate = catalog
                .ec2_hourly(&rec.recommended_sku, Default::default(), Default::default())
                .unwrap();
            assert!(candidate <= current, "{}", rec.id);
        }
    }

    assert!(response
        .recommendations
        .iter()
        .any(|rec| rec.current_sku == "gp2" && rec.recommended_sku == "gp3"));
    assert_eq!(
        response.summary.total_recommendations,
        response.recommendations.len()
    );
}

#[test]
fn test_recommendations_are_ranked_by_savings() {
    let resources = vec![
        ResourceDescriptor::new("ec2", "t2.micro", "us-east-1").with_id("i-small"),
        ResourceDescriptor::new("ec2", "m5.xlarge", "us-east-1").with_id("i-large"),
    ];

    let response = service()
        .recommendations(&RecommendationsRequest {
            resources,
            filter: None,
        })
        .unwrap();

    let savings: Vec<f64> = response
        .recommendations
        .iter()
        .map(|rec| rec.impact.as_ref().unwrap().estimated_savings)
        .collect();
    assert!(savings.windows(2).all(|w| w[0] >= w[1]), "{savings:?}");
    assert_eq!(response.recommendations[0].recommended_sku, "m6g.xlarge");
    assert!(within(savings[0], (0.192 - 0.154) * 730.0, 1e-9));
}

#[test]
fn test_recommendations_batch_limit() {
    let settings = EngineSettings {
        max_batch_size: 1,
        ..Default::default()
    };
    let service = CostService::new(Arc::new(catalog()), settings);
    let resources = vec![ResourceDescriptor::new("ec2", "t2.micro", "us-east-1"); 2];

    let err = service
        .recommendations(&RecommendationsRequest {
            resources,
            filter: None,
        })
        .unwrap_err();
    assert_eq!(err, CostError::BatchTooLarge { size: 2, max: 1 });
}

#[test]
fn test_supports_and_attribute_estimate() {
    let service = service();
    assert!(service.supports(&ResourceDescriptor::new("lambda", "", "us-east-1")).supported);

    let document = serde_json::json!({
        "volumeType": "gp3",
        "size": 100,
        "region": "us-east-1"
    });
    let estimate = service
        .estimate_from_attributes("aws:ebs/volume:Volume", document.as_object().unwrap())
        .unwrap();
    assert!(within(estimate.monthly_cost, 8.0, 1e-9));
}
