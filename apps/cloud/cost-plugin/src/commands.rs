//! Command handlers: read JSON input, call the engine, record metrics

use chrono::{DateTime, Utc};
use domain_costing::{
    ActualCostRequest, CostResult, CostService, RecommendationsRequest,
    ResourceDescriptor, normalize_resource_type,
};
use eyre::{Result, WrapErr, eyre};
use observability::{CostMetrics, EstimateTimer};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;

/// Recommendation input: a full request or a bare list of resources
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RecommendInput {
    Request(RecommendationsRequest),
    Resources(Vec<ResourceDescriptor>),
}

pub fn read_json<T: DeserializeOwned>(input: &Path) -> Result<T> {
    let raw = if input == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .wrap_err("Failed to read stdin")?;
        buffer
    } else {
        std::fs::read_to_string(input)
            .wrap_err_with(|| format!("Failed to read {}", input.display()))?
    };
    serde_json::from_str(&raw).wrap_err_with(|| format!("Invalid JSON in {}", input.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Record the outcome and turn a core error into a report carrying its structured detail
fn finish<T>(
    operation: &str,
    service: &str,
    correlation_id: Option<&str>,
    result: CostResult<T>,
) -> Result<T> {
    match result {
        Ok(value) => {
            CostMetrics::record_estimate(operation, service, "ok");
            Ok(value)
        }
        Err(err) => {
            CostMetrics::record_estimate(operation, service, "error");
            CostMetrics::record_error(operation, &err.kind().to_string());
            let detail = serde_json::to_string(&err.detail(correlation_id))?;
            Err(eyre!("{} request rejected: {detail}", err.kind()))
        }
    }
}

fn service_label(resource: &ResourceDescriptor) -> String {
    let normalized = normalize_resource_type(&resource.resource_type);
    if normalized.is_empty() { "unknown".to_string() } else { normalized }
}

pub fn projected(service: &CostService, input: &Path) -> Result<()> {
    let resource: ResourceDescriptor = read_json(input)?;
    let label = service_label(&resource);
    let _timer = EstimateTimer::new("projected", &label);

    let estimate = finish(
        "projected",
        &label,
        resource.correlation_id(),
        service.projected_cost(&resource),
    )?;
    if estimate.monthly_cost == 0.0 {
        CostMetrics::record_pricing_miss(&label);
    }
    print_json(&estimate)
}

pub fn actual(
    service: &CostService,
    input: &Path,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<()> {
    let resource: ResourceDescriptor = read_json(input)?;
    let label = service_label(&resource);
    let _timer = EstimateTimer::new("actual", &label);

    let correlation_id = resource.correlation_id().map(str::to_string);
    let request = ActualCostRequest { resource, start, end };
    let response = finish(
        "actual",
        &label,
        correlation_id.as_deref(),
        service.actual_cost(&request),
    )?;
    print_json(&response)
}

pub fn spec(service: &CostService, input: &Path) -> Result<()> {
    let resource: ResourceDescriptor = read_json(input)?;
    let label = service_label(&resource);

    let spec = finish(
        "spec",
        &label,
        resource.correlation_id(),
        service.pricing_spec(&resource),
    )?;
    print_json(&spec)
}

pub fn recommend(service: &CostService, input: &Path) -> Result<()> {
    let request = match read_json::<RecommendInput>(input)? {
        RecommendInput::Request(request) => request,
        RecommendInput::Resources(resources) => RecommendationsRequest {
            resources,
            filter: None,
        },
    };
    let _timer = EstimateTimer::new("recommend", "batch");

    let response = finish("recommend", "batch", None, service.recommendations(&request))?;
    CostMetrics::set_recommendations(
        &response.summary.count_by_kind,
        &response.summary.savings_by_kind,
    );
    print_json(&response)
}

pub fn supports(service: &CostService, input: &Path) -> Result<()> {
    let resource: ResourceDescriptor = read_json(input)?;
    print_json(&service.supports(&resource))
}

pub fn estimate(service: &CostService, resource_type: &str, input: &Path) -> Result<()> {
    let document: serde_json::Value = read_json(input)?;
    let serde_json::Value::Object(attributes) = document else {
        return Err(eyre!("{} must contain a JSON object", input.display()));
    };
    let label = normalize_resource_type(resource_type);
    let _timer = EstimateTimer::new("estimate", &label);

    let estimate = finish(
        "estimate",
        &label,
        None,
        service.estimate_from_attributes(resource_type, &attributes),
    )?;
    print_json(&estimate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_costing::{CostError, EngineSettings, PricingCatalog};
    use std::sync::Arc;

    fn write_input(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("cost-plugin-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_recommend_input_accepts_bare_list() {
        let input: RecommendInput = serde_json::from_str(
            r#"[{ "provider": "aws", "resource_type": "ec2", "sku": "t2.micro",
                  "region": "us-east-1" }]"#,
        )
        .unwrap();
        assert!(matches!(input, RecommendInput::Resources(ref r) if r.len() == 1));
    }

    #[test]
    fn test_recommend_input_accepts_full_request() {
        let input: RecommendInput = serde_json::from_str(
            r#"{
                "resources": [{ "provider": "aws", "resource_type": "ebs", "sku": "gp2" }],
                "filter": { "region": "us-east-1" }
            }"#,
        )
        .unwrap();
        let RecommendInput::Request(request) = input else {
            panic!("expected a full request");
        };
        assert_eq!(request.resources[0].sku, "gp2");
        assert_eq!(
            request.filter.and_then(|f| f.region).as_deref(),
            Some("us-east-1")
        );
    }

    #[test]
    fn test_finish_reports_structured_detail() {
        let err = CostError::RegionMismatch {
            expected: "us-east-1".to_string(),
            actual: "eu-west-1".to_string(),
        };

        let report = finish::<()>("projected", "rds", Some("db-1"), Err(err)).unwrap_err();
        let message = report.to_string();
        assert!(message.starts_with("REGION_MISMATCH request rejected"), "{message}");
        assert!(message.contains(r#""kind":"REGION_MISMATCH""#), "{message}");
        assert!(message.contains(r#""correlation_id":"db-1""#), "{message}");
    }

    #[test]
    fn test_finish_passes_values_through() {
        assert_eq!(finish("spec", "ec2", None, Ok(7)).unwrap(), 7);
    }

    #[test]
    fn test_read_json_from_file() {
        let path = write_input(
            "resource.json",
            r#"{ "provider": "aws", "resource_type": "ec2", "sku": "t3.micro",
                 "region": "us-east-1" }"#,
        );
        let resource: ResourceDescriptor = read_json(&path).unwrap();
        assert_eq!(resource.sku, "t3.micro");

        std::fs::write(&path, "not json").unwrap();
        let err = read_json::<ResourceDescriptor>(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_projected_command_rejects_region_mismatch() {
        let catalog = PricingCatalog::bundled().unwrap();
        let service = CostService::new(Arc::new(catalog), EngineSettings::default());
        let path = write_input(
            "mismatch.json",
            r#"{ "provider": "aws", "resource_type": "rds", "sku": "db.t3.micro",
                 "region": "ap-south-1", "id": "db-1" }"#,
        );

        let err = projected(&service, &path).unwrap_err();
        assert!(err.to_string().contains(r#""correlation_id":"db-1""#));
        std::fs::remove_file(&path).unwrap();
    }
}
