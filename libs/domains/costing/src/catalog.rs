//! JSON-backed [`PricingSource`] for a single region.
//!
//! The document is deserialized with serde, validated, then indexed into
//! lookup maps keyed by the same enums the calculators use.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::attributes::{Architecture, DbEngine, LoadBalancerKind, Platform, Tenancy};
use crate::error::{CostError, CostResult};
use crate::pricing_source::{PriceTier, PricingSource};

/// us-east-1 rates compiled into the binary
const BUNDLED_US_EAST_1: &str = include_str!("../data/us-east-1.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ec2Price {
    pub instance_type: String,
    #[serde(default = "default_os")]
    pub os: String,
    #[serde(default = "default_tenancy")]
    pub tenancy: String,
    pub hourly: f64,
}

fn default_os() -> String {
    Platform::Linux.to_string()
}

fn default_tenancy() -> String {
    Tenancy::Shared.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdsInstancePrice {
    pub instance_class: String,
    pub engine: String,
    pub hourly: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RdsPrices {
    #[serde(default)]
    pub instances: Vec<RdsInstancePrice>,
    /// Storage type → USD per GB-month
    #[serde(default)]
    pub storage: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EksPrices {
    pub standard_hourly: Option<f64>,
    pub extended_hourly: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LambdaPrices {
    pub request_price: Option<f64>,
    /// Architecture → USD per GB-second
    #[serde(default)]
    pub gb_second: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamoDbPrices {
    pub read_request_price: Option<f64>,
    pub write_request_price: Option<f64>,
    pub rcu_hourly: Option<f64>,
    pub wcu_hourly: Option<f64>,
    pub storage_gb_month: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoadBalancerPrices {
    pub hourly: Option<f64>,
    pub capacity_unit_hourly: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NatGatewayPrices {
    pub hourly: Option<f64>,
    #[serde(default)]
    pub data_tiers: Vec<PriceTier>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudWatchPrices {
    #[serde(default)]
    pub log_ingestion_tiers: Vec<PriceTier>,
    pub log_storage_gb_month: Option<f64>,
    #[serde(default)]
    pub custom_metric_tiers: Vec<PriceTier>,
}

/// On-disk catalog layout. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub region: String,
    #[serde(default)]
    pub ec2: Vec<Ec2Price>,
    /// Volume type → USD per GB-month
    #[serde(default)]
    pub ebs: HashMap<String, f64>,
    #[serde(default)]
    pub rds: RdsPrices,
    #[serde(default)]
    pub eks: EksPrices,
    /// Storage class → USD per GB-month
    #[serde(default)]
    pub s3: HashMap<String, f64>,
    #[serde(default)]
    pub lambda: LambdaPrices,
    #[serde(default)]
    pub dynamodb: DynamoDbPrices,
    /// `application` / `network` → rates
    #[serde(default)]
    pub load_balancer: HashMap<String, LoadBalancerPrices>,
    #[serde(default)]
    pub nat_gateway: NatGatewayPrices,
    #[serde(default)]
    pub cloudwatch: CloudWatchPrices,
}

/// Indexed, immutable rate tables for one region
#[derive(Debug, Clone)]
pub struct PricingCatalog {
    region: String,
    ec2: HashMap<(String, Platform, Tenancy), f64>,
    ebs: HashMap<String, f64>,
    rds_instances: HashMap<(String, DbEngine), f64>,
    rds_storage: HashMap<String, f64>,
    eks: EksPrices,
    s3: HashMap<String, f64>,
    lambda_request: Option<f64>,
    lambda_gb_second: HashMap<Architecture, f64>,
    dynamodb: DynamoDbPrices,
    load_balancer: HashMap<LoadBalancerKind, LoadBalancerPrices>,
    nat_gateway: NatGatewayPrices,
    cloudwatch: CloudWatchPrices,
}

fn catalog_error(message: impl std::fmt::Display) -> CostError {
    CostError::InvalidInput(format!("pricing catalog: {message}"))
}

fn parse_enum<T: FromStr>(field: &str, raw: &str) -> CostResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| catalog_error(format!("unknown {field} '{raw}'")))
}

fn check_rate(what: &str, rate: f64) -> CostResult<f64> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(rate)
    } else {
        Err(catalog_error(format!("invalid rate {rate} for {what}")))
    }
}

fn check_optional(what: &str, rate: Option<f64>) -> CostResult<()> {
    rate.map_or(Ok(()), |r| check_rate(what, r).map(|_| ()))
}

/// Upper bounds must increase and only the last tier may be unbounded
fn check_tiers(what: &str, tiers: &[PriceTier]) -> CostResult<()> {
    let mut previous = 0.0;
    for (index, tier) in tiers.iter().enumerate() {
        check_rate(what, tier.rate)?;
        match tier.upper_bound {
            Some(bound) if bound.is_finite() && bound > previous => previous = bound,
            None if index + 1 == tiers.len() => {}
            _ => return Err(catalog_error(format!("malformed tier {index} for {what}"))),
        }
    }
    Ok(())
}

fn lowercase_keys(what: &str, map: HashMap<String, f64>) -> CostResult<HashMap<String, f64>> {
    map.into_iter()
        .map(|(key, rate)| Ok((key.trim().to_ascii_lowercase(), check_rate(what, rate)?)))
        .collect()
}

impl PricingCatalog {
    pub fn from_document(document: CatalogDocument) -> CostResult<Self> {
        if document.region.trim().is_empty() {
            return Err(catalog_error("region is required"));
        }

        let mut ec2 = HashMap::with_capacity(document.ec2.len());
        for entry in document.ec2 {
            let platform: Platform = parse_enum("os", &entry.os)?;
            let tenancy: Tenancy = parse_enum("tenancy", &entry.tenancy)?;
            let rate = check_rate(&entry.instance_type, entry.hourly)?;
            ec2.insert((entry.instance_type.trim().to_string(), platform, tenancy), rate);
        }

        let mut rds_instances = HashMap::with_capacity(document.rds.instances.len());
        for entry in document.rds.instances {
            let engine: DbEngine = parse_enum("engine", &entry.engine)?;
            let rate = check_rate(&entry.instance_class, entry.hourly)?;
            rds_instances.insert((entry.instance_class.trim().to_string(), engine), rate);
        }

        let mut lambda_gb_second = HashMap::new();
        for (arch, rate) in document.lambda.gb_second {
            let arch: Architecture = parse_enum("architecture", &arch)?;
            lambda_gb_second.insert(arch, check_rate("lambda duration", rate)?);
        }
        check_optional("lambda requests", document.lambda.request_price)?;

        let mut load_balancer = HashMap::new();
        for (kind, prices) in document.load_balancer {
            let kind: LoadBalancerKind = parse_enum("load balancer", &kind)?;
            check_optional("load balancer hourly", prices.hourly)?;
            check_optional("load balancer capacity unit", prices.capacity_unit_hourly)?;
            load_balancer.insert(kind, prices);
        }

        let s3 = document
            .s3
            .into_iter()
            .map(|(class, rate)| Ok((class.trim().to_ascii_uppercase(), check_rate("s3", rate)?)))
            .collect::<CostResult<HashMap<_, _>>>()?;

        check_optional("eks standard", document.eks.standard_hourly)?;
        check_optional("eks extended", document.eks.extended_hourly)?;
        for (what, rate) in [
            ("dynamodb reads", document.dynamodb.read_request_price),
            ("dynamodb writes", document.dynamodb.write_request_price),
            ("dynamodb rcu", document.dynamodb.rcu_hourly),
            ("dynamodb wcu", document.dynamodb.wcu_hourly),
            ("dynamodb storage", document.dynamodb.storage_gb_month),
            ("nat gateway hourly", document.nat_gateway.hourly),
            ("log storage", document.cloudwatch.log_storage_gb_month),
        ] {
            check_optional(what, rate)?;
        }
        check_tiers("nat gateway data", &document.nat_gateway.data_tiers)?;
        check_tiers("log ingestion", &document.cloudwatch.log_ingestion_tiers)?;
        check_tiers("custom metrics", &document.cloudwatch.custom_metric_tiers)?;

        let catalog = Self {
            region: document.region.trim().to_string(),
            ec2,
            ebs: lowercase_keys("ebs", document.ebs)?,
            rds_instances,
            rds_storage: lowercase_keys("rds storage", document.rds.storage)?,
            eks: document.eks,
            s3,
            lambda_request: document.lambda.request_price,
            lambda_gb_second,
            dynamodb: document.dynamodb,
            load_balancer,
            nat_gateway: document.nat_gateway,
            cloudwatch: document.cloudwatch,
        };

        info!(
            region = %catalog.region,
            ec2_entries = catalog.ec2.len(),
            rds_entries = catalog.rds_instances.len(),
            "Loaded pricing catalog"
        );
        Ok(catalog)
    }

    pub fn from_json_str(json: &str) -> CostResult<Self> {
        let document: CatalogDocument = serde_json::from_str(json).map_err(catalog_error)?;
        Self::from_document(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> CostResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| catalog_error(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Public us-east-1 list prices shipped with the crate
    pub fn bundled() -> CostResult<Self> {
        Self::from_json_str(BUNDLED_US_EAST_1)
    }
}

impl PricingSource for PricingCatalog {
    fn region(&self) -> String {
        self.region.clone()
    }

    fn ec2_hourly(&self, instance_type: &str, platform: Platform, tenancy: Tenancy) -> Option<f64> {
        self.ec2
            .get(&(instance_type.trim().to_string(), platform, tenancy))
            .copied()
    }

    fn ebs_gb_month(&self, volume_type: &str) -> Option<f64> {
        self.ebs.get(&volume_type.to_ascii_lowercase()).copied()
    }

    fn rds_hourly(&self, instance_class: &str, engine: DbEngine) -> Option<f64> {
        self.rds_instances
            .get(&(instance_class.trim().to_string(), engine))
            .copied()
    }

    fn rds_storage_gb_month(&self, storage_type: &str) -> Option<f64> {
        self.rds_storage.get(&storage_type.to_ascii_lowercase()).copied()
    }

    fn eks_cluster_hourly(&self, extended_support: bool) -> Option<f64> {
        if extended_support {
            self.eks.extended_hourly
        } else {
            self.eks.standard_hourly
        }
    }

    fn s3_gb_month(&self, storage_class: &str) -> Option<f64> {
        self.s3.get(&storage_class.to_ascii_uppercase()).copied()
    }

    fn lambda_request_price(&self) -> Option<f64> {
        self.lambda_request
    }

    fn lambda_gb_second_price(&self, architecture: Architecture) -> Option<f64> {
        self.lambda_gb_second.get(&architecture).copied()
    }

    fn dynamodb_read_request_price(&self) -> Option<f64> {
        self.dynamodb.read_request_price
    }

    fn dynamodb_write_request_price(&self) -> Option<f64> {
        self.dynamodb.write_request_price
    }

    fn dynamodb_rcu_hourly(&self) -> Option<f64> {
        self.dynamodb.rcu_hourly
    }

    fn dynamodb_wcu_hourly(&self) -> Option<f64> {
        self.dynamodb.wcu_hourly
    }

    fn dynamodb_storage_gb_month(&self) -> Option<f64> {
        self.dynamodb.storage_gb_month
    }

    fn load_balancer_hourly(&self, kind: LoadBalancerKind) -> Option<f64> {
        self.load_balancer.get(&kind).and_then(|p| p.hourly)
    }

    fn load_balancer_capacity_unit_hourly(&self, kind: LoadBalancerKind) -> Option<f64> {
        self.load_balancer
            .get(&kind)
            .and_then(|p| p.capacity_unit_hourly)
    }

    fn nat_gateway_hourly(&self) -> Option<f64> {
        self.nat_gateway.hourly
    }

    fn nat_gateway_data_tiers(&self) -> Vec<PriceTier> {
        self.nat_gateway.data_tiers.clone()
    }

    fn log_ingestion_tiers(&self) -> Vec<PriceTier> {
        self.cloudwatch.log_ingestion_tiers.clone()
    }

    fn log_storage_gb_month(&self) -> Option<f64> {
        self.cloudwatch.log_storage_gb_month
    }

    fn custom_metric_tiers(&self) -> Vec<PriceTier> {
        self.cloudwatch.custom_metric_tiers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = PricingCatalog::bundled().unwrap();
        assert_eq!(catalog.region(), "us-east-1");
        assert_eq!(
            catalog.ec2_hourly("t3.micro", Platform::Linux, Tenancy::Shared),
            Some(0.0104)
        );
        assert_eq!(
            catalog.ec2_hourly("m5.large", Platform::Linux, Tenancy::Dedicated),
            Some(0.106)
        );
        assert_eq!(catalog.ebs_gb_month("GP3"), Some(0.08));
        assert_eq!(catalog.s3_gb_month("standard"), Some(0.023));
        assert_eq!(catalog.rds_hourly("db.t3.micro", DbEngine::Postgres), Some(0.018));
        assert_eq!(catalog.eks_cluster_hourly(true), Some(0.6));
        assert_eq!(catalog.lambda_gb_second_price(Architecture::Arm64), Some(0.0000133334));
        assert_eq!(
            catalog.load_balancer_capacity_unit_hourly(LoadBalancerKind::Network),
            Some(0.006)
        );
        assert_eq!(catalog.custom_metric_tiers().len(), 4);
    }

    #[test]
    fn test_unknown_combinations_are_none() {
        let catalog = PricingCatalog::bundled().unwrap();
        assert_eq!(catalog.ec2_hourly("x9.huge", Platform::Linux, Tenancy::Shared), None);
        assert_eq!(catalog.ec2_hourly("t3.micro", Platform::Suse, Tenancy::Host), None);
        assert_eq!(catalog.rds_hourly("db.t3.micro", DbEngine::OracleSe2), None);
    }

    #[test]
    fn test_sections_are_optional() {
        let catalog = PricingCatalog::from_json_str(r#"{ "region": "eu-west-1" }"#).unwrap();
        assert_eq!(catalog.region(), "eu-west-1");
        assert_eq!(catalog.nat_gateway_hourly(), None);
        assert!(catalog.log_ingestion_tiers().is_empty());
    }

    #[test]
    fn test_rejects_negative_rate() {
        let err =
            PricingCatalog::from_json_str(r#"{ "region": "us-east-1", "ebs": { "gp3": -1 } }"#)
                .unwrap_err();
        assert!(err.to_string().contains("pricing catalog"));
    }

    #[test]
    fn test_rejects_unknown_os() {
        let json = r#"{
            "region": "us-east-1",
            "ec2": [{ "instance_type": "t3.micro", "os": "Plan9", "hourly": 0.01 }]
        }"#;
        assert!(PricingCatalog::from_json_str(json).is_err());
    }

    #[test]
    fn test_rejects_unbounded_tier_before_last() {
        let json = r#"{
            "region": "us-east-1",
            "cloudwatch": {
                "custom_metric_tiers": [
                    { "upper_bound": null, "rate": 0.3 },
                    { "upper_bound": 100, "rate": 0.1 }
                ]
            }
        }"#;
        assert!(PricingCatalog::from_json_str(json).is_err());
    }

    #[test]
    fn test_missing_region_is_rejected() {
        assert!(PricingCatalog::from_json_str(r#"{ "region": " " }"#).is_err());
        assert!(PricingCatalog::from_json_str("not json").is_err());
    }
}
