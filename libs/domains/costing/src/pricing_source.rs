use serde::{Deserialize, Serialize};

use crate::attributes::{Architecture, DbEngine, LoadBalancerKind, Platform, Tenancy};

/// One slice of a volume-tiered rate schedule.
///
/// `upper_bound` is cumulative; `None` means the tier is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    pub upper_bound: Option<f64>,
    pub rate: f64,
}

impl PriceTier {
    pub fn new(upper_bound: f64, rate: f64) -> Self {
        Self {
            upper_bound: Some(upper_bound),
            rate,
        }
    }

    pub fn unbounded(rate: f64) -> Self {
        Self {
            upper_bound: None,
            rate,
        }
    }
}

/// Read-only rate lookups for a single region.
///
/// Every lookup returns `None` when the combination is unknown; no method
/// can fail. Rates are USD per the unit named by the method.
#[cfg_attr(test, mockall::automock)]
pub trait PricingSource: Send + Sync {
    /// Region the rates belong to
    fn region(&self) -> String;

    fn ec2_hourly(&self, instance_type: &str, platform: Platform, tenancy: Tenancy) -> Option<f64>;

    fn ebs_gb_month(&self, volume_type: &str) -> Option<f64>;

    fn rds_hourly(&self, instance_class: &str, engine: DbEngine) -> Option<f64>;

    fn rds_storage_gb_month(&self, storage_type: &str) -> Option<f64>;

    fn eks_cluster_hourly(&self, extended_support: bool) -> Option<f64>;

    fn s3_gb_month(&self, storage_class: &str) -> Option<f64>;

    fn lambda_request_price(&self) -> Option<f64>;

    fn lambda_gb_second_price(&self, architecture: Architecture) -> Option<f64>;

    /// Per read request unit
    fn dynamodb_read_request_price(&self) -> Option<f64>;

    /// Per write request unit
    fn dynamodb_write_request_price(&self) -> Option<f64>;

    /// Per RCU-hour
    fn dynamodb_rcu_hourly(&self) -> Option<f64>;

    /// Per WCU-hour
    fn dynamodb_wcu_hourly(&self) -> Option<f64>;

    fn dynamodb_storage_gb_month(&self) -> Option<f64>;

    fn load_balancer_hourly(&self, kind: LoadBalancerKind) -> Option<f64>;

    fn load_balancer_capacity_unit_hourly(&self, kind: LoadBalancerKind) -> Option<f64>;

    fn nat_gateway_hourly(&self) -> Option<f64>;

    /// Per-GB data processing schedule; empty when unknown
    fn nat_gateway_data_tiers(&self) -> Vec<PriceTier>;

    /// Per-GB log ingestion schedule; empty when unknown
    fn log_ingestion_tiers(&self) -> Vec<PriceTier>;

    fn log_storage_gb_month(&self) -> Option<f64>;

    /// Per-metric-month schedule; empty when unknown
    fn custom_metric_tiers(&self) -> Vec<PriceTier>;
}

/// Optional carbon-footprint collaborator
pub trait CarbonEstimator: Send + Sync {
    /// Grams CO2e for running `sku` in `region` at `utilization` (0–1) for `hours`
    fn grams_co2e(&self, sku: &str, region: &str, utilization: f64, hours: f64) -> Option<f64>;
}
