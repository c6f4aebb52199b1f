use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString};
use validator::Validate;

/// Hours in a billing month (365 * 24 / 12)
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Cloud provider enumeration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CloudProvider {
    #[default]
    Aws,
    Azure,
    Gcp,
}

/// Currency enumeration. Every estimate is produced in USD.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
}

/// Service a resource type resolves to
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ServiceId {
    ComputeInstance,
    BlockVolume,
    RelationalDb,
    ManagedK8s,
    ObjectStorage,
    Function,
    KvTable,
    LoadBalancer,
    NatGateway,
    LogMetricService,
    #[default]
    Unknown,
}

impl ServiceId {
    /// Canonical short resource type for this service
    pub fn canonical_type(&self) -> &'static str {
        match self {
            ServiceId::ComputeInstance => "ec2",
            ServiceId::BlockVolume => "ebs",
            ServiceId::RelationalDb => "rds",
            ServiceId::ManagedK8s => "eks",
            ServiceId::ObjectStorage => "s3",
            ServiceId::Function => "lambda",
            ServiceId::KvTable => "dynamodb",
            ServiceId::LoadBalancer => "elb",
            ServiceId::NatGateway => "natgw",
            ServiceId::LogMetricService => "cloudwatch",
            ServiceId::Unknown => "",
        }
    }

    /// Services billed globally rather than per region
    pub fn is_global(&self) -> bool {
        matches!(self, ServiceId::ObjectStorage)
    }
}

/// A cloud resource to be priced.
///
/// Never mutated by the engine; normalization always produces new values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ResourceDescriptor {
    #[validate(length(min = 1, message = "provider is required"))]
    pub provider: String,
    /// Raw resource type, canonical ("ec2") or vendor form ("aws:ec2/instance:Instance")
    #[validate(length(min = 1, message = "resource_type is required"))]
    pub resource_type: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Native cloud id (e.g. "i-0abc123")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ResourceDescriptor {
    pub fn new(
        resource_type: impl Into<String>,
        sku: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            provider: CloudProvider::Aws.to_string(),
            resource_type: resource_type.into(),
            sku: sku.into(),
            region: region.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn cloud_provider(&self) -> Option<CloudProvider> {
        self.provider.trim().parse().ok()
    }

    /// Id used to match results back to the caller's resource.
    /// The native id wins over the `resource_id` tag.
    pub fn correlation_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.tags.get("resource_id").map(String::as_str))
            .filter(|id| !id.is_empty())
    }

    pub fn correlation_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| self.tags.get("Name").map(String::as_str))
            .filter(|name| !name.is_empty())
    }
}

/// Additional non-monetary impact attached to an estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactMetric {
    pub kind: String,
    pub value: f64,
    pub unit: String,
}

impl ImpactMetric {
    pub fn carbon(grams_co2e: f64) -> Self {
        Self {
            kind: "carbon_footprint".to_string(),
            value: grams_co2e,
            unit: "gCO2e".to_string(),
        }
    }
}

/// Result of a cost computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub monthly_cost: f64,
    pub unit_price: f64,
    pub currency: Currency,
    /// Human-readable summary of rates and assumptions
    pub billing_detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub impact_metrics: Vec<ImpactMetric>,
}

impl CostEstimate {
    pub fn new(monthly_cost: f64, unit_price: f64, billing_detail: impl Into<String>) -> Self {
        Self {
            monthly_cost,
            unit_price,
            currency: Currency::Usd,
            billing_detail: billing_detail.into(),
            impact_metrics: Vec::new(),
        }
    }

    /// A $0 estimate carrying the reason no cost could be computed
    pub fn zero(billing_detail: impl Into<String>) -> Self {
        Self::new(0.0, 0.0, billing_detail)
    }

    pub fn with_impact(mut self, metric: ImpactMetric) -> Self {
        self.impact_metrics.push(metric);
        self
    }
}

/// How a service is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BillingMode {
    PerHour,
    PerGbMonth,
    PerRequest,
    PerCapacityUnit,
    PerGbProcessed,
    Tiered,
    Unsupported,
}

/// Billing metadata for a resource, without a computed cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSpec {
    pub provider: String,
    pub resource_type: String,
    pub sku: String,
    pub region: String,
    pub billing_mode: BillingMode,
    /// Headline rate for `unit`; zero when unknown
    pub rate_per_unit: f64,
    pub unit: String,
    pub currency: Currency,
    pub description: String,
}

/// Whether this instance can price a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportsResponse {
    pub supported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Request for historical cost over a window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActualCostRequest {
    pub resource: ResourceDescriptor,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

/// One timestamped cost figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualCostResult {
    pub timestamp: DateTime<Utc>,
    pub cost: f64,
    pub usage_amount: f64,
    pub usage_unit: String,
    /// Encodes the confidence, e.g. `aws-public-fallback[confidence:HIGH]`
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualCostResponse {
    pub results: Vec<ActualCostResult>,
}

/// Kind of recommendation; fixes the confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecommendationKind {
    GenerationUpgrade,
    GravitonMigration,
    VolumeTypeUpgrade,
}

impl RecommendationKind {
    pub fn confidence(&self) -> f64 {
        match self {
            RecommendationKind::GenerationUpgrade | RecommendationKind::VolumeTypeUpgrade => 0.9,
            RecommendationKind::GravitonMigration => 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationCategory {
    Cost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationAction {
    Modify,
}

/// Projected savings of a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationImpact {
    pub current_cost: f64,
    pub projected_cost: f64,
    pub estimated_savings: f64,
    pub savings_percentage: f64,
    pub currency: Currency,
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub category: RecommendationCategory,
    pub action: RecommendationAction,
    pub kind: RecommendationKind,
    pub resource_type: String,
    pub current_sku: String,
    pub recommended_sku: String,
    pub region: String,
    pub impact: Option<RecommendationImpact>,
    pub confidence_score: f64,
    pub reasoning: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
}

/// AND-combined filter applied before generating recommendations.
/// Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationFilter {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsRequest {
    pub resources: Vec<ResourceDescriptor>,
    #[serde(default)]
    pub filter: Option<RecommendationFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    pub total_recommendations: usize,
    pub total_estimated_savings: f64,
    pub currency: Currency,
    pub count_by_kind: HashMap<String, usize>,
    pub savings_by_kind: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
    pub summary: RecommendationSummary,
}
