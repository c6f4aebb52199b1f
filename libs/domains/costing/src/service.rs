use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use validator::Validate;

use crate::attributes::{self, AttributeLookup, NumericPolicy};
use crate::calculators::{Calculator, EstimateContext, calculator_for};
use crate::error::{CostError, CostResult};
use crate::identity::{ResolvedResource, is_global_type};
use crate::models::{
    ActualCostRequest, ActualCostResponse, ActualCostResult, BillingMode, CloudProvider,
    CostEstimate, Currency, HOURS_PER_MONTH, PricingSpec, RecommendationsRequest,
    RecommendationsResponse, ResourceDescriptor, ServiceId, SupportsResponse,
};
use crate::pricing_source::{CarbonEstimator, PricingSource};
use crate::recommendations::RecommendationGenerator;
use crate::timestamps::{ConfidenceLevel, TimestampSource, resolve_timestamps};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Attribute keys that carry the SKU in a structured attribute document
const SKU_ATTRIBUTE_KEYS: &[&str] = &[
    "sku",
    "instanceType",
    "instance_type",
    "instanceClass",
    "instance_class",
    "volumeType",
    "volume_type",
    "storageClass",
    "storage_class",
];

/// Engine settings, resolved once at startup and passed in by value
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Region this instance serves
    pub region: String,
    pub max_batch_size: usize,
    /// Reject malformed values for the otherwise lenient numeric tags
    pub strict_validation: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            strict_validation: false,
        }
    }
}

/// Cost engine for a single region.
///
/// Immutable after construction; every operation is a pure function of its
/// input and the pricing snapshot.
#[derive(Clone)]
pub struct CostService {
    pricing: Arc<dyn PricingSource>,
    carbon: Option<Arc<dyn CarbonEstimator>>,
    settings: EngineSettings,
}

impl CostService {
    pub fn new(pricing: Arc<dyn PricingSource>, settings: EngineSettings) -> Self {
        let pricing_region = pricing.region();
        if pricing_region != settings.region {
            warn!(
                configured = %settings.region,
                pricing = %pricing_region,
                "Pricing data region differs from the configured region"
            );
        }
        Self {
            pricing,
            carbon: None,
            settings,
        }
    }

    pub fn with_carbon(mut self, carbon: Arc<dyn CarbonEstimator>) -> Self {
        self.carbon = Some(carbon);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn context(&self) -> EstimateContext<'_> {
        EstimateContext {
            pricing: self.pricing.as_ref(),
            carbon: self.carbon.as_deref(),
            numeric_policy: NumericPolicy::from_strict(self.settings.strict_validation),
        }
    }

    /// Validate the descriptor and return its effective region.
    ///
    /// Global types and other providers' resources are exempt from the
    /// region check and default to the instance region when none is given.
    /// Another provider's resource is unsupported in every region, so it is
    /// reported through [`Self::calculator`] instead of a mismatch.
    fn check_resource(&self, resource: &ResolvedResource<'_>) -> CostResult<String> {
        let descriptor = resource.descriptor();
        descriptor
            .validate()
            .map_err(|e| CostError::InvalidInput(e.to_string()))?;

        let region = descriptor.region.trim();
        let foreign = descriptor.cloud_provider() != Some(CloudProvider::Aws);
        if foreign || is_global_type(resource.normalized_type()) {
            return Ok(if region.is_empty() {
                self.settings.region.clone()
            } else {
                region.to_string()
            });
        }

        if region.is_empty() {
            return Err(CostError::InvalidInput("region is required".to_string()));
        }
        if region != self.settings.region {
            return Err(CostError::RegionMismatch {
                expected: self.settings.region.clone(),
                actual: region.to_string(),
            });
        }
        Ok(region.to_string())
    }

    /// Cost model for `resource`, or the reason it has none
    fn calculator(&self, resource: &ResolvedResource<'_>) -> Result<Calculator, String> {
        let descriptor = resource.descriptor();
        if descriptor.cloud_provider() != Some(CloudProvider::Aws) {
            return Err(format!("provider '{}' is not supported", descriptor.provider));
        }
        calculator_for(resource.service()).ok_or_else(|| {
            format!(
                "resource type '{}' is not supported",
                descriptor.resource_type
            )
        })
    }

    /// Projected monthly cost at on-demand list prices
    #[instrument(
        skip(self, resource),
        fields(resource_type = %resource.resource_type, sku = %resource.sku)
    )]
    pub fn projected_cost(&self, resource: &ResourceDescriptor) -> CostResult<CostEstimate> {
        let resolved = ResolvedResource::new(resource);
        self.check_resource(&resolved)?;

        let calculator = match self.calculator(&resolved) {
            Ok(calculator) => calculator,
            Err(reason) => {
                debug!(%reason, "No cost model");
                return Ok(CostEstimate::zero(reason));
            }
        };

        let service = resolved.service();
        if matches!(service, ServiceId::ComputeInstance | ServiceId::RelationalDb)
            && resource.sku.trim().is_empty()
        {
            return Err(CostError::InvalidInput(format!(
                "sku is required for {}",
                service.canonical_type()
            )));
        }

        (calculator.estimate)(resource, &self.context())
    }

    /// Historical cost over a resolved window, prorated from the monthly estimate
    #[instrument(skip(self, request), fields(resource_type = %request.resource.resource_type))]
    pub fn actual_cost(&self, request: &ActualCostRequest) -> CostResult<ActualCostResponse> {
        let resource = &request.resource;
        let resolved = ResolvedResource::new(resource);
        self.check_resource(&resolved)?;

        let resolution =
            resolve_timestamps(request.start, request.end, &resource.tags, Utc::now())?;
        let confidence = ConfidenceLevel::derive(Some(&resolution));
        let source = format!("aws-public-fallback[confidence:{confidence}]");
        let hours = resolution.runtime_hours();

        let mut notes = Vec::new();
        if resolution.is_imported && resolution.source != TimestampSource::Explicit {
            notes.push(
                "imported resource: pulumi:created reflects the import time, not when billing began"
                    .to_string(),
            );
        }

        let cost = if resolution.is_zero_length() {
            notes.push("zero-length window".to_string());
            0.0
        } else {
            let estimate = self.projected_cost(resource)?;
            notes.push(estimate.billing_detail);
            estimate.monthly_cost * hours / HOURS_PER_MONTH
        };

        debug!(hours, cost, %confidence, source = %resolution.source, "Resolved actual cost");

        Ok(ActualCostResponse {
            results: vec![ActualCostResult {
                timestamp: resolution.start,
                cost,
                usage_amount: hours,
                usage_unit: "hours".to_string(),
                source,
                note: Some(notes.join("; ")),
            }],
        })
    }

    /// Billing metadata without computing a cost
    pub fn pricing_spec(&self, resource: &ResourceDescriptor) -> CostResult<PricingSpec> {
        let resolved = ResolvedResource::new(resource);
        let region = self.check_resource(&resolved)?;

        Ok(match self.calculator(&resolved) {
            Ok(calculator) => {
                let card = (calculator.rate_card)(resource, &self.context());
                PricingSpec {
                    provider: resource.provider.clone(),
                    resource_type: resolved.normalized_type().to_string(),
                    sku: resource.sku.clone(),
                    region,
                    billing_mode: card.billing_mode,
                    rate_per_unit: card.rate,
                    unit: card.unit.to_string(),
                    currency: Currency::Usd,
                    description: card.description,
                }
            }
            Err(reason) => PricingSpec {
                provider: resource.provider.clone(),
                resource_type: resolved.normalized_type().to_string(),
                sku: resource.sku.clone(),
                region,
                billing_mode: BillingMode::Unsupported,
                rate_per_unit: 0.0,
                unit: String::new(),
                currency: Currency::Usd,
                description: reason,
            },
        })
    }

    #[instrument(skip(self, request), fields(resources = request.resources.len()))]
    pub fn recommendations(
        &self,
        request: &RecommendationsRequest,
    ) -> CostResult<RecommendationsResponse> {
        RecommendationGenerator::new(self.pricing.as_ref(), self.settings.max_batch_size)
            .for_region(self.settings.region.clone())
            .generate(request)
    }

    /// Whether this instance can price `resource`
    pub fn supports(&self, resource: &ResourceDescriptor) -> SupportsResponse {
        let resolved = ResolvedResource::new(resource);
        let reason = match self.check_resource(&resolved) {
            Err(err) => Some(err.to_string()),
            Ok(_) => self.calculator(&resolved).err(),
        };

        SupportsResponse {
            supported: reason.is_none(),
            reason,
        }
    }

    /// Projected cost from a structured attribute document.
    ///
    /// Scalar attributes become tags; the SKU and region are taken from
    /// their usual attribute names.
    pub fn estimate_from_attributes(
        &self,
        resource_type: &str,
        document: &serde_json::Map<String, serde_json::Value>,
    ) -> CostResult<CostEstimate> {
        let tags: HashMap<String, String> = document
            .keys()
            .filter_map(|key| Some((key.clone(), document.text(key)?.into_owned())))
            .collect();

        let descriptor = ResourceDescriptor {
            provider: attributes::first_text(document, &["provider"])
                .unwrap_or_else(|| CloudProvider::Aws.to_string()),
            resource_type: resource_type.to_string(),
            sku: attributes::first_text(document, SKU_ATTRIBUTE_KEYS).unwrap_or_default(),
            region: attributes::first_text(document, &["region"])
                .unwrap_or_else(|| self.settings.region.clone()),
            tags,
            id: attributes::first_text(document, &["id", "arn"]),
            name: attributes::first_text(document, &["name"]),
        };

        self.projected_cost(&descriptor)
    }
}
