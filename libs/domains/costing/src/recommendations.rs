//! Batch cost-optimization recommendations.
//!
//! For each AWS resource that passes the request filter, service-specific
//! recommenders look up the current and candidate SKU rates and emit a
//! recommendation only when the candidate is no more expensive.

use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::attributes::{self, DbEngine, NumericPolicy, Platform};
use crate::calculators::ebs;
use crate::error::{CostError, CostResult};
use crate::identity::ResolvedResource;
use crate::models::{
    CloudProvider, Currency, HOURS_PER_MONTH, Recommendation, RecommendationAction,
    RecommendationCategory, RecommendationFilter, RecommendationImpact, RecommendationKind,
    RecommendationSummary, RecommendationsRequest, RecommendationsResponse, ResourceDescriptor,
    ServiceId,
};
use crate::pricing_source::PricingSource;

/// Previous generation → current generation, same size
const EC2_GENERATION_UPGRADES: &[(&str, &str)] = &[
    ("t2", "t3"),
    ("m4", "m5"),
    ("c4", "c5"),
    ("r4", "r5"),
    ("m5", "m6i"),
    ("c5", "c6i"),
    ("r5", "r6i"),
];

/// x86 family → Graviton family, same size
const EC2_GRAVITON_MIGRATIONS: &[(&str, &str)] = &[
    ("t3", "t4g"),
    ("m5", "m6g"),
    ("c5", "c6g"),
    ("r5", "r6g"),
    ("m6i", "m7g"),
    ("c6i", "c7g"),
    ("r6i", "r7g"),
];

const RDS_GENERATION_UPGRADES: &[(&str, &str)] = &[
    ("t2", "t3"),
    ("m4", "m5"),
    ("r4", "r5"),
    ("m5", "m6i"),
    ("r5", "r6i"),
];

const RDS_GRAVITON_MIGRATIONS: &[(&str, &str)] = &[
    ("t3", "t4g"),
    ("m5", "m6g"),
    ("r5", "r6g"),
    ("m6i", "m7g"),
    ("r6i", "r7g"),
];

const EBS_VOLUME_UPGRADES: &[(&str, &str)] = &[("gp2", "gp3")];

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| *to)
}

/// Split `family.size` into its parts
pub fn parse_instance_type(sku: &str) -> Option<(&str, &str)> {
    let (family, size) = sku.split_once('.')?;
    if family.is_empty() || size.is_empty() || size.contains('.') {
        return None;
    }
    Some((family, size))
}

/// Split `db.family.size` into its parts
pub fn parse_db_instance_class(sku: &str) -> Option<(&str, &str)> {
    parse_instance_type(sku.strip_prefix("db.")?)
}

/// Whether `resource` passes every set field of `filter`
pub fn matches_filter(resource: &ResolvedResource<'_>, filter: &RecommendationFilter) -> bool {
    let descriptor = resource.descriptor();

    let region_ok = filter
        .region
        .as_deref()
        .is_none_or(|region| region == descriptor.region);
    let type_ok = filter.resource_type.as_deref().is_none_or(|wanted| {
        crate::identity::normalize_resource_type(wanted) == resource.normalized_type()
    });
    let sku_ok = filter.sku.as_deref().is_none_or(|sku| sku == descriptor.sku);
    let tags_ok = filter
        .tags
        .iter()
        .all(|(key, value)| descriptor.tags.get(key) == Some(value));

    region_ok && type_ok && sku_ok && tags_ok
}

/// One costed SKU comparison, before correlation fields are attached
struct Candidate {
    kind: RecommendationKind,
    current_sku: String,
    recommended_sku: String,
    current_cost: f64,
    projected_cost: f64,
    reasoning: Vec<String>,
}

impl Candidate {
    fn into_recommendation(self, resource: &ResolvedResource<'_>) -> Recommendation {
        let descriptor = resource.descriptor();
        let savings = self.current_cost - self.projected_cost;
        let savings_percentage = if self.current_cost > 0.0 {
            savings / self.current_cost * 100.0
        } else {
            0.0
        };

        Recommendation {
            id: format!(
                "{}:{}:{}->{}",
                descriptor.correlation_id().unwrap_or(resource.normalized_type()),
                self.kind,
                self.current_sku,
                self.recommended_sku
            ),
            category: RecommendationCategory::Cost,
            action: RecommendationAction::Modify,
            kind: self.kind,
            resource_type: resource.normalized_type().to_string(),
            current_sku: self.current_sku,
            recommended_sku: self.recommended_sku,
            region: descriptor.region.clone(),
            impact: Some(RecommendationImpact {
                current_cost: self.current_cost,
                projected_cost: self.projected_cost,
                estimated_savings: savings,
                savings_percentage,
                currency: Currency::Usd,
                period: "monthly".to_string(),
            }),
            confidence_score: self.kind.confidence(),
            reasoning: self.reasoning,
            resource_id: None,
            resource_name: None,
        }
    }
}

/// Compare two hourly rates; `None` when either is unknown or the candidate costs more
fn compare_hourly(
    kind: RecommendationKind,
    current_sku: &str,
    candidate_sku: String,
    current: Option<f64>,
    candidate: Option<f64>,
    reasoning: Vec<String>,
) -> Option<Candidate> {
    let (current, candidate) = (current?, candidate?);
    if candidate > current {
        debug!(
            current_sku,
            candidate_sku = %candidate_sku,
            current,
            candidate,
            "Candidate costs more, skipping"
        );
        return None;
    }
    Some(Candidate {
        kind,
        current_sku: current_sku.to_string(),
        recommended_sku: candidate_sku,
        current_cost: current * HOURS_PER_MONTH,
        projected_cost: candidate * HOURS_PER_MONTH,
        reasoning,
    })
}

/// Generates recommendations against a single pricing source
pub struct RecommendationGenerator<'a> {
    pricing: &'a dyn PricingSource,
    max_batch_size: usize,
    region: Option<String>,
}

impl<'a> RecommendationGenerator<'a> {
    pub fn new(pricing: &'a dyn PricingSource, max_batch_size: usize) -> Self {
        Self {
            pricing,
            max_batch_size,
            region: None,
        }
    }

    /// Skip resources located in any other region
    pub fn for_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn generate(
        &self,
        request: &RecommendationsRequest,
    ) -> CostResult<RecommendationsResponse> {
        if request.resources.len() > self.max_batch_size {
            return Err(CostError::BatchTooLarge {
                size: request.resources.len(),
                max: self.max_batch_size,
            });
        }

        let default_filter = RecommendationFilter::default();
        let filter = request.filter.as_ref().unwrap_or(&default_filter);
        let mut recommendations = Vec::new();

        for descriptor in &request.resources {
            let resource = ResolvedResource::new(descriptor);

            if descriptor.cloud_provider() != Some(CloudProvider::Aws) {
                debug!(provider = %descriptor.provider, "Skipping non-AWS resource");
                continue;
            }
            if let Some(region) = &self.region {
                if descriptor.region != *region {
                    debug!(
                        region = %descriptor.region,
                        "Skipping resource outside the served region"
                    );
                    continue;
                }
            }
            if !matches_filter(&resource, filter) {
                continue;
            }

            let candidates = match resource.service() {
                ServiceId::ComputeInstance => self.ec2_candidates(descriptor),
                ServiceId::RelationalDb => self.rds_candidates(descriptor),
                ServiceId::BlockVolume => self.ebs_candidates(descriptor),
                _ => Vec::new(),
            };

            recommendations.extend(candidates.into_iter().map(|candidate| {
                let mut recommendation = candidate.into_recommendation(&resource);
                recommendation.resource_id = descriptor.correlation_id().map(str::to_string);
                recommendation.resource_name = descriptor.correlation_name().map(str::to_string);
                recommendation
            }));
        }

        rank(&mut recommendations);
        let summary = summarize(&recommendations);
        info!(
            resources = request.resources.len(),
            recommendations = summary.total_recommendations,
            savings = summary.total_estimated_savings,
            "Generated recommendations"
        );

        Ok(RecommendationsResponse {
            recommendations,
            summary,
        })
    }

    fn ec2_candidates(&self, resource: &ResourceDescriptor) -> Vec<Candidate> {
        let Some((family, size)) = parse_instance_type(&resource.sku) else {
            return Vec::new();
        };
        let platform = attributes::platform(&resource.tags);
        let tenancy = attributes::tenancy(&resource.tags);
        let rate = |sku: &str| self.pricing.ec2_hourly(sku, platform, tenancy);
        let current = rate(&resource.sku);

        let mut candidates = Vec::new();

        if let Some(target) = lookup(EC2_GENERATION_UPGRADES, family) {
            let candidate_sku = format!("{target}.{size}");
            candidates.extend(compare_hourly(
                RecommendationKind::GenerationUpgrade,
                &resource.sku,
                candidate_sku.clone(),
                current,
                rate(&candidate_sku),
                vec![
                    format!("{target} is the newer generation of {family}"),
                    "Newer generations offer equal or better price-performance".to_string(),
                ],
            ));
        }

        // Windows AMIs cannot run on Graviton
        if platform != Platform::Windows {
            if let Some(target) = lookup(EC2_GRAVITON_MIGRATIONS, family) {
                let candidate_sku = format!("{target}.{size}");
                candidates.extend(compare_hourly(
                    RecommendationKind::GravitonMigration,
                    &resource.sku,
                    candidate_sku.clone(),
                    current,
                    rate(&candidate_sku),
                    vec![
                        format!("{target} runs on AWS Graviton (arm64)"),
                        "Workload must support the arm64 architecture".to_string(),
                    ],
                ));
            }
        }

        candidates
    }

    fn rds_candidates(&self, resource: &ResourceDescriptor) -> Vec<Candidate> {
        let Some((family, size)) = parse_db_instance_class(&resource.sku) else {
            return Vec::new();
        };
        let engine = attributes::db_engine(&resource.tags).value;
        let rate = |sku: &str| self.pricing.rds_hourly(sku, engine);
        let current = rate(&resource.sku);

        let mut candidates = Vec::new();

        if let Some(target) = lookup(RDS_GENERATION_UPGRADES, family) {
            let candidate_sku = format!("db.{target}.{size}");
            candidates.extend(compare_hourly(
                RecommendationKind::GenerationUpgrade,
                &resource.sku,
                candidate_sku.clone(),
                current,
                rate(&candidate_sku),
                vec![format!("db.{target} is the newer generation of db.{family} for {engine}")],
            ));
        }

        let graviton_engine = !matches!(
            engine,
            DbEngine::OracleSe2 | DbEngine::SqlServerExpress | DbEngine::SqlServerStandard
        );
        if graviton_engine {
            if let Some(target) = lookup(RDS_GRAVITON_MIGRATIONS, family) {
                let candidate_sku = format!("db.{target}.{size}");
                candidates.extend(compare_hourly(
                    RecommendationKind::GravitonMigration,
                    &resource.sku,
                    candidate_sku.clone(),
                    current,
                    rate(&candidate_sku),
                    vec![format!("db.{target} runs on AWS Graviton and supports {engine}")],
                ));
            }
        }

        candidates
    }

    fn ebs_candidates(&self, resource: &ResourceDescriptor) -> Vec<Candidate> {
        let volume_type = ebs::volume_type(resource);
        let Some(target) = lookup(EBS_VOLUME_UPGRADES, &volume_type) else {
            return Vec::new();
        };

        let (Some(current), Some(candidate)) = (
            self.pricing.ebs_gb_month(&volume_type),
            self.pricing.ebs_gb_month(target),
        ) else {
            return Vec::new();
        };
        if candidate > current {
            return Vec::new();
        }

        let size = attributes::numeric(
            &resource.tags,
            &["size", "volume_size"],
            ebs::DEFAULT_SIZE_GB,
            NumericPolicy::Lenient,
        )
        .map(|s| s.value)
        .unwrap_or(ebs::DEFAULT_SIZE_GB);

        vec![Candidate {
            kind: RecommendationKind::VolumeTypeUpgrade,
            current_sku: volume_type.clone(),
            recommended_sku: target.to_string(),
            current_cost: current * size,
            projected_cost: candidate * size,
            reasoning: vec![
                format!("{target} is priced lower per GB than {volume_type}"),
                format!("{target} includes baseline IOPS and throughput independent of size"),
            ],
        }]
    }
}

/// Order by estimated savings, largest first; entries without an impact go last
pub fn rank(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| {
        let savings = |r: &Recommendation| r.impact.as_ref().map(|i| i.estimated_savings);
        match (savings(a), savings(b)) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// Aggregate savings; recommendations without an impact are skipped
pub fn summarize(recommendations: &[Recommendation]) -> RecommendationSummary {
    let mut summary = RecommendationSummary::default();
    let mut count_by_kind: HashMap<String, usize> = HashMap::new();
    let mut savings_by_kind: HashMap<String, f64> = HashMap::new();

    for recommendation in recommendations {
        let Some(impact) = &recommendation.impact else {
            warn!(id = %recommendation.id, "Recommendation has no impact, excluded from summary");
            continue;
        };
        summary.total_recommendations += 1;
        summary.total_estimated_savings += impact.estimated_savings;
        *count_by_kind.entry(recommendation.kind.to_string()).or_default() += 1;
        *savings_by_kind.entry(recommendation.kind.to_string()).or_default() +=
            impact.estimated_savings;
    }

    summary.count_by_kind = count_by_kind;
    summary.savings_by_kind = savings_by_kind;
    summary
}
