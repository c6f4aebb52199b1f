//! Costing Domain
//!
//! Projected cost, actual cost and optimization recommendations for cloud
//! resources in a single region, computed from an immutable pricing source.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐
//! │  CostService  │  ← Validation, region checks, the four operations
//! └───────┬───────┘
//!         │
//! ┌───────▼───────┐
//! │  Calculators  │  ← Per-service cost models, dispatch by ServiceId
//! └───────┬───────┘
//!         │
//! ┌───────▼───────┐
//! │ PricingSource │  ← Rate lookups (trait + JSON catalog)
//! └───────────────┘
//! ```

pub mod attributes;
pub mod calculators;
pub mod catalog;
pub mod error;
pub mod identity;
pub mod models;
pub mod pricing_source;
pub mod recommendations;
pub mod service;
pub mod tiered;
pub mod timestamps;

// Re-export commonly used types
pub use catalog::PricingCatalog;
pub use error::{CostError, CostResult, ErrorDetail, ErrorKind};
pub use identity::{detect_service, normalize_resource_type};
pub use models::{
    ActualCostRequest, ActualCostResponse, ActualCostResult, BillingMode, CloudProvider,
    CostEstimate, Currency, ImpactMetric, PricingSpec, Recommendation, RecommendationFilter,
    RecommendationKind, RecommendationSummary, RecommendationsRequest, RecommendationsResponse,
    ResourceDescriptor, ServiceId, SupportsResponse,
};
pub use pricing_source::{CarbonEstimator, PriceTier, PricingSource};
pub use service::{CostService, EngineSettings};
pub use tiered::calculate_tiered_cost;
pub use timestamps::{ConfidenceLevel, TimestampResolution, TimestampSource, resolve_timestamps};
