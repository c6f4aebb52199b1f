//! Per-service cost calculators.
//!
//! Each service module exposes `estimate` and `pricing_spec` with the same
//! signatures; [`calculator_for`] is the dispatch table from [`ServiceId`]
//! to those functions. A missing rate always yields a $0 estimate with an
//! explanation. Only malformed caller-supplied numbers produce an error.

pub mod cloudwatch;
pub mod dynamodb;
pub mod ebs;
pub mod ec2;
pub mod eks;
pub mod elb;
pub mod lambda;
pub mod natgw;
pub mod rds;
pub mod s3;

use crate::attributes::NumericPolicy;
use crate::error::CostResult;
use crate::models::{BillingMode, CostEstimate, ResourceDescriptor, ServiceId};
use crate::pricing_source::{CarbonEstimator, PricingSource};

/// Read-only collaborators shared by every calculator call
#[derive(Clone, Copy)]
pub struct EstimateContext<'a> {
    pub pricing: &'a dyn PricingSource,
    pub carbon: Option<&'a dyn CarbonEstimator>,
    /// Policy for the leniently parsed numeric tags
    pub numeric_policy: NumericPolicy,
}

impl<'a> EstimateContext<'a> {
    pub fn new(pricing: &'a dyn PricingSource) -> Self {
        Self {
            pricing,
            carbon: None,
            numeric_policy: NumericPolicy::Lenient,
        }
    }
}

/// Headline billing metadata produced by a calculator
#[derive(Debug, Clone, PartialEq)]
pub struct RateCard {
    pub billing_mode: BillingMode,
    pub rate: f64,
    pub unit: &'static str,
    pub description: String,
}

pub type EstimateFn = fn(&ResourceDescriptor, &EstimateContext<'_>) -> CostResult<CostEstimate>;
pub type RateCardFn = fn(&ResourceDescriptor, &EstimateContext<'_>) -> RateCard;

/// Calculator entry for one service
#[derive(Clone, Copy)]
pub struct Calculator {
    pub estimate: EstimateFn,
    pub rate_card: RateCardFn,
}

/// Dispatch table. `None` only for [`ServiceId::Unknown`].
pub fn calculator_for(service: ServiceId) -> Option<Calculator> {
    let (estimate, rate_card): (EstimateFn, RateCardFn) = match service {
        ServiceId::ComputeInstance => (ec2::estimate, ec2::rate_card),
        ServiceId::BlockVolume => (ebs::estimate, ebs::rate_card),
        ServiceId::RelationalDb => (rds::estimate, rds::rate_card),
        ServiceId::ManagedK8s => (eks::estimate, eks::rate_card),
        ServiceId::ObjectStorage => (s3::estimate, s3::rate_card),
        ServiceId::Function => (lambda::estimate, lambda::rate_card),
        ServiceId::KvTable => (dynamodb::estimate, dynamodb::rate_card),
        ServiceId::LoadBalancer => (elb::estimate, elb::rate_card),
        ServiceId::NatGateway => (natgw::estimate, natgw::rate_card),
        ServiceId::LogMetricService => (cloudwatch::estimate, cloudwatch::rate_card),
        ServiceId::Unknown => return None,
    };
    Some(Calculator {
        estimate,
        rate_card,
    })
}

/// Format a USD rate without losing small fractions
pub(crate) fn usd(value: f64) -> String {
    let formatted = format!("{value:.10}");
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');
    format!("${whole}.{fraction:0<2}")
}

/// "unavailable pricing: a, b" suffix for partially priced estimates
pub(crate) fn missing_components_note(missing: &[&str]) -> Option<String> {
    if missing.is_empty() {
        None
    } else {
        Some(format!("unavailable pricing: {}", missing.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_known_service_has_a_calculator() {
        for service in ServiceId::iter() {
            assert_eq!(
                calculator_for(service).is_some(),
                service != ServiceId::Unknown,
                "{service}"
            );
        }
    }

    #[test]
    fn test_usd_formatting() {
        assert_eq!(usd(0.0104), "$0.0104");
        assert_eq!(usd(7.592), "$7.592");
        assert_eq!(usd(8.0), "$8.00");
        assert_eq!(usd(0.5), "$0.50");
        assert_eq!(usd(0.0000166667), "$0.0000166667");
    }

    #[test]
    fn test_missing_components_note() {
        assert_eq!(missing_components_note(&[]), None);
        assert_eq!(
            missing_components_note(&["WCU", "storage"]).as_deref(),
            Some("unavailable pricing: WCU, storage")
        );
    }
}
