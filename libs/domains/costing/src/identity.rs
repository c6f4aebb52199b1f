//! Resource type normalization.
//!
//! Accepts either a canonical short type (`ec2`, `rds`, ...) or the vendor
//! hierarchical form `provider:module/resource:Type`
//! (e.g. `aws:ec2/instance:Instance`) and resolves it to a [`ServiceId`].
//! Every function here is total: malformed or empty input is returned
//! unchanged and resolves to [`ServiceId::Unknown`].

use std::cell::OnceCell;

use crate::models::{ResourceDescriptor, ServiceId};

/// Canonical short resource types understood by the engine
const CANONICAL_TYPES: &[(&str, ServiceId)] = &[
    ("ec2", ServiceId::ComputeInstance),
    ("ebs", ServiceId::BlockVolume),
    ("rds", ServiceId::RelationalDb),
    ("eks", ServiceId::ManagedK8s),
    ("s3", ServiceId::ObjectStorage),
    ("lambda", ServiceId::Function),
    ("dynamodb", ServiceId::KvTable),
    ("elb", ServiceId::LoadBalancer),
    ("alb", ServiceId::LoadBalancer),
    ("nlb", ServiceId::LoadBalancer),
    ("natgw", ServiceId::NatGateway),
    ("cloudwatch", ServiceId::LogMetricService),
];

/// Resource types priced by no one and billed globally
const GLOBAL_UNPRICED_TYPES: &[&str] = &["iam"];

/// Module aliases. The load-balancer modules all map to one service
/// regardless of ALB/NLB flavour.
const MODULE_ALIASES: &[(&str, ServiceId)] = &[
    ("ebs", ServiceId::BlockVolume),
    ("rds", ServiceId::RelationalDb),
    ("eks", ServiceId::ManagedK8s),
    ("s3", ServiceId::ObjectStorage),
    ("lambda", ServiceId::Function),
    ("dynamodb", ServiceId::KvTable),
    ("lb", ServiceId::LoadBalancer),
    ("alb", ServiceId::LoadBalancer),
    ("elb", ServiceId::LoadBalancer),
    ("elasticloadbalancing", ServiceId::LoadBalancer),
    ("elasticloadbalancingv2", ServiceId::LoadBalancer),
    ("cloudwatch", ServiceId::LogMetricService),
];

/// Resource-level overrides inside modules that host several services
const RESOURCE_ALIASES: &[(&str, &str, ServiceId)] = &[
    ("ec2", "instance", ServiceId::ComputeInstance),
    ("ec2", "volume", ServiceId::BlockVolume),
    ("ec2", "natgateway", ServiceId::NatGateway),
];

fn canonical_service(value: &str) -> Option<ServiceId> {
    CANONICAL_TYPES
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, service)| *service)
}

/// Split `provider:module/resource:Type` into `(module, resource)`.
fn parse_vendor_type(raw: &str) -> Option<(&str, &str)> {
    let mut segments = raw.split(':');
    let (_provider, path, _type_name) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }
    let (module, resource) = path.split_once('/')?;
    if module.is_empty() || resource.is_empty() || resource.contains('/') {
        return None;
    }
    Some((module, resource))
}

fn vendor_service(module: &str, resource: &str) -> Option<ServiceId> {
    let module = module.to_ascii_lowercase();
    let resource = resource.to_ascii_lowercase();

    RESOURCE_ALIASES
        .iter()
        .find(|(m, r, _)| *m == module && *r == resource)
        .map(|(_, _, service)| *service)
        .or_else(|| {
            MODULE_ALIASES
                .iter()
                .find(|(m, _)| *m == module)
                .map(|(_, service)| *service)
        })
}

/// Normalize a raw resource type to its canonical short form.
///
/// Canonical input is returned as-is; vendor input with a known module maps
/// to the canonical type of its service; anything else comes back unchanged.
pub fn normalize_resource_type(raw: &str) -> String {
    let trimmed = raw.trim();
    let lowered = trimmed.to_ascii_lowercase();
    if canonical_service(&lowered).is_some() || GLOBAL_UNPRICED_TYPES.contains(&lowered.as_str()) {
        return lowered;
    }

    match parse_vendor_type(trimmed) {
        Some((module, resource)) => match vendor_service(module, resource) {
            Some(service) => service.canonical_type().to_string(),
            None if module.eq_ignore_ascii_case("iam") => "iam".to_string(),
            None => raw.to_string(),
        },
        None => raw.to_string(),
    }
}

/// Resolve the service for an already-normalized type
pub fn detect_service(normalized: &str) -> ServiceId {
    canonical_service(normalized).unwrap_or(ServiceId::Unknown)
}

/// Whether the resource type is billed globally and exempt from region checks
pub fn is_global_type(normalized: &str) -> bool {
    GLOBAL_UNPRICED_TYPES.contains(&normalized) || detect_service(normalized).is_global()
}

/// Result of resolving a resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub normalized_type: String,
    pub service: ServiceId,
}

/// Request-scoped view over a descriptor that resolves its identity once.
pub struct ResolvedResource<'a> {
    descriptor: &'a ResourceDescriptor,
    identity: OnceCell<Identity>,
}

impl<'a> ResolvedResource<'a> {
    pub fn new(descriptor: &'a ResourceDescriptor) -> Self {
        Self {
            descriptor,
            identity: OnceCell::new(),
        }
    }

    pub fn descriptor(&self) -> &'a ResourceDescriptor {
        self.descriptor
    }

    pub fn identity(&self) -> &Identity {
        self.identity.get_or_init(|| {
            let normalized_type = normalize_resource_type(&self.descriptor.resource_type);
            let service = detect_service(&normalized_type);
            Identity {
                normalized_type,
                service,
            }
        })
    }

    pub fn service(&self) -> ServiceId {
        self.identity().service
    }

    pub fn normalized_type(&self) -> &str {
        &self.identity().normalized_type
    }
}
