//! Typed, defaulted attribute extraction.
//!
//! Attributes are read either from a flat tag map or from a structured JSON
//! attribute document; both go through [`AttributeLookup`] so the two entry
//! points share one set of normalization tables and defaults. Extraction
//! never fails a request unless the caller asked for [`NumericPolicy::Strict`].

use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use strum::{Display, EnumString};
use tracing::warn;

use crate::error::{CostError, CostResult};

/// Read access to raw attribute values
pub trait AttributeLookup {
    /// Raw textual value for `key`, if present
    fn text(&self, key: &str) -> Option<Cow<'_, str>>;
}

impl AttributeLookup for HashMap<String, String> {
    fn text(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl AttributeLookup for serde_json::Map<String, Value> {
    fn text(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.get(key)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }
}

/// A value plus whether it came from a default rather than the input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extracted<T> {
    pub value: T,
    pub assumed: bool,
}

impl<T> Extracted<T> {
    fn given(value: T) -> Self {
        Self {
            value,
            assumed: false,
        }
    }

    fn assumed(value: T) -> Self {
        Self {
            value,
            assumed: true,
        }
    }
}

/// How malformed numeric values are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericPolicy {
    /// Log and fall back to the default
    Lenient,
    /// Reject the request
    Strict,
}

impl NumericPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            NumericPolicy::Strict
        } else {
            NumericPolicy::Lenient
        }
    }
}

/// First non-empty, trimmed value among `keys`
pub fn first_text(attrs: &dyn AttributeLookup, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| attrs.text(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Parse a non-negative number from the first key holding a valid value.
///
/// Absent, empty or (when lenient) malformed → next key, then the default
/// (assumed). Zero is a real value.
pub fn numeric(
    attrs: &dyn AttributeLookup,
    keys: &[&str],
    default: f64,
    policy: NumericPolicy,
) -> CostResult<Extracted<f64>> {
    for key in keys {
        let Some(raw) = attrs.text(key) else {
            continue;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => return Ok(Extracted::given(value)),
            _ => match policy {
                NumericPolicy::Strict => {
                    return Err(CostError::InvalidNumericTag {
                        key: key.to_string(),
                        value: trimmed.to_string(),
                    });
                }
                NumericPolicy::Lenient => {
                    warn!(
                        key = *key,
                        value = trimmed,
                        default,
                        "Ignoring invalid numeric attribute"
                    );
                }
            },
        }
    }

    Ok(Extracted::assumed(default))
}

/// Operating system used for compute pricing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Default)]
pub enum Platform {
    #[default]
    Linux,
    Windows,
    #[strum(serialize = "RHEL")]
    Rhel,
    #[strum(serialize = "SUSE")]
    Suse,
}

impl Platform {
    fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "linux" | "linux/unix" | "unix" | "amazon linux" => Some(Platform::Linux),
            "windows" | "windows server" => Some(Platform::Windows),
            "rhel" | "redhat" | "red hat enterprise linux" => Some(Platform::Rhel),
            "suse" | "sles" | "suse linux" => Some(Platform::Suse),
            _ => None,
        }
    }
}

/// Instance tenancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Default)]
pub enum Tenancy {
    #[default]
    Shared,
    Dedicated,
    Host,
}

impl Tenancy {
    fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "shared" | "default" => Some(Tenancy::Shared),
            "dedicated" => Some(Tenancy::Dedicated),
            "host" => Some(Tenancy::Host),
            _ => None,
        }
    }
}

/// CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Default)]
pub enum Architecture {
    #[default]
    #[strum(serialize = "x86_64")]
    X86_64,
    #[strum(serialize = "arm64")]
    Arm64,
}

impl Architecture {
    fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "x86-64" | "x86" | "amd64" => Some(Architecture::X86_64),
            "arm64" | "arm" | "aarch64" | "graviton" => Some(Architecture::Arm64),
            _ => None,
        }
    }
}

/// Relational database engine, canonical form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Default)]
#[strum(serialize_all = "kebab-case")]
pub enum DbEngine {
    #[default]
    Mysql,
    Postgres,
    Mariadb,
    #[strum(serialize = "oracle-se2")]
    OracleSe2,
    #[strum(serialize = "sqlserver-ex")]
    SqlServerExpress,
    #[strum(serialize = "sqlserver-se")]
    SqlServerStandard,
    #[strum(serialize = "aurora-mysql")]
    AuroraMysql,
    #[strum(serialize = "aurora-postgresql")]
    AuroraPostgresql,
}

impl DbEngine {
    fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mysql" => Some(DbEngine::Mysql),
            "postgres" | "postgresql" | "pg" => Some(DbEngine::Postgres),
            "mariadb" | "maria" => Some(DbEngine::Mariadb),
            "oracle" | "oracle-se2" => Some(DbEngine::OracleSe2),
            "sqlserver" | "sqlserver-ex" | "mssql" => Some(DbEngine::SqlServerExpress),
            "sqlserver-se" => Some(DbEngine::SqlServerStandard),
            "aurora" | "aurora-mysql" => Some(DbEngine::AuroraMysql),
            "aurora-postgresql" | "aurora-postgres" => Some(DbEngine::AuroraPostgresql),
            _ => None,
        }
    }
}

/// Key-value table capacity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Default)]
#[strum(serialize_all = "kebab-case")]
pub enum CapacityMode {
    OnDemand,
    #[default]
    Provisioned,
}

impl CapacityMode {
    fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pay-per-request" | "on-demand" | "ondemand" => Some(CapacityMode::OnDemand),
            "provisioned" => Some(CapacityMode::Provisioned),
            _ => None,
        }
    }
}

/// Load balancer flavour; selects the rate card and capacity-unit tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Default)]
#[strum(serialize_all = "lowercase")]
pub enum LoadBalancerKind {
    #[default]
    Application,
    Network,
}

impl LoadBalancerKind {
    fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "application" | "alb" => Some(LoadBalancerKind::Application),
            "network" | "nlb" => Some(LoadBalancerKind::Network),
            _ => None,
        }
    }

    /// Type-specific capacity unit tag
    pub fn capacity_unit_tag(&self) -> &'static str {
        match self {
            LoadBalancerKind::Application => "lcu_per_hour",
            LoadBalancerKind::Network => "nlcu_per_hour",
        }
    }

    pub fn capacity_unit_name(&self) -> &'static str {
        match self {
            LoadBalancerKind::Application => "LCU",
            LoadBalancerKind::Network => "NLCU",
        }
    }
}

fn normalized<T: Default>(
    attrs: &dyn AttributeLookup,
    keys: &[&str],
    normalize: fn(&str) -> Option<T>,
) -> Extracted<T> {
    first_text(attrs, keys)
        .and_then(|raw| normalize(&raw))
        .map(Extracted::given)
        .unwrap_or_else(|| Extracted::assumed(T::default()))
}

pub fn platform(attrs: &dyn AttributeLookup) -> Platform {
    normalized(attrs, &["platform", "operatingSystem"], Platform::normalize).value
}

pub fn tenancy(attrs: &dyn AttributeLookup) -> Tenancy {
    normalized(attrs, &["tenancy"], Tenancy::normalize).value
}

pub fn architecture(attrs: &dyn AttributeLookup) -> Architecture {
    normalized(attrs, &["architecture", "arch"], Architecture::normalize).value
}

/// Database engine; unknown or missing engines fall back to the default
/// with `assumed` set so the caller can explain the substitution.
pub fn db_engine(attrs: &dyn AttributeLookup) -> Extracted<DbEngine> {
    normalized(attrs, &["engine"], DbEngine::normalize)
}

/// Capacity mode from tags, then from the SKU
pub fn capacity_mode(attrs: &dyn AttributeLookup, sku: &str) -> CapacityMode {
    first_text(attrs, &["billing_mode", "capacity_mode"])
        .and_then(|raw| CapacityMode::normalize(&raw))
        .or_else(|| CapacityMode::normalize(sku))
        .unwrap_or_default()
}

/// Load balancer kind from tags, then SKU, then the raw resource type
pub fn load_balancer_kind(
    attrs: &dyn AttributeLookup,
    sku: &str,
    resource_type: &str,
) -> LoadBalancerKind {
    first_text(attrs, &["load_balancer_type", "loadBalancerType"])
        .and_then(|raw| LoadBalancerKind::normalize(&raw))
        .or_else(|| LoadBalancerKind::normalize(sku))
        .or_else(|| LoadBalancerKind::normalize(resource_type))
        .unwrap_or_default()
}

/// Case-sensitive boolean tag check (`"true"` only)
pub fn flag(attrs: &dyn AttributeLookup, key: &str) -> bool {
    attrs.text(key).is_some_and(|v| v == "true")
}
