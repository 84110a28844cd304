//! Domain instance types and the provider seam
//!
//! `InstanceSource` is the boundary between role resolution and the cloud
//! provider: production code uses the EC2-backed source in [`crate::aws`],
//! tests supply fakes.

use crate::error::{Error, Result};
use crate::resolver::RoleQuery;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// EC2 instance run states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    /// State name reported by the provider that we do not model
    Unknown,
}

impl InstanceState {
    /// Only running instances are eligible for role mapping
    pub fn is_running(self) -> bool {
        matches!(self, InstanceState::Running)
    }
}

/// Instance attribute used as the host address for a role.
///
/// A closed set: the selector is validated at the boundary instead of
/// letting an arbitrary string reach a dynamic field lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressField {
    #[default]
    PublicDnsName,
    PrivateDnsName,
    PublicIpAddress,
    PrivateIpAddress,
}

impl AddressField {
    /// Parse a field name, rejecting anything outside the closed set.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "public_dns_name" => Ok(AddressField::PublicDnsName),
            "private_dns_name" => Ok(AddressField::PrivateDnsName),
            "public_ip_address" => Ok(AddressField::PublicIpAddress),
            "private_ip_address" => Ok(AddressField::PrivateIpAddress),
            other => Err(Error::InvalidArgument(format!(
                "unsupported address field '{other}' (expected one of public_dns_name, \
                 private_dns_name, public_ip_address, private_ip_address)"
            ))),
        }
    }

    /// Canonical field name
    pub fn as_str(self) -> &'static str {
        match self {
            AddressField::PublicDnsName => "public_dns_name",
            AddressField::PrivateDnsName => "private_dns_name",
            AddressField::PublicIpAddress => "public_ip_address",
            AddressField::PrivateIpAddress => "private_ip_address",
        }
    }
}

impl FromStr for AddressField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AddressField::parse(s)
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An EC2 instance as seen by role resolution
#[derive(Debug, Clone)]
pub struct Ec2Instance {
    pub instance_id: String,
    pub state: InstanceState,
    pub tags: HashMap<String, String>,
    pub public_dns_name: Option<String>,
    pub private_dns_name: Option<String>,
    pub public_ip_address: Option<String>,
    pub private_ip_address: Option<String>,
}

impl Ec2Instance {
    /// Fixed accessor for the selected address attribute
    pub fn address(&self, field: AddressField) -> Option<&str> {
        let address = match field {
            AddressField::PublicDnsName => &self.public_dns_name,
            AddressField::PrivateDnsName => &self.private_dns_name,
            AddressField::PublicIpAddress => &self.public_ip_address,
            AddressField::PrivateIpAddress => &self.private_ip_address,
        };
        address.as_deref()
    }
}

/// Lists instances matching a role query.
///
/// One call per resolution: either the whole matching set is returned or
/// the call fails. Implementations do not filter by run state — the
/// grouping pass owns that invariant.
#[async_trait]
pub trait InstanceSource {
    async fn list_instances(&self, query: &RoleQuery) -> Result<Vec<Ec2Instance>>;
}
