//! EC2-backed instance source
//!
//! Builds DescribeInstances tag filters from a role query, flattens
//! reservations, and maps SDK instances into domain instances.

use crate::aws::context::AwsContext;
use crate::credentials::StaticCredentials;
use crate::error::{Result, provider_error};
use crate::provider::{Ec2Instance, InstanceSource, InstanceState};
use crate::resolver::RoleQuery;
use async_trait::async_trait;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{Filter, InstanceStateName};
use std::collections::HashMap;
use tracing::debug;

/// Instance source backed by the EC2 DescribeInstances API
pub struct Ec2InstanceSource {
    client: Client,
}

impl Ec2InstanceSource {
    /// Create a new source (loads AWS config for the region)
    pub async fn new(region: &str, credentials: Option<StaticCredentials>) -> Self {
        let ctx = AwsContext::new(region, credentials).await;
        Self::from_context(&ctx)
    }

    /// Create a source from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }
}

#[async_trait]
impl InstanceSource for Ec2InstanceSource {
    async fn list_instances(&self, query: &RoleQuery) -> Result<Vec<Ec2Instance>> {
        let response = self
            .client
            .describe_instances()
            .set_filters(build_filters(query))
            .send()
            .await
            .map_err(provider_error)?;

        let instances: Vec<Ec2Instance> = response
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .filter_map(from_sdk_instance)
            .collect();

        debug!(count = instances.len(), "Described EC2 instances");
        Ok(instances)
    }
}

/// Build the DescribeInstances filter list for a query.
///
/// "__all__" sends no filter; a bare key filters on `tag-key`; a
/// key/value pair filters on `tag:{key}`.
fn build_filters(query: &RoleQuery) -> Option<Vec<Filter>> {
    match query {
        RoleQuery::All => None,
        RoleQuery::Tag { key, value: None } => {
            Some(vec![Filter::builder().name("tag-key").values(key).build()])
        }
        RoleQuery::Tag {
            key,
            value: Some(value),
        } => Some(vec![
            Filter::builder()
                .name(format!("tag:{key}"))
                .values(value)
                .build(),
        ]),
    }
}

/// Map an SDK instance into the domain type.
///
/// Records without an instance id are dropped. Address attributes the API
/// reports as empty strings are normalized to absent.
fn from_sdk_instance(instance: &aws_sdk_ec2::types::Instance) -> Option<Ec2Instance> {
    let instance_id = instance.instance_id()?.to_string();

    Some(Ec2Instance {
        instance_id,
        state: state_from_sdk(instance.state().and_then(|s| s.name())),
        tags: extract_tags(instance.tags()),
        public_dns_name: non_empty(instance.public_dns_name()),
        private_dns_name: non_empty(instance.private_dns_name()),
        public_ip_address: non_empty(instance.public_ip_address()),
        private_ip_address: non_empty(instance.private_ip_address()),
    })
}

fn state_from_sdk(name: Option<&InstanceStateName>) -> InstanceState {
    match name {
        Some(InstanceStateName::Pending) => InstanceState::Pending,
        Some(InstanceStateName::Running) => InstanceState::Running,
        Some(InstanceStateName::ShuttingDown) => InstanceState::ShuttingDown,
        Some(InstanceStateName::Terminated) => InstanceState::Terminated,
        Some(InstanceStateName::Stopping) => InstanceState::Stopping,
        Some(InstanceStateName::Stopped) => InstanceState::Stopped,
        _ => InstanceState::Unknown,
    }
}

fn extract_tags(tags: &[aws_sdk_ec2::types::Tag]) -> HashMap<String, String> {
    tags.iter()
        .filter_map(|t| match (t.key(), t.value()) {
            (Some(k), Some(v)) => Some((k.to_string(), v.to_string())),
            _ => None,
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
