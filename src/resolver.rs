//! Tag-to-role resolution
//!
//! Queries an [`InstanceSource`] for instances matching a tag filter and
//! folds the running ones into a role → address mapping, published into
//! an [`Inventory`].

use crate::error::{Error, Result};
use crate::inventory::{Inventory, RoleMapping};
use crate::provider::{AddressField, Ec2Instance, InstanceSource};
use tracing::{debug, info, warn};

/// Reserved tag key matching every instance regardless of tags
pub const ALL_INSTANCES: &str = "__all__";

/// Parsed instance selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleQuery {
    /// Match every instance; results land in the flat host list
    All,
    /// Match instances carrying `key`, optionally with an exact value
    Tag {
        key: String,
        value: Option<String>,
    },
}

impl RoleQuery {
    /// Parse a tag key and optional value.
    ///
    /// An empty tag key is rejected before any provider call is made. The
    /// value is ignored for the "__all__" sentinel.
    pub fn parse(tag: &str, tag_value: Option<&str>) -> Result<Self> {
        if tag.is_empty() {
            return Err(Error::InvalidArgument("tag must be set".to_string()));
        }
        if tag == ALL_INSTANCES {
            return Ok(RoleQuery::All);
        }
        Ok(RoleQuery::Tag {
            key: tag.to_string(),
            value: tag_value.map(str::to_string),
        })
    }
}

/// Fold instances into a role → addresses mapping.
///
/// Instances that are not running are dropped. The role name is the
/// literal "__all__" for [`RoleQuery::All`], otherwise the value of the
/// grouping tag on each instance; a matching instance without that tag is
/// an error. Address order within a role follows input order.
pub fn group_roles(
    instances: &[Ec2Instance],
    query: &RoleQuery,
    field: AddressField,
) -> Result<RoleMapping> {
    let mut roles = RoleMapping::new();

    for instance in instances {
        if !instance.state.is_running() {
            debug!(
                instance_id = %instance.instance_id,
                state = ?instance.state,
                "Skipping instance that is not running"
            );
            continue;
        }

        let role_name = match query {
            RoleQuery::All => ALL_INSTANCES.to_string(),
            RoleQuery::Tag { key, .. } => {
                instance
                    .tags
                    .get(key)
                    .cloned()
                    .ok_or_else(|| Error::MissingTag {
                        instance_id: instance.instance_id.clone(),
                        tag: key.clone(),
                    })?
            }
        };

        let Some(address) = instance.address(field) else {
            warn!(
                instance_id = %instance.instance_id,
                field = %field,
                "Running instance has no value for the requested address field, skipping"
            );
            continue;
        };

        roles.entry(role_name).or_default().push(address.to_string());
    }

    Ok(roles)
}

/// Publish a role mapping into the inventory.
///
/// "__all__" queries replace the flat host list (cleared when nothing
/// matched); tag queries overwrite same-named entries in `roledefs`
/// without unioning previously recorded addresses.
pub fn publish_roles(inventory: &mut Inventory, query: &RoleQuery, mut roles: RoleMapping) {
    match query {
        RoleQuery::All => {
            inventory.hosts = roles.remove(ALL_INSTANCES);
        }
        RoleQuery::Tag { .. } => {
            inventory.roledefs.extend(roles);
        }
    }
}

/// Resolve roles from the provider and merge them into the inventory.
///
/// Single request/response cycle: the whole instance list is fetched and
/// processed, or the call fails. No retries.
pub async fn update_roles<S>(
    source: &S,
    inventory: &mut Inventory,
    tag: &str,
    tag_value: Option<&str>,
    field: AddressField,
) -> Result<()>
where
    S: InstanceSource + ?Sized,
{
    let query = RoleQuery::parse(tag, tag_value)?;

    let instances = source.list_instances(&query).await?;
    debug!(count = instances.len(), "Provider returned instances");

    let roles = group_roles(&instances, &query, field)?;
    info!(roles = roles.len(), query = ?query, "Resolved role mapping");

    publish_roles(inventory, &query, roles);
    Ok(())
}
