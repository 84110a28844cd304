//! End-to-end role resolution against fake instance sources
//!
//! Covers the behavioral contract without touching AWS: the running-only
//! invariant, "__all__" flat-host publishing, tag grouping, overwrite
//! idempotence, and argument validation ordering.

use async_trait::async_trait;
use ec2_rolemap::error::Result;
use ec2_rolemap::inventory::Inventory;
use ec2_rolemap::provider::{AddressField, Ec2Instance, InstanceSource, InstanceState};
use ec2_rolemap::resolver::{RoleQuery, update_roles};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fake source mimicking the provider-side tag filter, counting calls
struct FakeSource {
    instances: Vec<Ec2Instance>,
    calls: AtomicUsize,
}

impl FakeSource {
    fn new(instances: Vec<Ec2Instance>) -> Self {
        Self {
            instances,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstanceSource for FakeSource {
    async fn list_instances(&self, query: &RoleQuery) -> Result<Vec<Ec2Instance>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let matching = self
            .instances
            .iter()
            .filter(|i| match query {
                RoleQuery::All => true,
                RoleQuery::Tag { key, value: None } => i.tags.contains_key(key),
                RoleQuery::Tag {
                    key,
                    value: Some(v),
                } => i.tags.get(key) == Some(v),
            })
            .cloned()
            .collect();
        Ok(matching)
    }
}

/// Fake source that returns everything unfiltered, the way an
/// inconsistent provider might
struct SloppySource(Vec<Ec2Instance>);

#[async_trait]
impl InstanceSource for SloppySource {
    async fn list_instances(&self, _query: &RoleQuery) -> Result<Vec<Ec2Instance>> {
        Ok(self.0.clone())
    }
}

fn instance(id: &str, state: InstanceState, tags: &[(&str, &str)]) -> Ec2Instance {
    Ec2Instance {
        instance_id: id.to_string(),
        state,
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        public_dns_name: Some(format!("{id}.example.com")),
        private_dns_name: Some(format!("{id}.internal")),
        public_ip_address: None,
        private_ip_address: Some("10.0.0.1".to_string()),
    }
}

#[tokio::test]
async fn all_query_sets_the_flat_host_list_in_provider_order() {
    let source = FakeSource::new(vec![
        instance("i-a", InstanceState::Running, &[]),
        instance("i-b", InstanceState::Stopped, &[]),
        instance("i-c", InstanceState::Running, &[]),
    ]);
    let mut inventory = Inventory::default();
    inventory
        .roledefs
        .insert("web".to_string(), vec!["untouched.example.com".to_string()]);

    update_roles(
        &source,
        &mut inventory,
        "__all__",
        None,
        AddressField::PublicDnsName,
    )
    .await
    .unwrap();

    assert_eq!(
        inventory.hosts,
        Some(vec![
            "i-a.example.com".to_string(),
            "i-c.example.com".to_string(),
        ])
    );
    // roledefs untouched by an "__all__" run
    assert_eq!(
        inventory.roledefs["web"],
        vec!["untouched.example.com".to_string()]
    );
}

#[tokio::test]
async fn all_query_with_no_running_instances_clears_hosts() {
    let source = FakeSource::new(vec![
        instance("i-a", InstanceState::Stopped, &[]),
        instance("i-b", InstanceState::Terminated, &[]),
    ]);
    let mut inventory = Inventory::default();
    inventory.hosts = Some(vec!["stale.example.com".to_string()]);

    update_roles(
        &source,
        &mut inventory,
        "__all__",
        None,
        AddressField::PublicDnsName,
    )
    .await
    .unwrap();

    assert_eq!(inventory.hosts, None);
}

#[tokio::test]
async fn non_running_instances_never_appear() {
    let source = FakeSource::new(vec![
        instance("i-a", InstanceState::Running, &[("env", "prod")]),
        instance("i-b", InstanceState::Pending, &[("env", "prod")]),
        instance("i-c", InstanceState::Stopping, &[("env", "staging")]),
        instance("i-d", InstanceState::ShuttingDown, &[("env", "prod")]),
        instance("i-e", InstanceState::Unknown, &[("env", "prod")]),
    ]);
    let mut inventory = Inventory::default();

    update_roles(
        &source,
        &mut inventory,
        "env",
        None,
        AddressField::PublicDnsName,
    )
    .await
    .unwrap();

    let addresses: Vec<&String> = inventory.roledefs.values().flatten().collect();
    assert_eq!(addresses, [&"i-a.example.com".to_string()]);
}

#[tokio::test]
async fn bare_tag_groups_by_tag_value() {
    let source = FakeSource::new(vec![
        instance("i-a", InstanceState::Running, &[("env", "prod")]),
        instance("i-b", InstanceState::Running, &[("env", "staging")]),
        instance("i-c", InstanceState::Running, &[("env", "prod")]),
        instance("i-d", InstanceState::Running, &[]), // untagged, filtered out
    ]);
    let mut inventory = Inventory::default();

    update_roles(
        &source,
        &mut inventory,
        "env",
        None,
        AddressField::PublicDnsName,
    )
    .await
    .unwrap();

    assert_eq!(inventory.roledefs.len(), 2);
    assert_eq!(
        inventory.roledefs["prod"],
        vec!["i-a.example.com".to_string(), "i-c.example.com".to_string()]
    );
    assert_eq!(
        inventory.roledefs["staging"],
        vec!["i-b.example.com".to_string()]
    );
    assert!(inventory.hosts.is_none());
}

#[tokio::test]
async fn tag_with_value_selects_exact_matches_only() {
    let source = FakeSource::new(vec![
        instance("i-a", InstanceState::Running, &[("env", "prod")]),
        instance("i-b", InstanceState::Running, &[("env", "staging")]),
    ]);
    let mut inventory = Inventory::default();

    update_roles(
        &source,
        &mut inventory,
        "env",
        Some("prod"),
        AddressField::PublicDnsName,
    )
    .await
    .unwrap();

    assert_eq!(inventory.roledefs.len(), 1);
    assert_eq!(
        inventory.roledefs["prod"],
        vec!["i-a.example.com".to_string()]
    );
}

#[tokio::test]
async fn running_it_twice_does_not_duplicate_addresses() {
    let source = FakeSource::new(vec![
        instance("i-a", InstanceState::Running, &[("env", "prod")]),
        instance("i-b", InstanceState::Running, &[("env", "prod")]),
    ]);
    let mut inventory = Inventory::default();

    for _ in 0..2 {
        update_roles(
            &source,
            &mut inventory,
            "env",
            None,
            AddressField::PublicDnsName,
        )
        .await
        .unwrap();
    }

    assert_eq!(
        inventory.roledefs["prod"],
        vec!["i-a.example.com".to_string(), "i-b.example.com".to_string()]
    );
}

#[tokio::test]
async fn empty_tag_fails_before_any_provider_call() {
    let source = FakeSource::new(vec![instance("i-a", InstanceState::Running, &[])]);
    let mut inventory = Inventory::default();

    let err = update_roles(
        &source,
        &mut inventory,
        "",
        None,
        AddressField::PublicDnsName,
    )
    .await
    .unwrap_err();

    assert!(err.is_invalid_argument(), "got: {err}");
    assert_eq!(source.calls(), 0);
    assert!(inventory.roledefs.is_empty());
    assert!(inventory.hosts.is_none());
}

#[tokio::test]
async fn provider_returning_an_untagged_instance_is_an_error() {
    let source = SloppySource(vec![
        instance("i-a", InstanceState::Running, &[("env", "prod")]),
        instance("i-b", InstanceState::Running, &[("team", "core")]),
    ]);
    let mut inventory = Inventory::default();

    let err = update_roles(
        &source,
        &mut inventory,
        "env",
        None,
        AddressField::PublicDnsName,
    )
    .await
    .unwrap_err();

    assert!(err.is_missing_tag(), "got: {err}");
    // Nothing is published on failure
    assert!(inventory.roledefs.is_empty());
}

#[tokio::test]
async fn selected_address_field_is_honored() {
    let source = FakeSource::new(vec![instance(
        "i-a",
        InstanceState::Running,
        &[("env", "prod")],
    )]);
    let mut inventory = Inventory::default();

    update_roles(
        &source,
        &mut inventory,
        "env",
        None,
        AddressField::PrivateDnsName,
    )
    .await
    .unwrap();

    assert_eq!(inventory.roledefs["prod"], vec!["i-a.internal".to_string()]);
}
