//! Tests for prefix derivation, column alignment and color allocation
//! in the watch registry.

use std::collections::HashMap;

use anyhow::Result;
use lumber_core::{ContainerDescriptor, Palette, WatchRegistry};

fn descriptor(
    id: &str,
    name: &str,
    project: &str,
    service: &str,
    instance: u32,
) -> ContainerDescriptor {
    ContainerDescriptor::new(id, name, project, service, instance)
}

#[tokio::test]
async fn test_name_used_when_no_service() -> Result<()> {
    let registry = WatchRegistry::new();
    registry
        .add(descriptor("aaaa", "standalone", "", "", 3))
        .await;

    let snapshot = registry.snapshot().await;
    assert_eq!(snapshot[0].log_prefix, "standalone");
    Ok(())
}

#[tokio::test]
async fn test_id_fallback_is_exactly_eight_chars() -> Result<()> {
    let registry = WatchRegistry::new();
    registry
        .add(descriptor("0123456789abcdef", "", "", "", 1))
        .await;
    registry.add(descriptor("ab", "", "", "", 1)).await;

    let snapshot = registry.snapshot().await;
    assert_eq!(snapshot[0].log_prefix, "01234567");
    assert_eq!(snapshot[1].log_prefix, "ab      ");
    assert_eq!(registry.prefix_len().await, 8);
    Ok(())
}

#[tokio::test]
async fn test_shared_service_forces_instance_numbers() -> Result<()> {
    let registry = WatchRegistry::new();
    let a = registry.add(descriptor("aaaa", "", "proj", "web", 1)).await;
    assert_eq!(a.log_prefix, "web");

    let b = registry.add(descriptor("bbbb", "", "proj", "web", 2)).await;
    assert_eq!(b.log_prefix, "web-2");

    // the first instance gains its suffix once a sibling appears
    let snapshot = registry.snapshot().await;
    assert_eq!(snapshot[0].log_prefix, "web-1");
    assert_eq!(registry.prefix_len().await, 5);
    Ok(())
}

#[tokio::test]
async fn test_lone_first_instance_has_no_suffix() -> Result<()> {
    let registry = WatchRegistry::new();
    registry.add(descriptor("aaaa", "", "proj", "db", 1)).await;
    registry.add(descriptor("bbbb", "", "proj", "web", 1)).await;

    let snapshot = registry.snapshot().await;
    assert_eq!(snapshot[0].log_prefix, "db");
    assert_eq!(snapshot[1].log_prefix, "web");
    Ok(())
}

#[tokio::test]
async fn test_removing_longest_prefix_shrinks_column() -> Result<()> {
    let registry = WatchRegistry::new();
    registry.add(descriptor("aaaa", "", "proj", "db", 1)).await;
    registry
        .add(descriptor("bbbb", "", "proj", "long-service-name", 1))
        .await;
    assert_eq!(registry.prefix_len().await, "long-service-name".len());

    registry.remove("bbbb").await;
    assert_eq!(registry.prefix_len().await, 2);
    Ok(())
}

#[tokio::test]
async fn test_remove_of_unknown_id_is_a_noop() -> Result<()> {
    let registry = WatchRegistry::new();
    registry.add(descriptor("aaaa", "", "proj", "web", 1)).await;
    let before = registry.snapshot().await;
    let width = registry.prefix_len().await;

    assert!(registry.remove("zzzz").await.is_none());
    assert_eq!(registry.snapshot().await, before);
    assert_eq!(registry.prefix_len().await, width);
    Ok(())
}

#[tokio::test]
async fn test_prefix_realigns_while_streaming() -> Result<()> {
    let registry = WatchRegistry::new();
    registry.add(descriptor("aaaa", "", "proj", "web", 1)).await;

    let before = registry.styled_prefix("aaaa").await?;
    assert_eq!(before.text, "web:");

    registry
        .add(descriptor("bbbb", "", "proj", "web", 2))
        .await;

    // the padded prefix read per line reflects the new membership
    let after = registry.styled_prefix("aaaa").await?;
    assert_eq!(after.text, "web-1:");
    Ok(())
}

#[tokio::test]
async fn test_styled_prefix_of_unwatched_container_errors() {
    let registry = WatchRegistry::new();
    assert!(registry.styled_prefix("nope").await.is_err());
}

#[tokio::test]
async fn test_color_allocation_stays_balanced() -> Result<()> {
    let palette = Palette::new();
    let registry = WatchRegistry::new();

    // twice around the palette
    for i in 0..(palette.len() * 2) {
        registry
            .add(descriptor(&format!("id-{i}"), "", "proj", &format!("svc{i}"), 1))
            .await;
    }

    let mut usage: HashMap<String, usize> = HashMap::new();
    for container in registry.snapshot().await {
        assert!(palette.color(&container.color_name).is_some());
        *usage.entry(container.color_name).or_default() += 1;
    }

    // every color picked was a least-used one at allocation time, so
    // usage ends up exactly uniform
    assert_eq!(usage.len(), palette.len());
    assert!(usage.values().all(|&count| count == 2));
    Ok(())
}

#[tokio::test]
async fn test_least_used_color_is_minimal() {
    let palette = Palette::new();
    let mut active = Vec::new();

    for i in 0..5 {
        let mut c = descriptor(&format!("id-{i}"), "", "", "", 1);
        c.color_name = palette.pick_least_used(&active).to_string();
        active.push(c);
    }

    // five containers over twelve colors: no color may be used twice
    let mut usage: HashMap<&str, usize> = HashMap::new();
    for c in &active {
        *usage.entry(c.color_name.as_str()).or_default() += 1;
    }
    assert!(usage.values().all(|&count| count == 1));

    // the next pick must be one of the still-unused entries
    let next = palette.pick_least_used(&active);
    assert!(!usage.contains_key(next));
}

#[tokio::test]
async fn test_registry_empties_cleanly() -> Result<()> {
    let registry = WatchRegistry::new();
    registry.add(descriptor("aaaa", "", "proj", "web", 1)).await;
    assert!(!registry.is_empty().await);
    assert_eq!(registry.len().await, 1);

    registry.remove("aaaa").await;
    assert!(registry.is_empty().await);
    assert_eq!(registry.prefix_len().await, 0);
    Ok(())
}
