//! Merging a resource's desired notifications into a bucket's configuration.
//!
//! Entries are matched by `Id` only. Entries this resource never declared,
//! whether configured by hand or owned by another stack, are never touched.

use notification_types::{
    NotificationConfiguration, NotificationEntry, NotificationSlot, RequestType,
    ResourceProperties,
};
use std::collections::HashSet;

/// Ids of the given entries in order, skipping entries without one
pub fn ids<'a>(entries: impl IntoIterator<Item = &'a NotificationEntry>) -> Vec<&'a str> {
    entries
        .into_iter()
        .filter_map(|entry| entry.id.as_deref())
        .collect()
}

/// Append every entry of `in_config` to the matching slot of `config`.
///
/// Slots that are empty in `in_config` leave `config` untouched. Returns the
/// same `config` it was given.
pub fn merge_in_config<'a>(
    config: &'a mut NotificationConfiguration,
    in_config: &NotificationConfiguration,
) -> &'a mut NotificationConfiguration {
    for slot in NotificationSlot::ALL {
        let incoming = in_config.slot(slot);
        if incoming.is_empty() {
            continue;
        }
        config.slot_mut(slot).extend(incoming.iter().cloned());
    }
    config
}

/// Drop entries whose id is in `removal_ids`, keeping the order of the rest
pub fn remove_ids(config: &mut NotificationConfiguration, removal_ids: &HashSet<&str>) {
    if removal_ids.is_empty() {
        return;
    }
    for slot in NotificationSlot::ALL {
        config
            .slot_mut(slot)
            .retain(|entry| !entry.id.as_deref().is_some_and(|id| removal_ids.contains(id)));
    }
}

/// Compute the configuration to write back for one request.
///
/// `props` holds the desired state of the request (the state being deleted
/// on Delete) and `old_props` the previous desired state on Update.
pub fn reconcile(
    mut current: NotificationConfiguration,
    request_type: RequestType,
    props: &ResourceProperties,
    old_props: Option<&ResourceProperties>,
) -> NotificationConfiguration {
    let desired = &props.notification_configuration;

    if props.managed {
        return match request_type {
            RequestType::Delete => NotificationConfiguration::default(),
            RequestType::Create | RequestType::Update => desired.clone(),
        };
    }

    let mut removal_ids: HashSet<&str> = HashSet::new();
    if let Some(old) = old_props {
        removal_ids.extend(ids(old.notification_configuration.entries()));
    }
    // On Delete the request's own properties name the entries being removed
    if request_type == RequestType::Delete {
        removal_ids.extend(ids(desired.entries()));
    }

    remove_ids(&mut current, &removal_ids);

    if request_type != RequestType::Delete {
        merge_in_config(&mut current, desired);
    }
    current
}
