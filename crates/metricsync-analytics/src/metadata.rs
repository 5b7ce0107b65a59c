//! Conversion of metadata payloads into [`Profile`] and [`Group`] values.

use metricsync_core::{profile_id_from_json, Group, Profile};

use crate::types::{CustomerGroup, CustomerProfile};

/// Converts a raw metadata profile. Returns the profile's name on failure so
/// the caller can log which entry was dropped.
pub(crate) fn into_profile(raw: CustomerProfile) -> Result<Profile, String> {
    let Some(profile_id) = profile_id_from_json(&raw.customer_profile_id) else {
        return Err(raw.name);
    };

    let network_id = match raw.native_id {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let name = if raw.name.trim().is_empty() {
        raw.native_name.unwrap_or_default()
    } else {
        raw.name
    };

    Ok(Profile {
        profile_id,
        name,
        network_type: raw.network_type,
        network_id,
        group_ids: raw.groups.iter().filter_map(profile_id_from_json).collect(),
    })
}

/// Joins groups with their member profiles, in the order the API listed the groups.
///
/// Profiles that belong to no listed group do not appear in any returned group.
/// Groups with unusable ids are skipped with a warning.
#[must_use]
pub fn build_groups(groups: Vec<CustomerGroup>, profiles: &[Profile]) -> Vec<Group> {
    let groups: Vec<Group> = groups
        .into_iter()
        .filter_map(|raw| {
            let Some(group_id) = profile_id_from_json(&raw.group_id) else {
                tracing::warn!(group = %raw.name, "skipping group with unusable id");
                return None;
            };
            let members = profiles
                .iter()
                .filter(|p| p.group_ids.iter().any(|g| *g == group_id))
                .cloned()
                .collect();
            Some(Group {
                group_id,
                name: raw.name,
                profiles: members,
            })
        })
        .collect();

    let ungrouped = profiles
        .iter()
        .filter(|p| {
            !groups
                .iter()
                .any(|g| g.profiles.iter().any(|m| m.profile_id == p.profile_id))
        })
        .count();
    if ungrouped > 0 {
        tracing::info!(ungrouped, "profiles without a group are excluded from sync");
    }

    groups
}
