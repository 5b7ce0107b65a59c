//! Buckets fetched data points into per-platform rows.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use metricsync_core::{canonical_profile_id, DataPoint, NormalizedRow, Profile};

use crate::platforms::Platform;

/// Normalized rows keyed by platform, in platform order.
pub type RoutedRows = BTreeMap<Platform, Vec<NormalizedRow>>;

/// Maps an analytics network type to its canonical platform key.
/// Unknown types pass through unchanged.
#[must_use]
pub fn canonical_platform_key(network_type: &str) -> String {
    let key = network_type.trim();
    match key {
        "linkedin_company" => "linkedin",
        "fb_instagram_account" => "instagram",
        "fb_page" => "facebook",
        "youtube_channel" => "youtube",
        "twitter_profile" => "twitter",
        other => other,
    }
    .to_string()
}

/// Routes data points to their platform normalizer.
///
/// The first point seen for a `(profile, day)` pair wins; later duplicates
/// are dropped. Points whose profile is unknown, whose platform has no
/// normalizer, or that carry no metrics payload are dropped with a warning.
/// Row order within a platform follows input order.
#[must_use]
pub fn route(points: &[DataPoint], profiles: &[Profile]) -> RoutedRows {
    let by_id: HashMap<String, &Profile> = profiles
        .iter()
        .map(|p| (canonical_profile_id(&p.profile_id), p))
        .collect();

    let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();
    let mut routed = RoutedRows::new();

    for point in points {
        let profile_id = canonical_profile_id(&point.profile_id);
        if !seen.insert((profile_id.clone(), point.reporting_period)) {
            tracing::debug!(
                profile_id = %profile_id,
                date = %point.reporting_period,
                "duplicate data point; keeping the first"
            );
            continue;
        }

        let Some(profile) = by_id.get(&profile_id) else {
            tracing::warn!(profile_id = %profile_id, "dropping data point for unknown profile");
            continue;
        };

        let key = canonical_platform_key(&profile.network_type);
        let Some(platform) = Platform::from_key(&key) else {
            tracing::warn!(
                profile_id = %profile_id,
                platform = %key,
                "dropping data point for unsupported platform"
            );
            continue;
        };

        match platform.normalize(point, profile) {
            Some(row) => routed.entry(platform).or_default().push(row),
            None => {
                tracing::warn!(
                    profile_id = %profile_id,
                    date = %point.reporting_period,
                    "dropping data point without metrics"
                );
            }
        }
    }

    routed
}
