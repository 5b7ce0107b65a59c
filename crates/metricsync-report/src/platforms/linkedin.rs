//! LinkedIn company pages (`linkedin_company`).

use metricsync_core::CellValue;

use super::Column;
use crate::metrics::{count_cell, percent, Counts};

const FOLLOWERS: &str = "lifetime_snapshot.followers_count";

pub(super) const COLUMNS: &[Column] = &[
    Column::latest("Followers", FOLLOWERS),
    Column::sum("Followers Gained", "followers_gained"),
    Column::sum("Impressions", "impressions"),
    Column::sum("Reach", "impressions_unique"),
    Column::sum("Posts Published", "posts_sent_count"),
    Column::sum("Reactions", "reactions"),
    Column::sum("Comments", "comments_count"),
    Column::sum("Shares", "shares_count"),
    Column::sum("Clicks", "post_content_clicks"),
    Column::sum("Video Views", "video_views"),
];

pub(super) const DERIVED: &[&str] = &[
    "Engagements",
    "Engagement Rate (Impressions) %",
    "Engagement Rate (Followers) %",
    "Click-Through Rate %",
];

pub(super) fn derive(c: &Counts) -> Vec<CellValue> {
    let engagements = c.sum(&["reactions", "comments_count", "shares_count", "post_content_clicks"]);
    let impressions = c.get("impressions");
    vec![
        count_cell(engagements),
        CellValue::Decimal(percent(engagements, impressions)),
        CellValue::Decimal(percent(engagements, c.get(FOLLOWERS))),
        CellValue::Decimal(percent(c.get("post_content_clicks"), impressions)),
    ]
}
