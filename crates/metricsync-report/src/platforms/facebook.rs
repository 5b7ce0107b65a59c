//! Facebook pages (`fb_page`).

use metricsync_core::CellValue;

use super::Column;
use crate::metrics::{count_cell, percent, Counts};

const FOLLOWERS: &str = "lifetime_snapshot.followers_count";

pub(super) const COLUMNS: &[Column] = &[
    Column::latest("Followers", FOLLOWERS),
    Column::sum("Followers Gained", "followers_gained"),
    Column::sum("Followers Lost", "followers_lost"),
    Column::sum("Impressions", "impressions"),
    Column::sum("Reach", "impressions_unique"),
    Column::sum("Posts Published", "posts_sent_count"),
    Column::sum("Reactions", "reactions"),
    Column::sum("Comments", "comments_count"),
    Column::sum("Shares", "shares_count"),
    Column::sum("Link Clicks", "post_link_clicks"),
    Column::sum("Other Clicks", "post_content_clicks_other"),
    Column::sum("Video Views", "video_views"),
];

pub(super) const DERIVED: &[&str] = &[
    "Engagements",
    "Engagement Rate (Impressions) %",
    "Engagement Rate (Followers) %",
    "Click-Through Rate %",
];

pub(super) fn derive(c: &Counts) -> Vec<CellValue> {
    let engagements = c.sum(&[
        "reactions",
        "comments_count",
        "shares_count",
        "post_link_clicks",
        "post_content_clicks_other",
    ]);
    let impressions = c.get("impressions");
    vec![
        count_cell(engagements),
        CellValue::Decimal(percent(engagements, impressions)),
        CellValue::Decimal(percent(engagements, c.get(FOLLOWERS))),
        CellValue::Decimal(percent(c.get("post_link_clicks"), impressions)),
    ]
}
