//! Instagram business accounts (`fb_instagram_account`).

use metricsync_core::CellValue;

use super::Column;
use crate::metrics::{count_cell, percent, Counts};

const FOLLOWERS: &str = "lifetime_snapshot.followers_count";

pub(super) const COLUMNS: &[Column] = &[
    Column::latest("Followers", FOLLOWERS),
    Column::sum("Followers Gained", "followers_gained"),
    Column::sum("Followers Lost", "followers_lost"),
    Column::sum("Net Follower Growth", "net_follower_growth"),
    Column::sum("Impressions", "impressions"),
    Column::sum("Reach", "impressions_unique"),
    Column::sum("Profile Views", "profile_views"),
    Column::sum("Posts Published", "posts_sent_count"),
    Column::sum("Likes", "likes"),
    Column::sum("Comments", "comments_count"),
    Column::sum("Shares", "shares_count"),
    Column::sum("Saves", "saves"),
    Column::sum("Story Replies", "story_replies"),
    Column::sum("Video Views", "video_views"),
    Column::sum("Website Clicks", "website_clicks"),
];

pub(super) const DERIVED: &[&str] = &[
    "Engagements",
    "Engagement Rate (Impressions) %",
    "Engagement Rate (Followers) %",
    "Click-Through Rate %",
];

pub(super) fn derive(c: &Counts) -> Vec<CellValue> {
    let engagements = c.sum(&["likes", "comments_count", "shares_count", "saves", "story_replies"]);
    let impressions = c.get("impressions");
    vec![
        count_cell(engagements),
        CellValue::Decimal(percent(engagements, impressions)),
        CellValue::Decimal(percent(engagements, c.get(FOLLOWERS))),
        CellValue::Decimal(percent(c.get("website_clicks"), impressions)),
    ]
}
