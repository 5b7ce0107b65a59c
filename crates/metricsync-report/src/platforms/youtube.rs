//! YouTube channels (`youtube_channel`).

use metricsync_core::CellValue;

use super::Column;
use crate::metrics::{count_cell, percent, ratio, Counts};

const SUBSCRIBERS: &str = "lifetime_snapshot.followers_count";

pub(super) const COLUMNS: &[Column] = &[
    Column::latest("Subscribers", SUBSCRIBERS),
    Column::sum("Subscribers Gained", "followers_gained"),
    Column::sum("Subscribers Lost", "followers_lost"),
    Column::sum("Impressions", "impressions"),
    Column::sum("Videos Published", "posts_sent_count"),
    Column::sum("Video Views", "video_views"),
    Column::sum("Watch Time (Minutes)", "video_view_time_minutes"),
    Column::sum("Likes", "likes"),
    Column::sum("Dislikes", "dislikes"),
    Column::sum("Comments", "comments_count"),
    Column::sum("Shares", "shares_count"),
    Column::sum("Card Clicks", "card_clicks"),
    Column::sum("Annotation Clicks", "annotation_clicks"),
];

pub(super) const DERIVED: &[&str] = &[
    "Engagements",
    "Engagement Rate (Impressions) %",
    "Engagement Rate (Subscribers) %",
    "Click-Through Rate %",
    "Engagement per View",
];

pub(super) fn derive(c: &Counts) -> Vec<CellValue> {
    let engagements = c.sum(&["likes", "dislikes", "comments_count", "shares_count"]);
    let impressions = c.get("impressions");
    let clicks = c.sum(&["card_clicks", "annotation_clicks"]);
    vec![
        count_cell(engagements),
        CellValue::Decimal(percent(engagements, impressions)),
        CellValue::Decimal(percent(engagements, c.get(SUBSCRIBERS))),
        CellValue::Decimal(percent(clicks, impressions)),
        CellValue::Decimal(ratio(engagements, c.get("video_views"))),
    ]
}
