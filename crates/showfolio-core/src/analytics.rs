//! Analytics aggregation
//!
//! Counters (`views`, `clicks`, per-day traffic, per-link clicks) are
//! stored and incremented atomically by the store. Everything else in
//! [`Analytics`] is derived here from those counters when a profile is
//! loaded.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{Analytics, Link, Platform, PlatformClicks, TopLink, TrafficDay};

/// Maximum number of entries in the top-links ranking
pub const TOP_LINKS_LIMIT: usize = 5;

/// Default number of days kept in the traffic series
pub const DEFAULT_TRAFFIC_WINDOW_DAYS: u32 = 30;

/// Longest traffic window a config may ask for (about ten years)
pub const MAX_TRAFFIC_WINDOW_DAYS: u32 = 3650;

/// Calendar day a timestamp falls on (UTC)
pub fn day_of(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// First day still inside a rolling window that ends on `today`
pub fn window_start(today: NaiveDate, window_days: u32) -> NaiveDate {
    today
        .checked_sub_signed(Duration::days(i64::from(window_days.max(1)) - 1))
        .unwrap_or(NaiveDate::MIN)
}

/// Percentage of views that led to a click, rounded
pub fn conversion_rate(views: u64, clicks: u64) -> u32 {
    if views == 0 {
        return 0;
    }
    ((clicks as f64 / views as f64) * 100.0).round() as u32
}

/// Click distribution per platform, highest first
pub fn platform_distribution(links: &[Link]) -> Vec<PlatformClicks> {
    let mut totals: HashMap<Platform, u64> = HashMap::new();
    for link in links.iter().filter(|l| l.clicks > 0) {
        *totals.entry(link.platform).or_default() += link.clicks;
    }

    let mut platforms: Vec<_> = totals
        .into_iter()
        .map(|(platform, clicks)| PlatformClicks { platform, clicks })
        .collect();
    platforms.sort_by(|a, b| {
        b.clicks
            .cmp(&a.clicks)
            .then_with(|| a.platform.as_str().cmp(b.platform.as_str()))
    });
    platforms
}

/// Most clicked links, capped at [`TOP_LINKS_LIMIT`]
pub fn top_links(links: &[Link]) -> Vec<TopLink> {
    let mut clicked: Vec<_> = links.iter().filter(|l| l.clicks > 0).collect();
    clicked.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.order.cmp(&b.order)));
    clicked
        .into_iter()
        .take(TOP_LINKS_LIMIT)
        .map(|l| TopLink {
            link_id: l.id,
            title: l.title.clone(),
            clicks: l.clicks,
        })
        .collect()
}

/// Build the full aggregate from stored counters
pub fn assemble(
    views: u64,
    clicks: u64,
    last_viewed: Option<DateTime<Utc>>,
    mut traffic: Vec<TrafficDay>,
    links: &[Link],
) -> Analytics {
    traffic.sort_by_key(|d| d.date);
    Analytics {
        views,
        clicks,
        last_viewed,
        traffic,
        platforms: platform_distribution(links),
        top_links: top_links(links),
        conversion_rate: conversion_rate(views, clicks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn link(title: &str, platform: Platform, clicks: u64, order: u32) -> Link {
        let mut link = Link::new(
            Uuid::nil(),
            title,
            format!("https://{}.dev", title),
            platform,
            order,
        );
        link.clicks = clicks;
        link
    }

    #[test]
    fn test_conversion_rate() {
        assert_eq!(conversion_rate(0, 0), 0);
        assert_eq!(conversion_rate(0, 3), 0);
        assert_eq!(conversion_rate(4, 1), 25);
        assert_eq!(conversion_rate(3, 1), 33);
        assert_eq!(conversion_rate(3, 2), 67);
    }

    #[test]
    fn test_window_start() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(window_start(today, 1), today);
        assert_eq!(
            window_start(today, 30),
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
        );
        // zero is treated as a one-day window
        assert_eq!(window_start(today, 0), today);
        // past the calendar range clamps instead of overflowing
        assert_eq!(window_start(today, u32::MAX), NaiveDate::MIN);
    }

    #[test]
    fn test_top_links_ranking() {
        let links = vec![
            link("a", Platform::Github, 2, 0),
            link("b", Platform::Github, 9, 1),
            link("c", Platform::Twitter, 0, 2),
            link("d", Platform::Medium, 5, 3),
            link("e", Platform::Custom, 1, 4),
            link("f", Platform::Custom, 1, 5),
            link("g", Platform::Custom, 7, 6),
        ];

        let top = top_links(&links);
        let titles: Vec<_> = top.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "g", "d", "a", "e"]);
        assert_eq!(top.len(), TOP_LINKS_LIMIT);
    }

    #[test]
    fn test_platform_distribution() {
        let links = vec![
            link("a", Platform::Github, 2, 0),
            link("b", Platform::Github, 3, 1),
            link("c", Platform::Twitter, 4, 2),
            link("d", Platform::Medium, 0, 3),
        ];

        let platforms = platform_distribution(&links);
        assert_eq!(
            platforms,
            vec![
                PlatformClicks {
                    platform: Platform::Github,
                    clicks: 5
                },
                PlatformClicks {
                    platform: Platform::Twitter,
                    clicks: 4
                },
            ]
        );
    }

    #[test]
    fn test_assemble_sorts_traffic() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let traffic = vec![
            TrafficDay {
                date: d2,
                views: 1,
                clicks: 0,
            },
            TrafficDay {
                date: d1,
                views: 3,
                clicks: 1,
            },
        ];

        let analytics = assemble(4, 1, None, traffic, &[]);
        assert_eq!(analytics.traffic[0].date, d1);
        assert_eq!(analytics.traffic[1].date, d2);
        assert_eq!(analytics.conversion_rate, 25);
        assert!(analytics.top_links.is_empty());
        assert!(analytics.platforms.is_empty());
    }
}
