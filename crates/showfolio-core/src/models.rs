//! Data models for ShowFolio
//!
//! Defines the core data structures: Profile, Link and the embedded
//! Analytics aggregate, plus the drafts and patches used to create and
//! update them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current time at the millisecond precision the store keeps
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Display theme of a public profile
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme '{}'. Use 'light' or 'dark'.", other)),
        }
    }
}

/// Platform a link points at
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Github,
    Linkedin,
    Twitter,
    Facebook,
    Youtube,
    Instagram,
    Tiktok,
    Medium,
    #[serde(rename = "dev.to")]
    DevTo,
    #[default]
    Custom,
}

impl Platform {
    /// Every supported platform, in display order
    pub const ALL: [Platform; 10] = [
        Platform::Github,
        Platform::Linkedin,
        Platform::Twitter,
        Platform::Facebook,
        Platform::Youtube,
        Platform::Instagram,
        Platform::Tiktok,
        Platform::Medium,
        Platform::DevTo,
        Platform::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Github => "github",
            Platform::Linkedin => "linkedin",
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Medium => "medium",
            Platform::DevTo => "dev.to",
            Platform::Custom => "custom",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Platform::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Platform::ALL.iter().map(|p| p.as_str()).collect();
                format!("Unknown platform '{}'. Use one of: {}", s, names.join(", "))
            })
    }
}

/// One outbound link shown on a profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    /// Unique identifier
    pub id: Uuid,
    /// Owning profile
    pub profile_id: Uuid,
    /// Display title
    pub title: String,
    /// Destination URL
    pub url: String,
    /// Platform tag
    pub platform: Platform,
    /// Optional icon reference
    pub icon: Option<String>,
    /// Zero-based display position
    pub order: u32,
    /// Whether visitors see this link
    pub is_active: bool,
    /// Click counter
    pub clicks: u64,
    /// When this link was created
    pub created_at: DateTime<Utc>,
    /// When this link was last updated
    pub updated_at: DateTime<Utc>,
}

impl Link {
    /// Create a new active link at the given position
    pub fn new(
        profile_id: Uuid,
        title: impl Into<String>,
        url: impl Into<String>,
        platform: Platform,
        order: u32,
    ) -> Self {
        let stamp = now();
        Self {
            id: Uuid::new_v4(),
            profile_id,
            title: title.into(),
            url: url.into(),
            platform,
            icon: None,
            order,
            is_active: true,
            clicks: 0,
            created_at: stamp,
            updated_at: stamp,
        }
    }
}

/// Per-day traffic bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrafficDay {
    pub date: NaiveDate,
    pub views: u64,
    pub clicks: u64,
}

/// Clicks attributed to one platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformClicks {
    pub platform: Platform,
    pub clicks: u64,
}

/// One entry of the top-links ranking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopLink {
    pub link_id: Uuid,
    pub title: String,
    pub clicks: u64,
}

/// Analytics aggregate embedded in a profile
///
/// The counters are stored; `platforms`, `top_links` and
/// `conversion_rate` are derived from them (see `analytics`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Analytics {
    pub views: u64,
    pub clicks: u64,
    pub last_viewed: Option<DateTime<Utc>>,
    /// Ascending by date
    pub traffic: Vec<TrafficDay>,
    /// Descending by clicks
    pub platforms: Vec<PlatformClicks>,
    /// Descending by clicks, at most five entries
    pub top_links: Vec<TopLink>,
    /// Percentage of views that led to a click
    pub conversion_rate: u32,
}

/// Counter kinds that `increment_analytic` understands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Views,
    Clicks,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Views => "views",
            Metric::Clicks => "clicks",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "views" | "view" => Ok(Metric::Views),
            "clicks" | "click" => Ok(Metric::Clicks),
            other => Err(format!("Unknown metric '{}'. Use 'views' or 'clicks'.", other)),
        }
    }
}

/// A user's public link-in-bio page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    /// Unique identifier
    pub id: Uuid,
    /// Owning identity
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub theme: Theme,
    /// Lowercase public handle
    pub username: Option<String>,
    pub is_active: bool,
    /// Reference to an uploaded image (not managed here)
    pub profile_image: Option<String>,
    pub social_links: Vec<Link>,
    pub analytics: Analytics,
    /// When this profile was created
    pub created_at: DateTime<Utc>,
    /// When this profile was last updated
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create a new active profile with zeroed analytics
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        let stamp = now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            title: title.into(),
            description: String::new(),
            theme: Theme::default(),
            username: None,
            is_active: true,
            profile_image: None,
            social_links: Vec::new(),
            analytics: Analytics::default(),
            created_at: stamp,
            updated_at: stamp,
        }
    }

    /// Find a link by ID
    pub fn link(&self, id: Uuid) -> Option<&Link> {
        self.social_links.iter().find(|l| l.id == id)
    }

    /// Active links in display order
    pub fn visible_links(&self) -> Vec<&Link> {
        let mut links: Vec<_> = self.social_links.iter().filter(|l| l.is_active).collect();
        links.sort_by_key(|l| l.order);
        links
    }
}

/// Fields supplied when creating a profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub links: Vec<LinkDraft>,
}

impl ProfileDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Partial update of a profile; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the username
    pub username: Option<Option<String>>,
    pub theme: Option<Theme>,
    pub is_active: Option<bool>,
    /// `Some(None)` clears the image
    pub profile_image: Option<Option<String>>,
}

impl ProfilePatch {
    /// True when the patch carries no field changes
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.username.is_none()
            && self.theme.is_none()
            && self.is_active.is_none()
            && self.profile_image.is_none()
    }
}

/// Fields supplied when adding a link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkDraft {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub icon: Option<String>,
}

impl LinkDraft {
    pub fn new(title: impl Into<String>, url: impl Into<String>, platform: Platform) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            platform,
            icon: None,
        }
    }
}

/// Partial update of a link
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkPatch {
    pub title: Option<String>,
    pub url: Option<String>,
    pub platform: Option<Platform>,
    pub icon: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_new() {
        let profile = Profile::new("user-1", "Ben");
        assert_eq!(profile.user_id, "user-1");
        assert_eq!(profile.title, "Ben");
        assert!(profile.is_active);
        assert_eq!(profile.theme, Theme::Light);
        assert!(profile.social_links.is_empty());
        assert_eq!(profile.analytics.views, 0);
        assert_eq!(profile.analytics.clicks, 0);
        assert_eq!(profile.created_at, profile.updated_at);
    }

    #[test]
    fn test_link_new() {
        let profile_id = Uuid::new_v4();
        let link = Link::new(profile_id, "GitHub", "https://github.com/ben", Platform::Github, 3);
        assert_eq!(link.profile_id, profile_id);
        assert_eq!(link.order, 3);
        assert!(link.is_active);
        assert_eq!(link.clicks, 0);
        assert!(link.icon.is_none());
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("github".parse::<Platform>().unwrap(), Platform::Github);
        assert_eq!("GitHub".parse::<Platform>().unwrap(), Platform::Github);
        assert_eq!("dev.to".parse::<Platform>().unwrap(), Platform::DevTo);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_serialization() {
        let json = serde_json::to_string(&Platform::DevTo).unwrap();
        assert_eq!(json, "\"dev.to\"");
        let parsed: Platform = serde_json::from_str("\"linkedin\"").unwrap();
        assert_eq!(parsed, Platform::Linkedin);
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("system".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.to_string(), "light");
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!("views".parse::<Metric>().unwrap(), Metric::Views);
        assert_eq!("click".parse::<Metric>().unwrap(), Metric::Clicks);
        assert!("likes".parse::<Metric>().is_err());
    }

    #[test]
    fn test_visible_links_filters_and_sorts() {
        let mut profile = Profile::new("u", "P");
        let a = Link::new(profile.id, "A", "https://a.dev", Platform::Custom, 1);
        let b = Link::new(profile.id, "B", "https://b.dev", Platform::Custom, 0);
        let mut c = Link::new(profile.id, "C", "https://c.dev", Platform::Custom, 2);
        c.is_active = false;
        profile.social_links = vec![a, b, c];

        let titles: Vec<_> = profile.visible_links().iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[test]
    fn test_empty_patch() {
        assert!(ProfilePatch::default().is_empty());
        let patch = ProfilePatch {
            theme: Some(Theme::Dark),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_profile_serialization() {
        let mut profile = Profile::new("u", "Ben");
        profile.username = Some("benwright".to_string());
        let json = serde_json::to_string(&profile).unwrap();
        let deserialized: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile, deserialized);
    }
}
