//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use showfolio_core::{Availability, Identity, Link, Profile};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a profile as its owner sees it
    pub fn print_profile(&self, profile: &Profile) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", profile.id);
                println!("Title:       {}", profile.title);
                println!(
                    "Username:    {}",
                    profile.username.as_deref().unwrap_or("(not set)")
                );
                if !profile.description.is_empty() {
                    println!("Description: {}", profile.description);
                }
                println!("Theme:       {}", profile.theme);
                println!(
                    "Status:      {}",
                    if profile.is_active { "active" } else { "hidden" }
                );
                if let Some(ref image) = profile.profile_image {
                    println!("Image:       {}", image);
                }
                println!("Views:       {}", profile.analytics.views);
                println!("Clicks:      {}", profile.analytics.clicks);
                println!("Created:     {}", profile.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:     {}", profile.updated_at.format("%Y-%m-%d %H:%M"));

                println!();
                println!("── Links ({}) ──", profile.social_links.len());
                if profile.social_links.is_empty() {
                    println!("No links yet.");
                }
                for link in &profile.social_links {
                    println!("{}", link_row(link));
                }
            }
            OutputFormat::Json => println!("{}", json(profile)),
            OutputFormat::Quiet => println!("{}", profile.id),
        }
    }

    /// Print a list of profiles
    pub fn print_profiles(&self, profiles: &[Profile]) {
        match self.format {
            OutputFormat::Human => {
                if profiles.is_empty() {
                    println!("No profiles found.");
                    return;
                }
                for profile in profiles {
                    println!(
                        "{} | {} | {} | {} link(s){}",
                        short_id(&profile.id),
                        truncate(&profile.title, 30),
                        profile.username.as_deref().unwrap_or("-"),
                        profile.social_links.len(),
                        if profile.is_active { "" } else { " | hidden" }
                    );
                }
                println!("\n{} profile(s)", profiles.len());
            }
            OutputFormat::Json => println!("{}", json(&profiles)),
            OutputFormat::Quiet => {
                for profile in profiles {
                    println!("{}", profile.id);
                }
            }
        }
    }

    /// Print a profile as a visitor sees it
    pub fn print_public_profile(&self, profile: &Profile) {
        match self.format {
            OutputFormat::Human => {
                println!("{}", profile.title);
                if let Some(ref username) = profile.username {
                    println!("@{}", username);
                }
                if !profile.description.is_empty() {
                    println!();
                    println!("{}", profile.description);
                }
                println!();
                if profile.social_links.is_empty() {
                    println!("No links yet.");
                }
                for link in profile.visible_links() {
                    println!(
                        "{} | {:<9} | {} | {}",
                        short_id(&link.id),
                        link.platform.as_str(),
                        truncate(&link.title, 30),
                        truncate(&link.url, 45)
                    );
                }
            }
            OutputFormat::Json => {
                let view = serde_json::json!({
                    "id": profile.id,
                    "title": profile.title,
                    "username": profile.username,
                    "description": profile.description,
                    "theme": profile.theme,
                    "profile_image": profile.profile_image,
                    "links": profile.visible_links(),
                });
                println!("{}", json(&view));
            }
            OutputFormat::Quiet => {
                for link in profile.visible_links() {
                    println!("{}", link.url);
                }
            }
        }
    }

    /// Print a single link
    pub fn print_link(&self, link: &Link) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", link.id);
                println!("Title:    {}", link.title);
                println!("URL:      {}", link.url);
                println!("Platform: {}", link.platform);
                if let Some(ref icon) = link.icon {
                    println!("Icon:     {}", icon);
                }
                println!("Position: {}", link.order);
                println!(
                    "Status:   {}",
                    if link.is_active { "visible" } else { "hidden" }
                );
                println!("Clicks:   {}", link.clicks);
            }
            OutputFormat::Json => println!("{}", json(link)),
            OutputFormat::Quiet => println!("{}", link.id),
        }
    }

    /// Print the analytics of a profile
    pub fn print_analytics(&self, profile: &Profile) {
        let analytics = &profile.analytics;
        match self.format {
            OutputFormat::Human => {
                println!("Analytics for {}", profile.title);
                println!();
                println!("Views:           {}", analytics.views);
                println!("Clicks:          {}", analytics.clicks);
                println!("Conversion rate: {}%", analytics.conversion_rate);
                println!(
                    "Last viewed:     {}",
                    analytics
                        .last_viewed
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "never".to_string())
                );

                if !analytics.traffic.is_empty() {
                    println!();
                    println!("── Traffic ──");
                    for day in &analytics.traffic {
                        println!("{}  {:>5} views  {:>5} clicks", day.date, day.views, day.clicks);
                    }
                }
                if !analytics.top_links.is_empty() {
                    println!();
                    println!("── Top links ──");
                    for top in &analytics.top_links {
                        println!("{:>5}  {}", top.clicks, top.title);
                    }
                }
                if !analytics.platforms.is_empty() {
                    println!();
                    println!("── Platforms ──");
                    for entry in &analytics.platforms {
                        println!("{:>5}  {}", entry.clicks, entry.platform);
                    }
                }
            }
            OutputFormat::Json => println!("{}", json(analytics)),
            OutputFormat::Quiet => println!("{} {}", analytics.views, analytics.clicks),
        }
    }

    /// Print the outcome of a username check
    pub fn print_availability(&self, username: &str, availability: &Availability) {
        match self.format {
            OutputFormat::Human => {
                if availability.available {
                    println!("✓ '{}' is available", username);
                } else {
                    println!(
                        "✗ '{}' is not available: {}",
                        username,
                        availability.error.as_deref().unwrap_or("unknown reason")
                    );
                }
            }
            OutputFormat::Json => println!("{}", json(availability)),
            OutputFormat::Quiet => println!("{}", availability.available),
        }
    }

    /// Print the signed-in identity
    pub fn print_identity(&self, identity: Option<&Identity>) {
        match self.format {
            OutputFormat::Human => match identity {
                Some(identity) => {
                    println!("Signed in as {} <{}>", identity.display_name, identity.email);
                    println!("User ID: {}", identity.id);
                }
                None => println!("Not signed in."),
            },
            OutputFormat::Json => println!("{}", json(&identity)),
            OutputFormat::Quiet => {
                if let Some(identity) = identity {
                    println!("{}", identity.email);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a failure notification
    ///
    /// Shown in every format, quiet included.
    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "error", "message": message})
                );
            }
            OutputFormat::Human | OutputFormat::Quiet => eprintln!("✗ {}", message),
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// One-line summary of a link
fn link_row(link: &Link) -> String {
    format!(
        "{}. {} | {:<9} | {} | {}{}",
        link.order,
        short_id(&link.id),
        link.platform.as_str(),
        truncate(&link.title, 30),
        truncate(&link.url, 40),
        if link.is_active { "" } else { " | hidden" }
    )
}

/// First eight characters of an id
pub fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        serde_json::json!({"status": "error", "message": e.to_string()}).to_string()
    })
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showfolio_core::Platform;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        // counts characters, not bytes
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_link_row() {
        let mut link = Link::new(
            uuid::Uuid::new_v4(),
            "GitHub",
            "https://github.com/ben",
            Platform::Github,
            2,
        );
        let row = link_row(&link);
        assert!(row.starts_with("2. "));
        assert!(row.contains("github"));
        assert!(!row.contains("hidden"));

        link.is_active = false;
        assert!(link_row(&link).ends_with("| hidden"));
    }

    #[test]
    fn test_short_id() {
        let id = uuid::Uuid::parse_str("0f8fad5b-d9cb-469f-a165-70867728950e").unwrap();
        assert_eq!(short_id(&id), "0f8fad5b");
    }
}
