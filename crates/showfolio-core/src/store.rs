//! Profile store
//!
//! The `Store` is the entry point for profile data. It validates input,
//! applies link list edits through [`crate::editor`] and persists through
//! the SQLite [`Database`].
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open_with_config(config)?;
//!
//! let mut profile = store.create_profile(&user.id, ProfileDraft::new("Ben"))?;
//! let github = LinkDraft::new("GitHub", "https://github.com/ben", Platform::Github);
//! store.add_link(&mut profile, github)?;
//!
//! store.increment_analytic(profile.id, Metric::Views)?;
//! ```
//!
//! Link operations take the caller's in-memory profile, edit a copy and
//! write the full link list in one transaction. The caller's copy is only
//! replaced once the write succeeds.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analytics;
use crate::config::Config;
use crate::editor;
use crate::error::{Error, Result};
use crate::models::{now, Link, LinkDraft, LinkPatch, Metric, Profile, ProfileDraft, ProfilePatch};
use crate::storage::{is_unique_violation, Database};
use crate::username::{self, Availability};

/// Record counts reported by `status`
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StoreStats {
    pub profiles: i64,
    pub links: i64,
}

/// Profile storage interface
pub struct Store {
    db: Database,
    config: Config,
}

impl Store {
    /// Open the store backed by `{data_dir}/showfolio.db`
    pub fn open_with_config(config: Config) -> Result<Self> {
        let db = Database::open(&config.sqlite_path())?;
        debug!(path = ?config.sqlite_path(), "opened profile store");
        Ok(Self { db, config })
    }

    /// Open a store that lives only in memory (for testing)
    pub fn open_in_memory(config: Config) -> Result<Self> {
        Ok(Self {
            db: Database::open_in_memory()?,
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Profile Operations ====================

    /// Create a profile owned by `owner_id`
    pub fn create_profile(&mut self, owner_id: &str, draft: ProfileDraft) -> Result<Profile> {
        let title = required_title(&draft.title)?;

        let username = match draft.username.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(self.claimable_username(raw, None)?),
            _ => None,
        };

        let mut profile = Profile::new(owner_id, title);
        profile.username = username;
        profile.description = draft.description.unwrap_or_default().trim().to_string();
        profile.theme = draft.theme.unwrap_or_default();
        profile.profile_image = non_blank(draft.profile_image);

        for link in draft.links {
            editor::add_link(&mut profile, link)?;
        }
        editor::normalize(&mut profile.social_links);
        profile.updated_at = profile.created_at;

        self.db.insert_profile(&profile).map_err(map_write_error)?;
        info!(
            profile = %profile.id,
            owner = owner_id,
            username = ?profile.username,
            "created profile"
        );
        Ok(profile)
    }

    /// Get a profile by ID
    pub fn get_profile(&self, id: Uuid) -> Result<Profile> {
        self.db
            .load_profile(id, self.window_start(now()))?
            .ok_or_else(|| Error::not_found("Profile", id))
    }

    /// Get a profile by its public username (case-insensitive)
    pub fn get_profile_by_username(&self, username: &str) -> Result<Profile> {
        let wanted = username::format(username);
        match self.db.profile_id_by_username(&wanted)? {
            Some(id) => self.get_profile(id),
            None => Err(Error::not_found("Profile", wanted)),
        }
    }

    /// All profiles owned by a user, oldest first
    pub fn get_user_profiles(&self, owner_id: &str) -> Result<Vec<Profile>> {
        let since = self.window_start(now());
        let mut profiles = Vec::new();
        for id in self.db.profile_ids_for_user(owner_id)? {
            if let Some(profile) = self.db.load_profile(id, since)? {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }

    /// Get a profile only if `owner_id` owns it
    ///
    /// Someone else's profile is reported as missing.
    pub fn get_owned_profile(&self, owner_id: &str, id: Uuid) -> Result<Profile> {
        let profile = self.get_profile(id)?;
        if profile.user_id != owner_id {
            debug!(profile = %id, owner = owner_id, "profile belongs to another user");
            return Err(Error::not_found("Profile", id));
        }
        Ok(profile)
    }

    /// The visitor view of a profile
    ///
    /// Only active profiles are visible, and only their active links, in
    /// display order.
    pub fn public_profile(&self, username: &str) -> Result<Profile> {
        let mut profile = self.get_profile_by_username(username)?;
        if !profile.is_active {
            return Err(Error::not_found("Profile", username::format(username)));
        }
        profile.social_links.retain(|l| l.is_active);
        Ok(profile)
    }

    /// Merge a partial update into a profile
    ///
    /// `updated_at` is always bumped, even for an empty patch.
    pub fn update_profile(&mut self, id: Uuid, patch: ProfilePatch) -> Result<Profile> {
        let mut profile = self.get_profile(id)?;

        if let Some(title) = patch.title {
            profile.title = required_title(&title)?;
        }
        if let Some(description) = patch.description {
            profile.description = description.trim().to_string();
        }
        if let Some(username) = patch.username {
            profile.username = match username.as_deref().map(str::trim) {
                Some(raw) if !raw.is_empty() => Some(self.claimable_username(raw, Some(id))?),
                _ => None,
            };
        }
        if let Some(theme) = patch.theme {
            profile.theme = theme;
        }
        if let Some(active) = patch.is_active {
            profile.is_active = active;
        }
        if let Some(image) = patch.profile_image {
            profile.profile_image = non_blank(image);
        }
        profile.updated_at = now();

        if !self
            .db
            .update_profile_fields(&profile)
            .map_err(map_write_error)?
        {
            return Err(Error::not_found("Profile", id));
        }
        debug!(profile = %id, "updated profile");
        Ok(profile)
    }

    /// Delete a profile with its links and traffic
    pub fn delete_profile(&mut self, id: Uuid) -> Result<()> {
        if !self.db.delete_profile(id)? {
            return Err(Error::not_found("Profile", id));
        }
        info!(profile = %id, "deleted profile");
        Ok(())
    }

    // ==================== Analytics ====================

    /// Count one view or click on a profile
    pub fn increment_analytic(&mut self, id: Uuid, metric: Metric) -> Result<()> {
        self.increment_analytic_at(id, metric, now())
    }

    /// Count one view or click at a given instant
    pub fn increment_analytic_at(
        &mut self,
        id: Uuid,
        metric: Metric,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if !self.db.increment(id, metric, at, self.window_start(at))? {
            return Err(Error::not_found("Profile", id));
        }
        debug!(profile = %id, metric = %metric, "incremented analytic");
        Ok(())
    }

    /// Count a click on one link and return where it leads
    pub fn record_link_click(&mut self, profile_id: Uuid, link_id: Uuid) -> Result<String> {
        let at = now();
        match self
            .db
            .increment_link_click(profile_id, link_id, at, self.window_start(at))?
        {
            Some(url) => {
                debug!(profile = %profile_id, link = %link_id, "recorded link click");
                Ok(url)
            }
            None if self.db.profile_exists(profile_id)? => Err(Error::not_found("Link", link_id)),
            None => Err(Error::not_found("Profile", profile_id)),
        }
    }

    // ==================== Link Operations ====================

    /// Append a link to a profile
    pub fn add_link(&mut self, profile: &mut Profile, draft: LinkDraft) -> Result<Link> {
        self.edit_links(profile, |p| editor::add_link(p, draft))
    }

    /// Merge a partial update into one link
    pub fn update_link(
        &mut self,
        profile: &mut Profile,
        link_id: Uuid,
        patch: LinkPatch,
    ) -> Result<Link> {
        self.edit_links(profile, |p| editor::update_link(p, link_id, patch))
    }

    /// Remove a link; the remaining links are renumbered
    pub fn remove_link(&mut self, profile: &mut Profile, link_id: Uuid) -> Result<Link> {
        self.edit_links(profile, |p| editor::remove_link(p, link_id))
    }

    /// Apply a new display sequence
    pub fn reorder_links(&mut self, profile: &mut Profile, ids: &[Uuid]) -> Result<()> {
        self.edit_links(profile, |p| editor::reorder(p, ids))
    }

    /// Show or hide a link
    pub fn set_link_active(
        &mut self,
        profile: &mut Profile,
        link_id: Uuid,
        active: bool,
    ) -> Result<Link> {
        self.edit_links(profile, |p| editor::set_active(p, link_id, active))
    }

    // ==================== Usernames ====================

    /// Check whether a username can be claimed
    ///
    /// Never fails: validation and store errors are reported through
    /// [`Availability::error`].
    pub fn is_username_available(&self, raw: &str) -> Availability {
        let wanted = match username::validate_and_format(raw) {
            Ok(name) => name,
            Err(e) => return Availability::unavailable(e.user_message()),
        };

        match self.db.username_taken(&wanted, None) {
            Ok(false) => Availability::available(),
            Ok(true) => Availability::unavailable(username::TAKEN_MESSAGE),
            Err(e) => {
                warn!(username = %wanted, error = %e, "username availability check failed");
                Availability::unavailable(username::CHECK_FAILED_MESSAGE)
            }
        }
    }

    // ==================== Statistics ====================

    /// Count profiles and links
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            profiles: self.db.profile_count()?,
            links: self.db.link_count()?,
        })
    }

    // ==================== Private helpers ====================

    fn window_start(&self, at: DateTime<Utc>) -> NaiveDate {
        analytics::window_start(analytics::day_of(at), self.config.traffic_window_days)
    }

    /// Validate, normalize and check that nobody else holds a username
    fn claimable_username(&self, raw: &str, owner: Option<Uuid>) -> Result<String> {
        let name = username::validate_and_format(raw)?;
        if self.db.username_taken(&name, owner)? {
            return Err(Error::validation("username", username::TAKEN_MESSAGE));
        }
        Ok(name)
    }

    /// Run an editor operation on a copy and persist the full link list
    fn edit_links<T>(
        &mut self,
        profile: &mut Profile,
        op: impl FnOnce(&mut Profile) -> Result<T>,
    ) -> Result<T> {
        let mut working = profile.clone();
        let out = op(&mut working)?;
        if !self.db.save_links(&working)? {
            return Err(Error::not_found("Profile", profile.id));
        }
        *profile = working;
        Ok(out)
    }
}

fn required_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::validation("title", "Title is required"));
    }
    Ok(title.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn map_write_error(err: rusqlite::Error) -> Error {
    if is_unique_violation(&err, "profiles.username") {
        Error::validation("username", username::TAKEN_MESSAGE)
    } else {
        Error::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{Platform, Theme};
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn memory_store() -> Store {
        Store::open_in_memory(Config::default()).unwrap()
    }

    fn github() -> LinkDraft {
        LinkDraft::new("GitHub", "https://github.com/ben", Platform::Github)
    }

    #[test]
    fn test_end_to_end_profile_flow() {
        let mut store = memory_store();

        let mut profile = store
            .create_profile("user-1", ProfileDraft::new("Ben").with_username("benwright"))
            .unwrap();
        assert_eq!(profile.analytics.views, 0);
        assert!(profile.social_links.is_empty());
        assert_eq!(profile.username.as_deref(), Some("benwright"));

        let link = store.add_link(&mut profile, github()).unwrap();
        assert_eq!(link.order, 0);
        assert_eq!(profile.social_links.len(), 1);

        store.increment_analytic(profile.id, Metric::Clicks).unwrap();

        let reloaded = store.get_profile(profile.id).unwrap();
        assert_eq!(reloaded.analytics.clicks, 1);
        assert_eq!(reloaded.social_links.len(), 1);
        assert_eq!(reloaded.social_links[0].title, "GitHub");
    }

    #[test]
    fn test_create_requires_title() {
        let mut store = memory_store();
        let err = store
            .create_profile("u", ProfileDraft::new("   "))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field(), Some("title"));
        assert_eq!(store.stats().unwrap().profiles, 0);
    }

    #[test]
    fn test_create_rejects_bad_username() {
        let mut store = memory_store();
        let err = store
            .create_profile("u", ProfileDraft::new("Ben").with_username("a b"))
            .unwrap_err();
        assert_eq!(err.field(), Some("username"));
        assert_eq!(err.user_message(), username::FORMAT_MESSAGE);
    }

    #[test]
    fn test_create_lowercases_username_and_rejects_duplicates() {
        let mut store = memory_store();
        let first = store
            .create_profile("u1", ProfileDraft::new("Alex").with_username("  Alex "))
            .unwrap();
        assert_eq!(first.username.as_deref(), Some("alex"));

        let err = store
            .create_profile("u2", ProfileDraft::new("Other").with_username("ALEX"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), username::TAKEN_MESSAGE);
    }

    #[test]
    fn test_unique_index_backs_up_availability_check() {
        let mut store = memory_store();
        store
            .create_profile("u1", ProfileDraft::new("Alex").with_username("alex"))
            .unwrap();

        // bypass the pre-check and write directly
        let mut sneaky = Profile::new("u2", "Sneaky");
        sneaky.username = Some("alex".into());
        let err = store.db.insert_profile(&sneaky).map_err(map_write_error).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field(), Some("username"));
    }

    #[test]
    fn test_create_with_draft_links() {
        let mut store = memory_store();
        let mut draft = ProfileDraft::new("Ben");
        draft.links = vec![
            github(),
            LinkDraft::new("Blog", "https://ben.dev", Platform::Custom),
        ];
        let profile = store.create_profile("u", draft).unwrap();

        let orders: Vec<_> = profile.social_links.iter().map(|l| l.order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert_eq!(store.get_profile(profile.id).unwrap(), profile);
    }

    #[test]
    fn test_username_availability() {
        let mut store = memory_store();
        store
            .create_profile("u", ProfileDraft::new("Alex").with_username("alex"))
            .unwrap();

        assert!(!store.is_username_available("alex").available);
        let taken = store.is_username_available("Alex");
        assert!(!taken.available);
        assert_eq!(taken.error.as_deref(), Some(username::TAKEN_MESSAGE));

        assert!(store.is_username_available("alex2").available);

        let invalid = store.is_username_available("ab");
        assert!(!invalid.available);
        assert_eq!(invalid.error.as_deref(), Some(username::FORMAT_MESSAGE));

        let empty = store.is_username_available("   ");
        assert_eq!(empty.error.as_deref(), Some(username::REQUIRED_MESSAGE));
    }

    #[test]
    fn test_get_missing_profile() {
        let store = memory_store();
        let err = store.get_profile(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = store.get_profile_by_username("nobody").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_get_profile_by_username_normalizes() {
        let mut store = memory_store();
        let created = store
            .create_profile("u", ProfileDraft::new("Ben").with_username("benwright"))
            .unwrap();
        let found = store.get_profile_by_username(" BenWright ").unwrap();
        assert_eq!(found.id, created.id);
    }

    #[test]
    fn test_user_profiles_and_ownership() {
        let mut store = memory_store();
        let first = store.create_profile("alice", ProfileDraft::new("One")).unwrap();
        sleep(Duration::from_millis(5));
        let second = store.create_profile("alice", ProfileDraft::new("Two")).unwrap();
        let other = store.create_profile("bob", ProfileDraft::new("Bob")).unwrap();

        let ids: Vec<_> = store
            .get_user_profiles("alice")
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);

        assert!(store.get_owned_profile("alice", first.id).is_ok());
        let err = store.get_owned_profile("alice", other.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_public_profile_hides_inactive() {
        let mut store = memory_store();
        let mut profile = store
            .create_profile("u", ProfileDraft::new("Ben").with_username("ben"))
            .unwrap();
        let hidden = store.add_link(&mut profile, github()).unwrap();
        store
            .add_link(
                &mut profile,
                LinkDraft::new("Blog", "https://ben.dev", Platform::Custom),
            )
            .unwrap();
        store.set_link_active(&mut profile, hidden.id, false).unwrap();

        let public = store.public_profile("ben").unwrap();
        assert_eq!(public.social_links.len(), 1);
        assert_eq!(public.social_links[0].title, "Blog");

        store
            .update_profile(
                profile.id,
                ProfilePatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        let err = store.public_profile("ben").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_empty_patch_only_bumps_updated_at() {
        let mut store = memory_store();
        let mut draft = ProfileDraft::new("Ben").with_username("ben");
        draft.description = Some("Hello".into());
        draft.theme = Some(Theme::Dark);
        let created = store.create_profile("u", draft).unwrap();
        let before = store.get_profile(created.id).unwrap();

        sleep(Duration::from_millis(5));
        let after = store
            .update_profile(created.id, ProfilePatch::default())
            .unwrap();

        assert!(after.updated_at > before.updated_at);
        let mut expected = before.clone();
        expected.updated_at = after.updated_at;
        assert_eq!(after, expected);
        assert_eq!(store.get_profile(created.id).unwrap(), expected);
    }

    #[test]
    fn test_update_profile_merges_fields() {
        let mut store = memory_store();
        let profile = store
            .create_profile("u", ProfileDraft::new("Ben").with_username("ben"))
            .unwrap();

        let updated = store
            .update_profile(
                profile.id,
                ProfilePatch {
                    title: Some("Ben Wright".into()),
                    theme: Some(Theme::Dark),
                    // keeping your own username is fine
                    username: Some(Some("BEN".into())),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Ben Wright");
        assert_eq!(updated.theme, Theme::Dark);
        assert_eq!(updated.username.as_deref(), Some("ben"));
        assert_eq!(updated.created_at, profile.created_at);

        let cleared = store
            .update_profile(
                profile.id,
                ProfilePatch {
                    username: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(cleared.username.is_none());
        assert!(store.is_username_available("ben").available);
    }

    #[test]
    fn test_update_profile_username_conflict() {
        let mut store = memory_store();
        store
            .create_profile("u1", ProfileDraft::new("A").with_username("alex"))
            .unwrap();
        let other = store.create_profile("u2", ProfileDraft::new("B")).unwrap();

        let err = store
            .update_profile(
                other.id,
                ProfilePatch {
                    username: Some(Some("Alex".into())),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.user_message(), username::TAKEN_MESSAGE);
        assert!(store.get_profile(other.id).unwrap().username.is_none());
    }

    #[test]
    fn test_update_missing_profile() {
        let mut store = memory_store();
        let err = store
            .update_profile(Uuid::new_v4(), ProfilePatch::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_profile() {
        let mut store = memory_store();
        let mut profile = store
            .create_profile("u", ProfileDraft::new("Ben").with_username("ben"))
            .unwrap();
        store.add_link(&mut profile, github()).unwrap();

        store.delete_profile(profile.id).unwrap();
        assert_eq!(store.stats().unwrap(), StoreStats::default());
        assert_eq!(
            store.delete_profile(profile.id).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        // the username is free again
        assert!(store.is_username_available("ben").available);
    }

    #[test]
    fn test_increment_views_twice() {
        let mut store = memory_store();
        let profile = store.create_profile("u", ProfileDraft::new("Ben")).unwrap();

        store.increment_analytic(profile.id, Metric::Views).unwrap();
        let once = store.get_profile(profile.id).unwrap();
        assert_eq!(once.analytics.views, 1);
        assert_eq!(once.analytics.traffic.len(), 1);
        assert_eq!(once.analytics.traffic[0].date, analytics::day_of(now()));
        assert_eq!(once.analytics.traffic[0].views, 1);
        assert!(once.analytics.last_viewed.is_some());

        store.increment_analytic(profile.id, Metric::Views).unwrap();
        let twice = store.get_profile(profile.id).unwrap();
        assert_eq!(twice.analytics.views, 2);
        assert_eq!(twice.analytics.traffic[0].views, 2);
        assert_eq!(twice.analytics.clicks, 0);
    }

    #[test]
    fn test_increment_missing_profile() {
        let mut store = memory_store();
        let err = store
            .increment_analytic(Uuid::new_v4(), Metric::Views)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_traffic_window_drops_old_days() {
        let config = Config {
            traffic_window_days: 3,
            ..Config::default()
        };
        let mut store = Store::open_in_memory(config).unwrap();
        let profile = store.create_profile("u", ProfileDraft::new("Ben")).unwrap();

        let today = now();
        store
            .increment_analytic_at(profile.id, Metric::Views, today - chrono::Duration::days(10))
            .unwrap();
        store
            .increment_analytic_at(profile.id, Metric::Views, today - chrono::Duration::days(1))
            .unwrap();
        store.increment_analytic_at(profile.id, Metric::Views, today).unwrap();

        let loaded = store.get_profile(profile.id).unwrap();
        assert_eq!(loaded.analytics.views, 3);
        assert_eq!(loaded.analytics.traffic.len(), 2);
        assert!(loaded.analytics.traffic[0].date < loaded.analytics.traffic[1].date);
    }

    #[test]
    fn test_oversized_window_still_loads() {
        let config = Config {
            traffic_window_days: 100_000_000,
            ..Config::default()
        };
        let mut store = Store::open_in_memory(config).unwrap();
        let profile = store.create_profile("u", ProfileDraft::new("Ben")).unwrap();

        store.increment_analytic(profile.id, Metric::Views).unwrap();
        let loaded = store.get_profile(profile.id).unwrap();
        assert_eq!(loaded.analytics.traffic.len(), 1);
    }

    #[test]
    fn test_record_link_click() {
        let mut store = memory_store();
        let mut profile = store.create_profile("u", ProfileDraft::new("Ben")).unwrap();
        let link = store.add_link(&mut profile, github()).unwrap();
        store.increment_analytic(profile.id, Metric::Views).unwrap();

        let url = store.record_link_click(profile.id, link.id).unwrap();
        assert_eq!(url, "https://github.com/ben");

        let loaded = store.get_profile(profile.id).unwrap();
        assert_eq!(loaded.analytics.clicks, 1);
        assert_eq!(loaded.social_links[0].clicks, 1);
        assert_eq!(loaded.analytics.top_links[0].link_id, link.id);
        assert_eq!(loaded.analytics.platforms[0].platform, Platform::Github);
        assert_eq!(loaded.analytics.conversion_rate, 100);

        let err = store
            .record_link_click(profile.id, Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Link", .. }));
        let err = store
            .record_link_click(Uuid::new_v4(), link.id)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Profile", .. }));
    }

    #[test]
    fn test_link_edits_persist() {
        let mut store = memory_store();
        let mut profile = store.create_profile("u", ProfileDraft::new("Ben")).unwrap();
        let a = store.add_link(&mut profile, github()).unwrap();
        let b = store
            .add_link(&mut profile, LinkDraft::new("B", "https://b.dev", Platform::Custom))
            .unwrap();
        let c = store
            .add_link(&mut profile, LinkDraft::new("C", "https://c.dev", Platform::Custom))
            .unwrap();

        store.reorder_links(&mut profile, &[c.id, a.id, b.id]).unwrap();
        let loaded = store.get_profile(profile.id).unwrap();
        let ids: Vec<_> = loaded.social_links.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![c.id, a.id, b.id]);
        assert_eq!(loaded.link(a.id).unwrap().order, 1);

        store.remove_link(&mut profile, a.id).unwrap();
        let loaded = store.get_profile(profile.id).unwrap();
        let ids: Vec<_> = loaded.social_links.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![c.id, b.id]);
        assert!(editor::is_contiguous(&loaded.social_links));

        store
            .update_link(
                &mut profile,
                b.id,
                LinkPatch {
                    url: Some("https://b.example.org".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let loaded = store.get_profile(profile.id).unwrap();
        assert_eq!(loaded.link(b.id).unwrap().url, "https://b.example.org");
    }

    #[test]
    fn test_failed_edit_leaves_caller_copy_untouched() {
        let mut store = memory_store();
        let mut profile = store.create_profile("u", ProfileDraft::new("Ben")).unwrap();
        store.add_link(&mut profile, github()).unwrap();
        let before = profile.clone();

        let err = store
            .add_link(&mut profile, LinkDraft::new("Bad", "nope", Platform::Custom))
            .unwrap_err();
        assert_eq!(err.field(), Some("url"));
        assert_eq!(profile, before);
    }

    #[test]
    fn test_link_edit_on_deleted_profile() {
        let mut store = memory_store();
        let mut profile = store.create_profile("u", ProfileDraft::new("Ben")).unwrap();
        store.delete_profile(profile.id).unwrap();

        let err = store.add_link(&mut profile, github()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(profile.social_links.is_empty());
    }

    #[test]
    fn test_list_write_keeps_clicks() {
        let mut store = memory_store();
        let mut profile = store.create_profile("u", ProfileDraft::new("Ben")).unwrap();
        let link = store.add_link(&mut profile, github()).unwrap();

        store.record_link_click(profile.id, link.id).unwrap();
        store.record_link_click(profile.id, link.id).unwrap();

        // caller's copy is stale (clicks = 0); editing must not reset the counter
        store
            .update_link(
                &mut profile,
                link.id,
                LinkPatch {
                    title: Some("Code".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let loaded = store.get_profile(profile.id).unwrap();
        assert_eq!(loaded.social_links[0].clicks, 2);
        assert_eq!(loaded.social_links[0].title, "Code");
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let id = {
            let mut store = Store::open_with_config(config.clone()).unwrap();
            let mut profile = store
                .create_profile("u", ProfileDraft::new("Ben").with_username("benwright"))
                .unwrap();
            store.add_link(&mut profile, github()).unwrap();
            store.increment_analytic(profile.id, Metric::Views).unwrap();
            profile.id
        };

        let store = Store::open_with_config(config).unwrap();
        let profile = store.get_profile_by_username("benwright").unwrap();
        assert_eq!(profile.id, id);
        assert_eq!(profile.social_links.len(), 1);
        assert_eq!(profile.analytics.views, 1);
        assert_eq!(store.stats().unwrap(), StoreStats { profiles: 1, links: 1 });
    }
}
