//! Link list editor
//!
//! Structural edits on a profile's in-memory link list. Every operation
//! leaves `order` values contiguous and zero-based, and the list sorted by
//! them. Persisting the result is the store's job.

use std::collections::HashSet;

use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{now, Link, LinkDraft, LinkPatch, Profile};

/// Add a link at the end of the list
pub fn add_link(profile: &mut Profile, draft: LinkDraft) -> Result<Link> {
    let title = validate_title(&draft.title)?;
    let url = validate_url(&draft.url)?;

    let mut link = Link::new(
        profile.id,
        title,
        url,
        draft.platform,
        profile.social_links.len() as u32,
    );
    link.icon = draft.icon.filter(|i| !i.trim().is_empty());

    profile.social_links.push(link.clone());
    profile.updated_at = now();
    Ok(link)
}

/// Remove a link and close the gap it leaves
pub fn remove_link(profile: &mut Profile, link_id: Uuid) -> Result<Link> {
    let pos = position(profile, link_id)?;
    let removed = profile.social_links.remove(pos);
    renumber(&mut profile.social_links);
    profile.updated_at = now();
    Ok(removed)
}

/// Apply a new display sequence
///
/// `ids` must name every current link exactly once.
pub fn reorder(profile: &mut Profile, ids: &[Uuid]) -> Result<()> {
    if ids.len() != profile.social_links.len() {
        return Err(Error::validation(
            "order",
            format!(
                "Expected {} link ids, got {}",
                profile.social_links.len(),
                ids.len()
            ),
        ));
    }

    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(*id) {
            return Err(Error::validation("order", format!("Link {} listed twice", id)));
        }
        if profile.link(*id).is_none() {
            return Err(Error::not_found("Link", id));
        }
    }

    let stamp = now();
    for (index, id) in ids.iter().enumerate() {
        if let Some(link) = profile.social_links.iter_mut().find(|l| l.id == *id) {
            if link.order != index as u32 {
                link.order = index as u32;
                link.updated_at = stamp;
            }
        }
    }
    profile.social_links.sort_by_key(|l| l.order);
    profile.updated_at = stamp;
    Ok(())
}

/// Merge a partial update into one link
pub fn update_link(profile: &mut Profile, link_id: Uuid, patch: LinkPatch) -> Result<Link> {
    let pos = position(profile, link_id)?;

    let title = patch.title.as_deref().map(validate_title).transpose()?;
    let url = patch.url.as_deref().map(validate_url).transpose()?;

    let link = &mut profile.social_links[pos];
    if let Some(title) = title {
        link.title = title;
    }
    if let Some(url) = url {
        link.url = url;
    }
    if let Some(platform) = patch.platform {
        link.platform = platform;
    }
    if let Some(icon) = patch.icon {
        link.icon = icon.filter(|i| !i.trim().is_empty());
    }
    if let Some(active) = patch.is_active {
        link.is_active = active;
    }

    let stamp = now();
    link.updated_at = stamp;
    let updated = link.clone();
    profile.updated_at = stamp;
    Ok(updated)
}

/// Show or hide a link
pub fn set_active(profile: &mut Profile, link_id: Uuid, active: bool) -> Result<Link> {
    update_link(
        profile,
        link_id,
        LinkPatch {
            is_active: Some(active),
            ..Default::default()
        },
    )
}

/// Sort by stored order (creation time breaks ties) and renumber
pub fn normalize(links: &mut [Link]) {
    links.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    renumber(links);
}

/// True when orders are exactly 0..n in list order
pub fn is_contiguous(links: &[Link]) -> bool {
    links
        .iter()
        .enumerate()
        .all(|(i, link)| link.order == i as u32)
}

/// Check a link destination and return it trimmed
pub fn validate_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("url", "URL is required"));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| Error::validation("url", format!("Invalid URL '{}': {}", trimmed, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::validation(
            "url",
            "URL must start with http:// or https://",
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(Error::validation("url", "URL must include a host"));
    }

    Ok(trimmed.to_string())
}

fn validate_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::validation("title", "Link title is required"));
    }
    Ok(title.to_string())
}

fn position(profile: &Profile, link_id: Uuid) -> Result<usize> {
    profile
        .social_links
        .iter()
        .position(|l| l.id == link_id)
        .ok_or_else(|| Error::not_found("Link", link_id))
}

fn renumber(links: &mut [Link]) {
    let stamp = now();
    for (i, link) in links.iter_mut().enumerate() {
        if link.order != i as u32 {
            link.order = i as u32;
            link.updated_at = stamp;
        }
    }
}
