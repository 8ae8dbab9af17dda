//! Link command handlers
//!
//! Every command edits one of the signed-in user's profiles. Links are
//! addressed by full UUID or a unique prefix.

use anyhow::{bail, Result};
use uuid::Uuid;

use showfolio_core::{Error, Identity, LinkDraft, LinkPatch, Profile, Store};

use crate::commands::profile::resolve;
use crate::output::{short_id, Output};

/// Append a link to a profile
pub fn add(
    store: &mut Store,
    owner: &Identity,
    profile: String,
    draft: LinkDraft,
    output: &Output,
) -> Result<()> {
    let mut profile = resolve(store, owner, &profile)?;
    let link = store.add_link(&mut profile, draft)?;

    output.success(&format!("Added link: {}", link.id));
    output.print_link(&link);
    Ok(())
}

/// Apply a partial update to a link
pub fn update(
    store: &mut Store,
    owner: &Identity,
    profile: String,
    link: String,
    patch: LinkPatch,
    output: &Output,
) -> Result<()> {
    let mut profile = resolve(store, owner, &profile)?;
    let link_id = resolve_link(&profile, &link)?;
    let link = store.update_link(&mut profile, link_id, patch)?;

    output.success(&format!("Updated link: {}", link.id));
    output.print_link(&link);
    Ok(())
}

/// Remove a link from a profile
pub fn remove(
    store: &mut Store,
    owner: &Identity,
    profile: String,
    link: String,
    output: &Output,
) -> Result<()> {
    let mut profile = resolve(store, owner, &profile)?;
    let link_id = resolve_link(&profile, &link)?;
    let removed = store.remove_link(&mut profile, link_id)?;

    output.success(&format!("Removed link: {} - {}", short_id(&removed.id), removed.title));
    Ok(())
}

/// Put a profile's links in a new order
pub fn reorder(
    store: &mut Store,
    owner: &Identity,
    profile: String,
    links: Vec<String>,
    output: &Output,
) -> Result<()> {
    let mut profile = resolve(store, owner, &profile)?;
    let ids = links
        .iter()
        .map(|arg| resolve_link(&profile, arg))
        .collect::<Result<Vec<_>>>()?;
    store.reorder_links(&mut profile, &ids)?;

    output.success(&format!("Reordered {} link(s)", ids.len()));
    if !output.is_quiet() {
        output.print_profile(&profile);
    }
    Ok(())
}

/// Show or hide a link
pub fn toggle(
    store: &mut Store,
    owner: &Identity,
    profile: String,
    link: String,
    output: &Output,
) -> Result<()> {
    let mut profile = resolve(store, owner, &profile)?;
    let link_id = resolve_link(&profile, &link)?;
    let active = profile
        .link(link_id)
        .map(|l| !l.is_active)
        .unwrap_or(true);
    let link = store.set_link_active(&mut profile, link_id, active)?;

    let state = if link.is_active { "visible" } else { "hidden" };
    output.success(&format!("Link {} is now {}", short_id(&link.id), state));
    Ok(())
}

/// Parse a link ID (supports full UUID or prefix)
pub fn resolve_link(profile: &Profile, arg: &str) -> Result<Uuid> {
    let arg = arg.trim().to_lowercase();

    // Try full UUID first
    if let Ok(uuid) = Uuid::parse_str(&arg) {
        return match profile.link(uuid) {
            Some(_) => Ok(uuid),
            None => Err(Error::not_found("Link", uuid).into()),
        };
    }

    // Try prefix match
    let matches: Vec<_> = profile
        .social_links
        .iter()
        .filter(|l| l.id.to_string().starts_with(&arg))
        .collect();

    match matches.len() {
        0 => Err(Error::not_found("Link", arg).into()),
        1 => Ok(matches[0].id),
        _ => {
            eprintln!("Multiple links match '{}':", arg);
            for link in &matches {
                eprintln!("  {} - {}", link.id, link.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}
