//! Profile command handlers

use anyhow::{bail, Result};
use uuid::Uuid;

use showfolio_core::{username, Error, Identity, Profile, ProfileDraft, ProfilePatch, Store, Theme};

use crate::output::{short_id, Output};
use crate::prompt::confirm;

/// Fields accepted by `profile create`
pub struct CreateArgs {
    pub title: String,
    pub username: Option<String>,
    pub description: Option<String>,
    pub theme: Option<Theme>,
    pub image: Option<String>,
}

/// Create a new profile
pub fn create(
    store: &mut Store,
    owner: &Identity,
    args: CreateArgs,
    output: &Output,
) -> Result<()> {
    let draft = ProfileDraft {
        title: args.title,
        description: args.description,
        username: args.username,
        theme: args.theme,
        profile_image: args.image,
        links: Vec::new(),
    };
    let profile = store.create_profile(&owner.id, draft)?;

    output.success(&format!("Created profile: {}", profile.id));
    output.print_profile(&profile);
    Ok(())
}

/// List the signed-in user's profiles
pub fn list(store: &Store, owner: &Identity, output: &Output) -> Result<()> {
    let profiles = store.get_user_profiles(&owner.id)?;
    output.print_profiles(&profiles);
    Ok(())
}

/// Show one profile
pub fn show(store: &Store, owner: &Identity, profile: String, output: &Output) -> Result<()> {
    let profile = resolve(store, owner, &profile)?;
    output.print_profile(&profile);
    Ok(())
}

/// Apply a partial update
pub fn update(
    store: &mut Store,
    owner: &Identity,
    profile: String,
    patch: ProfilePatch,
    output: &Output,
) -> Result<()> {
    let profile = resolve(store, owner, &profile)?;
    let updated = store.update_profile(profile.id, patch)?;

    output.success(&format!("Updated profile: {}", updated.id));
    output.print_profile(&updated);
    Ok(())
}

/// Delete a profile
pub fn delete(
    store: &mut Store,
    owner: &Identity,
    profile: String,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let profile = resolve(store, owner, &profile)?;

    if !yes && output.should_prompt() {
        println!(
            "Delete profile: {} - {} ({} link(s), {} view(s))",
            short_id(&profile.id),
            profile.title,
            profile.social_links.len(),
            profile.analytics.views
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete_profile(profile.id)?;

    output.success(&format!("Deleted profile: {}", profile.id));
    Ok(())
}

/// Check whether a username can be claimed
pub fn check_username(store: &Store, wanted: String, output: &Output) -> Result<()> {
    let availability = store.is_username_available(&wanted);
    output.print_availability(&username::format(&wanted), &availability);
    Ok(())
}

/// Find one of the owner's profiles by id, id prefix or username
pub fn resolve(store: &Store, owner: &Identity, arg: &str) -> Result<Profile> {
    let arg = arg.trim();
    if let Ok(id) = Uuid::parse_str(arg) {
        return Ok(store.get_owned_profile(&owner.id, id)?);
    }

    let wanted = username::format(arg);
    let profiles = store.get_user_profiles(&owner.id)?;
    if let Some(profile) = profiles
        .iter()
        .find(|p| p.username.as_deref() == Some(wanted.as_str()))
    {
        return Ok(profile.clone());
    }

    let mut matches: Vec<_> = profiles
        .into_iter()
        .filter(|p| p.id.to_string().starts_with(&wanted))
        .collect();

    match matches.len() {
        0 => Err(Error::not_found("Profile", arg).into()),
        1 => Ok(matches.remove(0)),
        _ => {
            eprintln!("Multiple profiles match '{}':", arg);
            for profile in &matches {
                eprintln!("  {} - {}", profile.id, profile.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}
