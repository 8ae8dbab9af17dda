//! Visitor command handlers
//!
//! These act as an anonymous visitor: no sign-in is needed, only active
//! profiles and links are reachable, and every call is counted.

use anyhow::Result;

use showfolio_core::{Metric, Store};

use crate::commands::link::resolve_link;
use crate::output::{Output, OutputFormat};

/// Open a public profile and count the view
pub fn view(store: &mut Store, username: String, output: &Output) -> Result<()> {
    let profile = store.public_profile(&username)?;
    store.increment_analytic(profile.id, Metric::Views)?;

    output.print_public_profile(&profile);
    Ok(())
}

/// Follow a link on a public profile and count the click
pub fn click(store: &mut Store, username: String, link: String, output: &Output) -> Result<()> {
    let profile = store.public_profile(&username)?;
    let link_id = resolve_link(&profile, &link)?;
    let url = store.record_link_click(profile.id, link_id)?;

    match output.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({"status": "success", "link_id": link_id, "url": url})
        ),
        OutputFormat::Quiet | OutputFormat::Human => println!("{}", url),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use showfolio_core::{Config, Error, ErrorKind, LinkDraft, Platform, ProfileDraft, ProfilePatch};

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    fn kind(err: &anyhow::Error) -> Option<ErrorKind> {
        err.downcast_ref::<Error>().map(Error::kind)
    }

    fn store_with_links() -> (Store, showfolio_core::Profile) {
        let mut store = Store::open_in_memory(Config::default()).unwrap();
        let mut profile = store
            .create_profile("ben", ProfileDraft::new("Ben").with_username("benwright"))
            .unwrap();
        store
            .add_link(
                &mut profile,
                LinkDraft::new("GitHub", "https://github.com/ben", Platform::Github),
            )
            .unwrap();
        store
            .add_link(
                &mut profile,
                LinkDraft::new("Blog", "https://ben.dev", Platform::Custom),
            )
            .unwrap();
        (store, profile)
    }

    #[test]
    fn test_view_counts_a_view() {
        let (mut store, profile) = store_with_links();

        view(&mut store, "BenWright".into(), &quiet()).unwrap();
        view(&mut store, "benwright".into(), &quiet()).unwrap();

        assert_eq!(store.get_profile(profile.id).unwrap().analytics.views, 2);
    }

    #[test]
    fn test_view_of_hidden_profile_is_not_found() {
        let (mut store, profile) = store_with_links();
        store
            .update_profile(
                profile.id,
                ProfilePatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let err = view(&mut store, "benwright".into(), &quiet()).unwrap_err();
        assert_eq!(kind(&err), Some(ErrorKind::NotFound));
        assert_eq!(store.get_profile(profile.id).unwrap().analytics.views, 0);
    }

    #[test]
    fn test_click_counts_link_and_profile() {
        let (mut store, profile) = store_with_links();
        let github = profile.social_links[0].id;

        click(&mut store, "benwright".into(), github.to_string(), &quiet()).unwrap();

        let loaded = store.get_profile(profile.id).unwrap();
        assert_eq!(loaded.analytics.clicks, 1);
        assert_eq!(loaded.link(github).unwrap().clicks, 1);
    }

    #[test]
    fn test_click_on_hidden_link_is_not_found() {
        let (mut store, mut profile) = store_with_links();
        let blog = profile.social_links[1].id;
        store.set_link_active(&mut profile, blog, false).unwrap();

        let err = click(&mut store, "benwright".into(), blog.to_string(), &quiet()).unwrap_err();
        assert_eq!(kind(&err), Some(ErrorKind::NotFound));

        let loaded = store.get_profile(profile.id).unwrap();
        assert_eq!(loaded.analytics.clicks, 0);
        assert_eq!(loaded.link(blog).unwrap().clicks, 0);
    }
}
