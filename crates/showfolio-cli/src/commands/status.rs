//! Status command handler

use anyhow::Result;

use showfolio_core::{Session, Store};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(store: &Store, session: &Session, output: &Output) -> Result<()> {
    let stats = store.stats()?;
    let config = store.config();
    let identity = session.current();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "signed_in": identity.as_ref().map(|i| &i.email),
                    "data_dir": config.data_dir,
                    "database": config.sqlite_path(),
                    "traffic_window_days": config.traffic_window_days,
                    "counts": {
                        "profiles": stats.profiles,
                        "links": stats.links
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{} {}", stats.profiles, stats.links);
        }
        OutputFormat::Human => {
            println!("ShowFolio Status");
            println!("================");
            println!();
            println!("Account:");
            match identity {
                Some(ref identity) => {
                    println!("  Signed in as: {} <{}>", identity.display_name, identity.email)
                }
                None => println!("  Not signed in"),
            }
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Database: {}", config.sqlite_path().display());
            println!();
            println!("Analytics:");
            println!("  Traffic window: {} day(s)", config.traffic_window_days);
            println!();
            println!("Contents:");
            println!("  Profiles: {}", stats.profiles);
            println!("  Links:    {}", stats.links);
        }
    }

    Ok(())
}
