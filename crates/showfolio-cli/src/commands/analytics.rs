//! Analytics command handler

use anyhow::Result;

use showfolio_core::{Identity, Store};

use crate::commands::profile::resolve;
use crate::output::Output;

/// Show the analytics of one of the owner's profiles
pub fn show(store: &Store, owner: &Identity, profile: String, output: &Output) -> Result<()> {
    let profile = resolve(store, owner, &profile)?;
    output.print_analytics(&profile);
    Ok(())
}
