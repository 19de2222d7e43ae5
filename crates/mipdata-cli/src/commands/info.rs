//! Info command - show the metadata of a single instance.
//!
//! # Examples
//!
//! ```bash
//! mipdata info miplib_benchmark air05
//! mipdata info miplib_benchmark air05 --json | jq .primal
//! ```

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use mipdata_core::{Catalog, Library};

use super::find_instance;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Library the instance belongs to
    pub library: Library,

    /// Instance name
    pub name: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[instrument(level = "info", name = "cmd::info", skip_all, fields(library = %args.library, instance = %args.name))]
pub fn execute(catalog: &Catalog, args: &Args) -> Result<()> {
    let mut instance = find_instance(catalog, args.library, &args.name)?;

    if !instance.formats.is_empty() {
        catalog.locate(&mut instance, None, None)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&instance)?);
    } else {
        println!("{instance}");
    }
    Ok(())
}
