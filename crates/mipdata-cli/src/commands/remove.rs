//! Remove command - delete downloaded instance files.

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use mipdata_core::{Catalog, Format, Library};

use super::find_instances;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Library the instances belong to
    pub library: Library,

    /// Instance names
    #[arg(required = true)]
    pub names: Vec<String>,

    /// File format to remove (default: the first format the instance offers)
    #[arg(long)]
    pub format: Option<Format>,

    /// Sub-directory the files were downloaded into
    #[arg(long, value_name = "DIR")]
    pub subdir: Option<String>,
}

#[instrument(level = "info", name = "cmd::remove", skip_all, fields(library = %args.library, count = args.names.len()))]
pub fn execute(catalog: &Catalog, args: &Args) -> Result<()> {
    for mut instance in find_instances(catalog, args.library, &args.names)? {
        match catalog.locate(&mut instance, args.format, args.subdir.as_deref())? {
            Some(path) => {
                instance
                    .remove()
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                println!("Removed {}", path.display());
            }
            None => tracing::warn!("{} is not downloaded", instance.name),
        }
    }
    Ok(())
}
