//! Download command - fetch instance files into the cache.
//!
//! Files already on disk are left alone unless `--refresh` is given.
//!
//! # Examples
//!
//! ```bash
//! mipdata download miplib_benchmark air05 markshare_4_0
//!
//! # Keep a private copy under a sub-directory of the cache
//! mipdata download miplib_benchmark air05 --subdir scratch
//! ```

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use mipdata_core::{Catalog, DownloadRequest, Format, Library};

use super::find_instances;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Library the instances belong to
    pub library: Library,

    /// Instance names
    #[arg(required = true)]
    pub names: Vec<String>,

    /// File format (default: the first format the instance offers)
    #[arg(long)]
    pub format: Option<Format>,

    /// Download again even if the file exists
    #[arg(long)]
    pub refresh: bool,

    /// Sub-directory below the library's cache directory
    #[arg(long, value_name = "DIR")]
    pub subdir: Option<String>,
}

#[instrument(level = "info", name = "cmd::download", skip_all, fields(library = %args.library, count = args.names.len()))]
pub fn execute(catalog: &Catalog, args: &Args) -> Result<()> {
    let instances = find_instances(catalog, args.library, &args.names)?;

    let mut request = DownloadRequest::new().refresh(args.refresh);
    if let Some(format) = args.format {
        request = request.format(format);
    }
    if let Some(subdir) = &args.subdir {
        request = request.subdir(subdir.clone());
    }

    for mut instance in instances {
        let outcome = catalog
            .download(&mut instance, &request)
            .with_context(|| format!("Failed to download {}", instance.name))?;
        println!("{}", outcome.path().display());
    }
    Ok(())
}
