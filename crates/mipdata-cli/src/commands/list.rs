//! List command - show the instances of a library.
//!
//! # Examples
//!
//! ```bash
//! # Whole benchmark set
//! mipdata list miplib_benchmark
//!
//! # Filtered, as JSON for scripting
//! mipdata list miplib_collection -f 'n_vars < 1000' -f '"feasibility" in tags' --json
//! ```

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use mipdata_core::{Catalog, Library, TableSource};

use crate::output::{create_table, format_bound};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Library to list (see `mipdata libraries`)
    pub library: Library,

    /// Filter expression over cache columns, e.g. 'n_vars < 1000' (repeatable, all must hold)
    #[arg(short, long = "filter", value_name = "EXPR")]
    pub filters: Vec<String>,

    /// Fetch the metadata table again even if it is cached
    #[arg(long)]
    pub refresh: bool,

    /// Show at most this many instances
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[instrument(level = "info", name = "cmd::list", skip_all, fields(library = %args.library))]
pub fn execute(catalog: &Catalog, args: &Args, quiet: bool) -> Result<()> {
    let (mut instances, source) = catalog.load_with_source(args.library, &args.filters, args.refresh)?;
    let matched = instances.len();
    if let Some(limit) = args.limit {
        instances.truncate(limit);
    }

    for instance in &mut instances {
        if !instance.formats.is_empty() {
            catalog.locate(instance, None, None)?;
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&instances)?);
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec![
        "Name", "Type", "Status", "Objective", "Primal", "Vars", "Cons", "Nonzeros", "Local",
    ]);
    for instance in &instances {
        table.add_row(vec![
            instance.name.clone(),
            instance.problem_type.to_string(),
            instance.status.map_or_else(|| "-".to_string(), |s| s.to_string()),
            instance.optimization_status.to_string(),
            format_bound(instance.primal),
            instance.n_vars.to_string(),
            instance.n_cons.to_string(),
            instance.n_nz.to_string(),
            if instance.is_downloaded() { "yes" } else { "" }.to_string(),
        ]);
    }
    println!("{table}");
    if quiet {
        return Ok(());
    }

    let source = match source {
        TableSource::Fetched => "fetched",
        TableSource::Cached => "cached",
        TableSource::StaleFallback => "stale cache",
    };
    eprintln!("{} of {matched} instances ({source})", instances.len());
    Ok(())
}
