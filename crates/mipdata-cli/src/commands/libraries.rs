//! Libraries command - list the known benchmark libraries.

use anyhow::Result;
use clap::Args as ClapArgs;
use serde::Serialize;

use mipdata_core::{Encoding, Library};

use crate::output::create_table;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output format for libraries command
#[derive(Serialize)]
struct LibraryInfo {
    name: &'static str,
    family: &'static str,
    website: &'static str,
    table_url: String,
    supported: bool,
}

pub fn execute(args: &Args) -> Result<()> {
    let libraries: Vec<LibraryInfo> = Library::ALL
        .into_iter()
        .map(|library| LibraryInfo {
            name: library.as_str(),
            family: library.family().as_str(),
            website: library.website(),
            table_url: library.table_url(),
            supported: Encoding::for_library(library).is_ok(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&libraries)?);
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["Library", "Family", "Metadata", "Supported"]);
    for info in &libraries {
        table.add_row(vec![
            info.name,
            info.family,
            info.table_url.as_str(),
            if info.supported { "yes" } else { "no" },
        ]);
    }
    println!("{table}");
    Ok(())
}
