pub mod completions;
pub mod download;
pub mod info;
pub mod libraries;
pub mod list;
pub mod remove;

use anyhow::{Result, anyhow};

use mipdata_core::{Catalog, Instance, Library};

/// Load the named instances of `library` from the cached table, in the
/// order given. Fails on the first name the library does not have.
pub fn find_instances(catalog: &Catalog, library: Library, names: &[String]) -> Result<Vec<Instance>> {
    let all = catalog.load::<&str>(library, &[], false)?;
    names.iter().map(|name| pick(&all, library, name)).collect()
}

/// Load a single named instance of `library`.
pub fn find_instance(catalog: &Catalog, library: Library, name: &str) -> Result<Instance> {
    let all = catalog.load::<&str>(library, &[], false)?;
    pick(&all, library, name)
}

fn pick(all: &[Instance], library: Library, name: &str) -> Result<Instance> {
    all.iter()
        .find(|i| i.name == name)
        .cloned()
        .ok_or_else(|| anyhow!("Instance {name} not found in {library}"))
}
