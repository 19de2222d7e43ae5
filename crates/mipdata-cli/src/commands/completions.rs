//! Shell completion generation for the mipdata CLI.
//!
//! # Examples
//!
//! ```bash
//! # Bash (add to ~/.bashrc)
//! eval "$(mipdata completions bash)"
//!
//! # Fish (save to completions directory)
//! mipdata completions fish > ~/.config/fish/completions/mipdata.fish
//! ```

use std::io;

use anyhow::Result;
use clap::{Args as ClapArgs, CommandFactory};
use clap_complete::{Shell, generate};

use crate::Cli;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn execute(args: &Args) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "mipdata", &mut io::stdout());
    Ok(())
}
