//! Shell completion generation.
//!
//! ```bash
//! source <(dfr completions bash)
//! dfr completions fish > ~/.config/fish/completions/dfr.fish
//! ```

use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;

use crate::cli::Cli;

pub fn execute(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "dfr", &mut io::stdout());
}
