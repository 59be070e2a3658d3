use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io::{self, Write};

use crate::cli_args::Cli;

pub fn handle_completion(shell: Shell) -> Result<()> {
    log::debug!("Generating {} completions", shell);
    write_completion(shell, &mut io::stdout())
}

fn write_completion<W: Write>(shell: Shell, out: &mut W) -> Result<()> {
    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();
    generate(shell, &mut command, bin_name, out);
    out.flush()?;
    Ok(())
}
