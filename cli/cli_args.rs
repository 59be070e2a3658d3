use clap::{Args, Parser};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "procat",
    author,
    version,
    about = "Concatenate a project's text files into one annotated snapshot.",
    long_about = "procat walks a project directory and concatenates every text file into a single \nstream, wrapping each file in '// Start <path>' / '// End <path>' markers. \nFiles ignored by .gitignore or .procatignore are left out; an include file \nswitches to whitelist mode.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  procat . snapshot.txt\n  procat -c ~/code/app -e .lock,.svg\n  procat --include procat.include --force ."
)]
pub struct Cli {
    #[arg(
        value_name = "PROJECT_DIR",
        required_unless_present = "completions",
        help = "Directory to scan."
    )]
    pub project_dir: Option<PathBuf>,

    #[arg(
        value_name = "OUTPUT_FILE",
        help = "Write the result to this file instead of standard output."
    )]
    pub output_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "Copy the result to the system clipboard (output file is ignored).",
        help_heading = "Output Control"
    )]
    pub clipboard: bool,

    #[arg(
        short,
        long,
        help = "Only list the files that would be included.",
        help_heading = "Output Control"
    )]
    pub list: bool,

    #[clap(flatten)]
    pub filters: FilterOpts,

    #[clap(flatten)]
    pub config: ConfigOpts,

    #[arg(
        long,
        value_name = "SHELL",
        value_enum,
        help = "Print a shell completion script and exit."
    )]
    pub completions: Option<Shell>,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase message verbosity (-v, -vv, -vvv).")]
    pub verbose: u8,

    #[arg(short, long, help = "Silence informational messages and warnings.")]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterOpts {
    #[arg(
        short = 'e',
        long = "exclude",
        value_name = "EXTENSIONS",
        action = clap::ArgAction::Append,
        help = "Comma-separated file extensions to leave out (e.g. '.md,.lock').",
        help_heading = "Filtering"
    )]
    pub exclude: Vec<String>,

    #[arg(
        short = 'i',
        long = "include",
        value_name = "FILE",
        help = "Whitelist file; only files matching its patterns are included.",
        help_heading = "Filtering"
    )]
    pub include: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        help = "Include whitelisted files even when .gitignore ignores them.",
        help_heading = "Filtering"
    )]
    pub force: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOpts {
    #[arg(
        long = "config",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help = "Path of the TOML config file (default: <PROJECT_DIR>/procat.toml).",
        help_heading = "Configuration"
    )]
    pub config_file: Option<PathBuf>,

    #[arg(
        long,
        conflicts_with = "config_file",
        help = "Do not load any TOML config file.",
        help_heading = "Configuration"
    )]
    pub no_config: bool,
}
