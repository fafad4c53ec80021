use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "quotebot")]
#[command(
    about = "Crypto quote lookups: answers SYMBOL-CONVERT commands such as BTC-USD",
    long_about = "Crypto quote lookups: answers SYMBOL-CONVERT commands such as BTC-USD\n\nWith COMMAND arguments, prints one reply per command and exits.\nWithout them, reads commands from stdin until EOF, `exit` or `quit`.\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default probe path when --config is not provided:\n    1. $XDG_CONFIG_HOME/quotebot/config.toml\n    2. ~/.config/quotebot/config.toml"
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log redacted upstream HTTP exchanges to stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Commands to answer, e.g. BTC-USD. Starts the prompt when omitted.
    #[arg(value_name = "COMMAND")]
    pub commands: Vec<String>,
}
