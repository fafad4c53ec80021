mod args;
mod repl;

pub use args::CliArgs;
pub use repl::{PROMPT, run_commands, run_repl};
