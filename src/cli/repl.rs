use crate::lookup::LookupService;
use crate::quote::provider::QuoteFetcher;
use anyhow::Result;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::io::{self, Write};

pub const PROMPT: &str = "quote> ";

#[derive(Debug, PartialEq, Eq)]
enum LineAction<'a> {
    Lookup(&'a str),
    Skip,
    Exit,
}

/// Reads commands from the line editor and prints a reply for each, until
/// EOF or `exit`/`quit`. Ctrl-C discards the current line.
pub async fn run_repl<F: QuoteFetcher>(service: &LookupService<F>) -> Result<()> {
    let mut rl = Editor::<(), DefaultHistory>::new()?;

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        match classify_line(&line) {
            LineAction::Exit => break,
            LineAction::Skip => continue,
            LineAction::Lookup(command) => {
                let _ = rl.add_history_entry(command);
                print_reply(&service.reply(command).await)?;
            }
        }
    }

    Ok(())
}

pub async fn run_commands<F: QuoteFetcher>(
    service: &LookupService<F>,
    commands: &[String],
) -> Result<()> {
    for command in commands {
        print_reply(&service.reply(command).await)?;
    }
    Ok(())
}

fn classify_line(line: &str) -> LineAction<'_> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        LineAction::Exit
    } else if line.is_empty() {
        LineAction::Skip
    } else {
        LineAction::Lookup(line)
    }
}

fn print_reply(reply: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", reply.trim_end())?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
