use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tabdb::{Config, Session};
use tracing_subscriber::{EnvFilter, fmt};

/// Interactive shell over a tabdb storage root.
///
/// Commands may span several lines and run once a line ends with `;`.
/// `.tables` lists the tables of the selected database, `.memory` prints its
/// in-memory size and `.exit` or `.quit` leaves.
#[derive(Parser, Debug)]
#[command(name = "tabdb", version, about)]
struct Args {
    /// Directory holding one folder per database
    #[arg(long, value_name = "DIR", env = "TABDB_ROOT", default_value = tabdb::config::DEFAULT_STORAGE_ROOT)]
    root: PathBuf,

    /// Database to select at startup
    database: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so that responses on stdout stay clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut session = Session::open(Config::new(&args.root))
        .with_context(|| format!("cannot open storage root {}", args.root.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(name) = &args.database {
        writeln!(out, "{}", session.execute(&format!("USE {name};")))?;
    }

    let mut buffer = String::new();
    prompt(&mut out, buffer.is_empty())?;
    for line in io::stdin().lock().lines() {
        let line = line.context("cannot read from stdin")?;
        let trimmed = line.trim();

        if buffer.is_empty() && trimmed.starts_with('.') {
            match trimmed {
                ".exit" | ".quit" => break,
                ".tables" => match session.current_database() {
                    Some(db) => {
                        for table in db.list_tables() {
                            writeln!(out, "{table}")?;
                        }
                    }
                    None => writeln!(out, "no database selected")?,
                },
                ".memory" => match session.current_database() {
                    Some(db) => writeln!(out, "{} bytes", db.memory_footprint())?,
                    None => writeln!(out, "no database selected")?,
                },
                other => writeln!(out, "unknown meta command {other}")?,
            }
            prompt(&mut out, true)?;
            continue;
        }

        if !trimmed.is_empty() {
            if !buffer.is_empty() {
                buffer.push(' ');
            }
            buffer.push_str(trimmed);
        }
        if buffer.ends_with(';') {
            writeln!(out, "{}", session.execute(&buffer))?;
            buffer.clear();
        }
        prompt(&mut out, buffer.is_empty())?;
    }
    Ok(())
}

fn prompt(out: &mut impl Write, fresh: bool) -> io::Result<()> {
    write!(out, "{}", if fresh { "tabdb> " } else { "   ...> " })?;
    out.flush()
}
