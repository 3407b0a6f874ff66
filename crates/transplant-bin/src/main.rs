use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use color_eyre::eyre::Context;
use color_eyre::Result;
use transplant::RunContext;

/// Serialize a directory tree to stdout, or reconstruct one from stdin.
#[derive(Parser, Debug)]
#[clap(group(
    ArgGroup::new("mode")
        .args(["serialize", "deserialize"])
        .required(true)
))]
struct Args {
    /// Serialize the tree at `-p` to stdout
    #[arg(short = 's')]
    serialize: bool,

    /// Reconstruct a tree from stdin into `-p`
    #[arg(short = 'd')]
    deserialize: bool,

    /// Permit overwriting existing files and entering existing directories
    #[arg(short = 'c', requires = "deserialize")]
    clobber: bool,

    /// Base directory
    #[arg(short = 'p')]
    path: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let base = args.path.unwrap_or_else(|| PathBuf::from("."));
    let mut ctx = RunContext::new(
        std::os::unix::ffi::OsStrExt::as_bytes(base.as_os_str()),
        args.clobber,
    )
    .wrap_err("initializing base path")?;

    let result: Result<()> = if args.serialize {
        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        transplant::serialize(&mut ctx, &mut out).map_err(Into::into)
    } else {
        let stdin = std::io::stdin();
        let mut input = BufReader::new(stdin.lock());
        transplant::deserialize(&mut ctx, &mut input).map_err(Into::into)
    };

    if let Err(err) = &result {
        eprintln!("transplant: {err}");
    }
    result
}
