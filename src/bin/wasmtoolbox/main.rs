use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use patharg::InputArg;
use std::io::{self, BufReader, BufWriter, Write};
use std::process::exit;

/// Tools for working with WebAssembly modules.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    tool: Tool,
}

#[derive(Subcommand)]
enum Tool {
    /// Convert a module in the binary format to the text format.
    Wasm2wat {
        /// The module to convert. If not provided or is '-', read from
        /// standard input.
        #[arg(default_value_t)]
        input: InputArg,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        exit(if err.use_stderr() { 1 } else { 0 });
    });

    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.tool {
        Tool::Wasm2wat { input } => {
            let reader = input
                .open()
                .with_context(|| format!("failed to open `{input}`"))?;
            let module = wasmtoolbox::decode_module(BufReader::new(reader))
                .context("failed to decode module")?;

            let mut out = BufWriter::new(io::stdout().lock());
            wasmtoolbox::TextWriter::new(&mut out)
                .write_module(&module)
                .context("failed to write module")?;
            writeln!(out)?;
            out.flush()?;
            Ok(())
        }
    }
}
