use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};
use pixie_core::samples::{OUTPUT_EXTENSION, source_files};
use pixie_core::{CoreError, compile_source, parse, tokenize};

/// Compile pixie source into Lua.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Source file; reads stdin when omitted.
    #[arg(short, long, value_name = "PATH", conflicts_with = "dir")]
    input: Option<PathBuf>,

    /// Output file; writes stdout when omitted.
    #[arg(short, long, value_name = "PATH", conflicts_with = "dir")]
    output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "lua",
        help = "Output format: lua, tokens, ast"
    )]
    emit: String,

    #[arg(
        long,
        value_name = "PATH",
        help = "Compile every .pixie file under PATH to a sibling .lua file"
    )]
    dir: Option<PathBuf>,

    /// Raise the log level; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli)
}

/// `RUST_LOG` applies unless `-v` was given.
fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    let level = match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.init();
}

fn execute(cli: Cli) -> Result<()> {
    if let Some(dir) = &cli.dir {
        return compile_dir(dir);
    }

    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    let output = emit(&source, &cli.emit)?;
    match &cli.output {
        Some(path) => write_output(path, &output)?,
        None => io::stdout()
            .write_all(output.as_bytes())
            .context("failed to write stdout")?,
    }
    Ok(())
}

fn emit(source: &str, format: &str) -> Result<String, CoreError> {
    match format {
        "lua" => compile_source(source),
        "tokens" => {
            let tokens = tokenize(source).collect::<Result<Vec<_>, _>>()?;
            Ok(tokens.iter().map(|token| format!("{token}\n")).collect())
        }
        "ast" => Ok(format!("{:#?}\n", parse(source)?)),
        other => Err(CoreError::UnsupportedFormat(other.to_string())),
    }
}

fn compile_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(CoreError::MissingSamples(dir.to_path_buf()).into());
    }

    let files = source_files(dir);
    debug!("found {} source files under {}", files.len(), dir.display());
    for path in files {
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read input file {}", path.display()))?;
        let lua = compile_source(&source)
            .with_context(|| format!("failed to compile {}", path.display()))?;
        let output = path.with_extension(OUTPUT_EXTENSION);
        write_output(&output, &lua)?;
        info!("{} -> {}", path.display(), output.display());
    }
    Ok(())
}

fn write_output(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, text)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}
