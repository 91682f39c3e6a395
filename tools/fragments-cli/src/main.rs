//! Fragments command-line tool
//!
//! Dumps the contents of a container file, or converts an OBJ file into one.
//!
//! ```text
//! fragments dump model.frag --details
//! fragments obj building.obj -o building.frag --compressed
//! ```

#![forbid(unsafe_code)]

mod obj;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fragments::{
    CompressionMode, DumpOptions, ExportSettings, Exporter, ReportSink, compression,
    decode_container, dump_fragments,
};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "fragments", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the contents of a container file
    Dump {
        /// Container file to inspect
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Also list shell points and profiles
        #[arg(short, long)]
        details: bool,

        /// How the file was written
        #[arg(short, long, value_enum, default_value_t = InputMode::Auto)]
        mode: InputMode,
    },
    /// Convert an OBJ file; each OBJ object becomes one element
    Obj {
        /// OBJ file to convert
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Container file to write
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Compress the container
        #[arg(short, long)]
        compressed: bool,

        /// Export settings as JSON, overriding --compressed
        #[arg(long, value_name = "SETTINGS")]
        settings: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum InputMode {
    /// Detect the write mode from the file contents
    Auto,
    /// The file holds the buffer verbatim
    Raw,
    /// The file is a zlib stream of the buffer
    Compressed,
}

/// Prints report lines to stdout
struct StdoutReport<W: Write> {
    out: W,
}

impl<W: Write> ReportSink for StdoutReport<W> {
    fn write_report(&mut self, line: &str) {
        // A closed pipe ends the listing early
        let _ = writeln!(self.out, "{}", line);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Dump {
            file,
            details,
            mode,
        } => dump(&file, details, mode),
        Command::Obj {
            input,
            output,
            compressed,
            settings,
        } => convert(&input, &output, compressed, settings.as_deref()),
    }
}

fn dump(path: &Path, details: bool, mode: InputMode) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let buf = match mode {
        InputMode::Raw => bytes,
        InputMode::Compressed => compression::decompress(&bytes)?,
        // Undecodable files still go to the dumper so it can report them
        InputMode::Auto => match decode_container(&bytes) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => bytes,
        },
    };

    let mut sink = StdoutReport {
        out: std::io::stdout().lock(),
    };
    dump_fragments(&buf, &DumpOptions::new().with_details(details), &mut sink)
        .with_context(|| format!("dumping {}", path.display()))?;
    Ok(())
}

fn convert(input: &Path, output: &Path, compressed: bool, settings: Option<&Path>) -> Result<()> {
    let settings = match settings {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<ExportSettings>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None if compressed => ExportSettings::new(CompressionMode::Compressed),
        None => ExportSettings::new(CompressionMode::Raw),
    };

    let scene = obj::load_scene(input)?;
    tracing::info!(
        elements = scene.elements.len(),
        materials = scene.materials.len(),
        "loaded {}",
        input.display()
    );

    Exporter::new(&scene)
        .export_to_file(output, &settings)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Wrote {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dump_help_describes_every_mode() {
        let mut cli = Cli::command();
        let help = cli
            .find_subcommand_mut("dump")
            .unwrap()
            .render_long_help()
            .to_string();
        assert!(help.contains("Detect the write mode from the file contents"));
        assert!(help.contains("The file holds the buffer verbatim"));
        assert!(help.contains("The file is a zlib stream of the buffer"));
    }
}
