use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};

use pngstrip::pipeline::{run_session, Outcome, Presenter};
use pngstrip::{DecodeOptions, DecodedImage, Decoder};

/// Inspect a PNG file, reconstruct its pixels and write a copy without ancillary chunks.
#[derive(Parser, Debug)]
#[command(about, version)]
struct Config {
    /// PNG file to read. Asked for on stdin when missing.
    path: Option<PathBuf>,
    /// where to write the anonymized copy
    #[arg(short, long, default_value = "anonymized.png")]
    output: PathBuf,
    /// print contents of tEXt/zTXt/iTXt chunks
    #[arg(short, long)]
    text: bool,
    /// print the layout of the palette swatch
    #[arg(short, long)]
    swatch: bool,
    /// fail on chunks whose CRC does not match
    #[arg(long)]
    verify_crc: bool,
    /// more logging, repeat for even more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Entries per row of the palette swatch.
const SWATCH_COLUMNS: u32 = 32;

/// Prints what a viewer would need to show the image.
struct SummaryPresenter;

impl Presenter for SummaryPresenter {
    fn present(&mut self, image: &DecodedImage) {
        let grid = &image.grid;
        println!(
            "Reconstructed {} x {} pixels, {:?} layout, {}-bit samples",
            grid.width(),
            grid.height(),
            grid.layout(),
            grid.sample_depth()
        );
        if let Some(palette) = &image.palette {
            println!("Resolved through a palette of {} entries", palette.len());
        }
    }
}

fn ask_for_path() -> Result<PathBuf> {
    print!("Path to PNG file: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read path from stdin")?;
    let path = line.trim();
    if path.is_empty() {
        bail!("No file given");
    }
    Ok(PathBuf::from(path))
}

fn main() -> Result<()> {
    let config = Config::parse();

    let level = match config.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let path = match config.path.clone() {
        Some(path) => path,
        None => ask_for_path()?,
    };

    let mut options = DecodeOptions::default();
    options.set_verify_crc(config.verify_crc);

    let file = File::open(&path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let container = Decoder::new_with_options(BufReader::new(file), options)
        .read_container()
        .with_context(|| format!("Failed to read PNG chunks from {}", path.display()))?;

    println!("\n=== Chunks ===");
    let types: Vec<String> = container
        .chunk_types()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("{}", types.join(", "));

    println!("\n=== Critical chunks ===");
    for info in container.critical_summary() {
        println!("{}", info);
    }

    if config.text {
        println!("\n=== Text chunks ===");
        let texts = container.text_chunks();
        if texts.is_empty() {
            println!("none");
        }
        for text in texts {
            match text {
                Ok(text) => println!("{}", text),
                Err(err) => println!("unreadable: {}", err),
            }
        }
    }

    if config.swatch {
        match container.palette() {
            Ok(Some(palette)) => {
                let swatch = palette.swatch(SWATCH_COLUMNS);
                println!(
                    "\nPalette swatch: {} entries in {} x {} cells",
                    palette.len(),
                    swatch.width(),
                    swatch.height()
                );
            }
            Ok(None) => println!("\nNo palette"),
            Err(err) => println!("\nPalette unreadable: {}", err),
        }
    }

    println!();
    let mut anonymized = Vec::new();
    let report = run_session(&container, Some(&mut SummaryPresenter), None, &mut anonymized);

    if let Outcome::Failed(err) = &report.decode {
        println!("Could not reconstruct the image: {}", err);
    }
    if let Outcome::Skipped = report.spectrum {
        println!("Spectrum: no analyzer available");
    }

    match report.anonymization {
        Outcome::Done(summary) => {
            fs::write(&config.output, &anonymized).with_context(|| {
                format!("Failed to write anonymized file to {}", config.output.display())
            })?;
            println!(
                "Anonymized copy saved to {} (kept {} chunks, dropped {})",
                config.output.display(),
                summary.kept.len(),
                summary.dropped.len()
            );
        }
        Outcome::Failed(err) => println!("Could not anonymize: {}", err),
        Outcome::Skipped => {}
    }

    Ok(())
}
