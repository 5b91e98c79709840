//! xpkf-cli - Command-line interface for XPKF images
//!
//! A command-line tool for converting PCRH/XPKF planar images to PNG and
//! inspecting their chunks.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use xpkf::{chunk_spans, decode_bytes, Container, IndexedImage};

#[derive(Parser)]
#[command(name = "xpkf-cli")]
#[command(about = "Extract images from XPKF (NUKE) compressed planar bitmap files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an image file to PNG
    Decode {
        /// Input image file
        input: PathBuf,

        /// Output PNG file
        output: PathBuf,

        /// Force overwrite of output file
        #[arg(short, long)]
        force: bool,
    },

    /// Show header, palette and plane chunk information
    Info {
        /// Image file to analyze
        input: PathBuf,
    },

    /// Write every XPKF chunk to `<input>.part.<n>`
    Extract {
        /// Input image file
        input: PathBuf,

        /// Directory for the chunk files (defaults to the input's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Force overwrite of existing chunk files
        #[arg(short, long)]
        force: bool,
    },

    /// Decode many image files to PNG
    Batch {
        /// Input image files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the PNG files
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Force overwrite of output files
        #[arg(short, long)]
        force: bool,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode {
            input,
            output,
            force,
        } => decode_file(&input, &output, force, cli.verbose, cli.quiet).map(|_| ()),
        Commands::Info { input } => show_file_info(&input, cli.verbose),
        Commands::Extract {
            input,
            output_dir,
            force,
        } => extract_chunks(&input, output_dir.as_deref(), force, cli.quiet).map(|_| ()),
        Commands::Batch {
            inputs,
            output_dir,
            force,
        } => batch_decode(&inputs, &output_dir, force, cli.quiet),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn check_paths(input: &Path, output: &Path, force: bool) -> CliResult<()> {
    if !input.exists() {
        return Err(format!("Input file '{}' does not exist", input.display()).into());
    }

    if output.exists() && !force {
        return Err(format!(
            "Output file '{}' already exists. Use --force to overwrite",
            output.display()
        )
        .into());
    }

    Ok(())
}

fn decode_file(
    input: &Path,
    output: &Path,
    force: bool,
    verbose: bool,
    quiet: bool,
) -> CliResult<IndexedImage> {
    check_paths(input, output, force)?;

    if verbose {
        println!("Decoding '{}' to '{}'", input.display(), output.display());
    }

    let start_time = Instant::now();
    let data = fs::read(input)?;
    let image = decode_bytes(&data).map_err(|e| format!("Decoding failed: {}", e))?;
    image.save_png(output)?;

    if !quiet {
        println!("✓ Decoding successful!");
        println!("  Image:   {} x {}", image.width(), image.height());
        println!(
            "  Planes:  {} ({} colors)",
            image.pixels.plane_count(),
            1usize << image.pixels.plane_count()
        );
        println!("  Palette: {} entries", image.palette.len());
        println!("  Time:    {:.2?}", start_time.elapsed());
    }

    if verbose {
        println!(
            "  Literals: {} bytes in {} runs",
            image.stats.literal_bytes, image.stats.literal_runs
        );
        println!(
            "  Matches:  {} (longest {} bytes)",
            image.stats.match_count, image.stats.longest_match
        );
    }

    Ok(image)
}

fn show_file_info(input: &Path, verbose: bool) -> CliResult<()> {
    if !input.exists() {
        return Err(format!("Input file '{}' does not exist", input.display()).into());
    }

    let data = fs::read(input)?;
    let container = Container::parse(&data)?;
    let header = container.header;

    println!("XPKF Image Information:");
    println!("  File: {}", input.display());
    println!("  Size: {} bytes", data.len());
    println!(
        "  Image: {} x {}, {} bitplanes ({} colors)",
        header.width,
        header.height,
        header.bitplanes,
        header.color_count()
    );
    println!("  Palette: {} entries", header.palette_entries());

    for (number, chunk) in container.planes().enumerate() {
        let chunk = chunk?;
        println!(
            "  Plane {}: offset {}, {} {}, {} -> {} bytes",
            number,
            chunk.offset,
            chunk.packer_name(),
            chunk.compression.name(),
            chunk.packed_size,
            chunk.raw_size
        );

        if verbose {
            println!(
                "    Chunk length: {}, declared length: {}",
                chunk.chunk_len, chunk.declared_len
            );
            match chunk.unpack_with_stats() {
                Ok((_, stats)) => println!(
                    "    {} literal runs, {} matches, {} bytes read forward",
                    stats.literal_runs, stats.match_count, stats.forward_bytes
                ),
                Err(e) => println!("    ✗ {}", e),
            }
        }
    }

    match decode_bytes(&data) {
        Ok(_) => println!("  Status: ✓ Valid XPKF image"),
        Err(e) => {
            println!("  Status: ✗ Invalid or corrupted XPKF image");
            if verbose {
                println!("  Error: {}", e);
            }
        }
    }

    Ok(())
}

fn extract_chunks(
    input: &Path,
    output_dir: Option<&Path>,
    force: bool,
    quiet: bool,
) -> CliResult<Vec<PathBuf>> {
    if !input.exists() {
        return Err(format!("Input file '{}' does not exist", input.display()).into());
    }

    let data = fs::read(input)?;
    let file_name = input
        .file_name()
        .ok_or_else(|| format!("'{}' has no file name", input.display()))?
        .to_string_lossy()
        .into_owned();
    let dir = output_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for (i, span) in chunk_spans(&data).into_iter().enumerate() {
        let target = dir.join(format!("{}.part.{}", file_name, i + 1));
        if target.exists() && !force {
            return Err(format!(
                "Output file '{}' already exists. Use --force to overwrite",
                target.display()
            )
            .into());
        }
        fs::write(&target, &data[span.clone()])?;

        if !quiet {
            println!("  {} ({} bytes)", target.display(), span.len());
        }
        written.push(target);
    }

    if !quiet {
        println!("✓ Extracted {} chunks", written.len());
    }

    Ok(written)
}

fn batch_decode(inputs: &[PathBuf], output_dir: &Path, force: bool, quiet: bool) -> CliResult<()> {
    fs::create_dir_all(output_dir)?;

    let progress = if !quiet {
        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut failures = 0;
    for input in inputs {
        let stem = input.file_stem().unwrap_or(input.as_os_str());
        let output = output_dir.join(stem).with_extension("png");

        if let Some(ref pb) = progress {
            pb.set_message(input.display().to_string());
        }

        if let Err(e) = decode_file(input, &output, force, false, true) {
            failures += 1;
            match progress {
                Some(ref pb) => pb.println(format!("✗ {}: {}", input.display(), e)),
                None => eprintln!("✗ {}: {}", input.display(), e),
            }
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(ref pb) = progress {
        pb.finish_with_message("Batch complete");
    }

    if failures > 0 {
        return Err(format!("{} of {} files failed", failures, inputs.len()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_image() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"PCRH");
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&4u16.to_be_bytes());
        data.extend_from_slice(&2u16.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, 1]);
        data.extend_from_slice(b"PCRC");
        data.extend_from_slice(&6u32.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, 255, 255, 255]);

        let start = data.len();
        data.extend_from_slice(b"XPKF");
        data.resize(start + 36, 0);
        data.push(1);
        data.extend_from_slice(&6u16.to_be_bytes());
        data.extend_from_slice(&2u16.to_be_bytes());
        data.extend_from_slice(&[0x00, 0x00, 0xC0, 0x00, 0x30, 0xC0]);
        data
    }

    #[test]
    fn test_decode_to_png() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let input_path = dir.path().join("title.pic");
        let output_path = dir.path().join("title.png");
        fs::write(&input_path, sample_image())?;

        let image = decode_file(&input_path, &output_path, false, false, true)?;
        assert_eq!(image.pixels.pixels(), &[1, 1, 0, 0, 0, 0, 1, 1]);
        assert!(output_path.exists());

        // Refuses to overwrite without --force
        assert!(decode_file(&input_path, &output_path, false, false, true).is_err());
        assert!(decode_file(&input_path, &output_path, true, false, true).is_ok());

        Ok(())
    }

    #[test]
    fn test_extract_chunks() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let input_path = dir.path().join("title.pic");
        let data = sample_image();
        fs::write(&input_path, &data)?;

        let written = extract_chunks(&input_path, None, false, true)?;
        assert_eq!(written, vec![dir.path().join("title.pic.part.1")]);
        assert_eq!(fs::read(&written[0])?, &data[30..]);

        Ok(())
    }

    #[test]
    fn test_extract_into_new_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let input_path = dir.path().join("title.pic");
        fs::write(&input_path, sample_image())?;

        let parts = dir.path().join("parts").join("title");
        let written = extract_chunks(&input_path, Some(&parts), false, true)?;
        assert_eq!(written, vec![parts.join("title.pic.part.1")]);
        assert!(written[0].exists());

        Ok(())
    }

    #[test]
    fn test_batch_reports_failures() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let good = dir.path().join("good.pic");
        let bad = dir.path().join("bad.pic");
        fs::write(&good, sample_image())?;
        fs::write(&bad, b"PCRH")?;

        let out = dir.path().join("png");
        assert!(batch_decode(&[good, bad], &out, false, true).is_err());
        assert!(out.join("good.png").exists());

        Ok(())
    }
}
