use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use digicd::audio;
use digicd::embed::TagPolicy;
use digicd::inspect::{inspect, ValidationResult};
use digicd::strategy::{hide, pixel_capacity, reveal, HideOptions, RevealOptions, Strategy};
use digicd::{ChunkType, CrcPolicy};

#[derive(Parser)]
#[command(name = "digicd")]
#[command(about = "Hide an audio track inside a PNG image and play it back later")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// Private ancillary chunk before IEND (image data untouched)
    Chunk,
    /// Red-channel least significant bits (image is re-encoded)
    Lsb,
}

impl From<Method> for Strategy {
    fn from(method: Method) -> Self {
        match method {
            Method::Chunk => Strategy::ChunkInsertion,
            Method::Lsb => Strategy::PixelLsb,
        }
    }
}

#[derive(clap::Args)]
struct TagArgs {
    /// Chunk tag that carries the payload
    #[arg(short, long, default_value = "juLi")]
    tag: String,

    /// Also use metadata chunks (tEXt) as carriers; other tools may reject such files
    #[arg(long)]
    legacy_tags: bool,

    /// Recompute and check every chunk CRC while reading
    #[arg(long)]
    verify_crc: bool,
}

impl TagArgs {
    fn policy(&self) -> Result<TagPolicy> {
        let tag: ChunkType = self.tag.parse()?;
        let base = if self.legacy_tags {
            TagPolicy::legacy()
        } else {
            TagPolicy::default()
        };
        Ok(base.with_embed_tag(tag))
    }

    fn crc_policy(&self) -> CrcPolicy {
        if self.verify_crc {
            CrcPolicy::Verify
        } else {
            CrcPolicy::Ignore
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Hide an audio file inside a PNG image
    Hide {
        /// Path to input PNG file
        #[arg(short, long)]
        png: PathBuf,

        /// Path to the audio file to hide
        #[arg(short, long)]
        audio: PathBuf,

        /// Path for the output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Embedding method
        #[arg(short, long, value_enum, default_value = "chunk")]
        method: Method,

        #[command(flatten)]
        tags: TagArgs,
    },

    /// Recover a hidden audio file from a PNG image
    Reveal {
        /// Path to PNG file holding the payload
        #[arg(short, long)]
        input: PathBuf,

        /// Path for the recovered audio file
        #[arg(short, long)]
        output: PathBuf,

        /// Embedding method that was used
        #[arg(short, long, value_enum, default_value = "chunk")]
        method: Method,

        /// Payload size in bytes (required for the lsb method)
        #[arg(short, long)]
        size: Option<usize>,

        /// Also write the payload's ID3 cover picture here, if it has one
        #[arg(long)]
        cover: Option<PathBuf>,

        #[command(flatten)]
        tags: TagArgs,
    },

    /// List chunks and check the file's structure
    Inspect {
        /// Path to PNG file
        #[arg(short, long)]
        input: PathBuf,

        /// Also probe any payload chunk found with the given tag
        #[arg(short, long)]
        verbose: bool,

        /// Write the payload's ID3 cover picture here, if it has one (implies --verbose)
        #[arg(long)]
        cover: Option<PathBuf>,

        #[command(flatten)]
        tags: TagArgs,
    },

    /// Report how many bytes the lsb method can hide in an image
    Capacity {
        /// Path to PNG file
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Write the payload's cover picture to `path`. Problems with the tag are
/// reported but do not fail the command.
fn save_cover(payload: &[u8], path: &Path) -> Result<()> {
    match audio::cover_art(payload) {
        Ok(Some(art)) => {
            fs::write(path, &art.data).with_context(|| format!("writing {}", path.display()))?;
            println!(
                "Cover art: {} bytes ({}) written to {}",
                art.data.len(),
                art.mime_type,
                path.display()
            );
        }
        Ok(None) => println!("Cover art: none in payload"),
        Err(e) => println!("Cover art: {}", e),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Hide { png, audio, output, method, tags } => {
            let image = fs::read(&png).with_context(|| format!("reading {}", png.display()))?;
            let payload = fs::read(&audio).with_context(|| format!("reading {}", audio.display()))?;

            let options = HideOptions {
                strategy: method.into(),
                tags: tags.policy()?,
                crc_policy: tags.crc_policy(),
            };

            println!("Hiding {} ({} bytes) in {}", audio.display(), payload.len(), png.display());
            let hidden = hide(&image, &payload, &options)
                .with_context(|| format!("hiding payload in {}", png.display()))?;
            fs::write(&output, &hidden).with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote {} ({} bytes)", output.display(), hidden.len());
        }

        Commands::Reveal { input, output, method, size, cover, tags } => {
            let image = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            let strategy: Strategy = method.into();

            let payload_len = match (strategy, size) {
                (Strategy::PixelLsb, None) => bail!("--size is required for the lsb method"),
                (_, size) => size.unwrap_or_default(),
            };

            let options = RevealOptions {
                strategy,
                tags: tags.policy()?,
                crc_policy: tags.crc_policy(),
                payload_len,
            };

            let payload = reveal(&image, &options)
                .with_context(|| format!("revealing payload from {}", input.display()))?;
            fs::write(&output, &payload).with_context(|| format!("writing {}", output.display()))?;

            println!("Recovered {} bytes ({})", payload.len(), audio::describe(&payload));
            if let Some(path) = cover {
                save_cover(&payload, &path)?;
            }
        }

        Commands::Inspect { input, verbose, cover, tags } => {
            let data = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            let report = inspect(&data);

            for chunk in &report.chunks {
                let kind = if chunk.chunk_type.is_ancillary() { "ancillary" } else { "critical" };
                let crc = if chunk.crc_ok() { "ok" } else { "BAD" };
                println!(
                    "{:>8}  {}  {:>10} bytes  {:<9}  crc {:08x} {}",
                    chunk.offset, chunk.chunk_type, chunk.length, kind, chunk.stored_crc, crc
                );
            }
            if report.trailing_bytes > 0 {
                println!("{} bytes after IEND", report.trailing_bytes);
            }

            match &report.validation {
                ValidationResult::Valid => println!("[OK] Valid PNG structure"),
                ValidationResult::InvalidSignature => println!("[ERROR] Not a PNG file"),
                ValidationResult::Truncated(offset) => {
                    println!("[ERROR] Chunk at offset {} runs past end of file", offset)
                }
                ValidationResult::MissingTerminalChunk => println!("[ERROR] No IEND chunk"),
                ValidationResult::CrcMismatch(chunks) => {
                    println!("[ERROR] CRC mismatch in: {}", chunks.join(", "))
                }
            }

            if verbose || cover.is_some() {
                let options = RevealOptions {
                    tags: tags.policy()?,
                    ..RevealOptions::default()
                };
                match reveal(&data, &options) {
                    Ok(payload) => {
                        println!("Payload: {} bytes, {}", payload.len(), audio::describe(&payload));
                        if let Some(path) = &cover {
                            save_cover(&payload, path)?;
                        }
                    }
                    Err(e) => println!("Payload: {}", e),
                }
            }
        }

        Commands::Capacity { input } => {
            let data = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            let bytes = pixel_capacity(&data)?;
            println!("{} can hide {} bytes with the lsb method", input.display(), bytes);
        }
    }

    Ok(())
}
