use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

use kiln::archive::{read_toc, ArchiveWriter, ARCHIVE_HEADER_SIZE};
use kiln::hash::{basename_without_extension, extension, murmur2_32};
use kiln::{loose_path, SEED_FILE};

#[derive(Parser)]
#[command(name = "kiln", version = "0.3.0", about = "Offline bundler for kiln content archives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack compiled resource files into an archive
    Pack {
        #[arg(short, long)]
        output: PathBuf,
        /// Hash seed for this content branch (decimal u32)
        #[arg(short, long)]
        seed: u32,
        /// Also write seed.ini next to the archive
        #[arg(long)]
        write_seed: bool,
        /// JSON manifest: [{"path": "textures/brick.tga", "source": "build/brick.bin"}]
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        /// Compiled payload files; the file name is the logical path
        #[arg(short, long, num_args = 0..)]
        input: Vec<PathBuf>,
    },
    /// List archive entries
    List {
        input: PathBuf,
    },
    /// Show archive metadata
    Info {
        input: PathBuf,
    },
    /// Split a packed archive into the loose-file bundle layout
    Explode {
        input: PathBuf,
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[derive(Deserialize)]
struct ManifestEntry {
    /// Logical resource path, e.g. "textures/brick.tga".
    path: String,
    /// File holding the compiled payload bytes.
    source: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    match Cli::parse().command {
        // ── Pack ─────────────────────────────────────────────────────────────
        Commands::Pack { output, seed, write_seed, manifest, input } => {
            let mut writer = ArchiveWriter::new();

            let mut pack_one = |logical: &str, bytes: Vec<u8>| -> Result<(), Box<dyn std::error::Error>> {
                let name = murmur2_32(basename_without_extension(logical).as_bytes(), seed);
                let ty = murmur2_32(extension(logical).as_bytes(), 0);
                let len = bytes.len();
                writer.add(name, ty, bytes)?;
                println!("  packed  {logical}  →  {name:08x}{ty:08x}  ({len} B)");
                Ok(())
            };

            if let Some(manifest_path) = manifest {
                let text = std::fs::read_to_string(&manifest_path)?;
                let entries: Vec<ManifestEntry> = serde_json::from_str(&text)?;
                for entry in entries {
                    pack_one(&entry.path, std::fs::read(&entry.source)?)?;
                }
            }
            for path in &input {
                let logical = path
                    .file_name()
                    .ok_or("input path has no file name")?
                    .to_string_lossy()
                    .into_owned();
                pack_one(&logical, std::fs::read(path)?)?;
            }

            let count = writer.len();
            let out = std::fs::File::create(&output)?;
            writer.finalize(out)?;

            if write_seed {
                let seed_path = output
                    .parent()
                    .unwrap_or_else(|| std::path::Path::new("."))
                    .join(SEED_FILE);
                std::fs::write(&seed_path, format!("{seed}\n"))?;
                println!("  wrote   {}", seed_path.display());
            }

            let size = std::fs::metadata(&output)?.len();
            println!("Created: {}  ({count} entries, {size} B on disk)", output.display());
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input } => {
            let file = std::fs::File::open(&input)?;
            let (header, entries) = read_toc(file)?;

            println!("Archive: {}  (version {}, {} entries)", input.display(), header.version, header.entries_count);
            println!("{:<18} {:>12} {:>10}", "Id", "Offset", "Size");
            for entry in &entries {
                println!(
                    "{:08x}{:08x}  {:>12} {:>10}",
                    entry.name, entry.ty, entry.offset, entry.size
                );
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let file = std::fs::File::open(&input)?;
            let (header, entries) = read_toc(file)?;
            let file_size = std::fs::metadata(&input)?.len();
            let payload_bytes: u64 = entries.iter().map(|e| e.size as u64).sum();

            println!("── kiln archive ─────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  File size      {file_size} B");
            println!("  Version        {}", header.version);
            println!("  Entries        {}", header.entries_count);
            println!("  Table checksum {:#010x}", header.checksum);
            println!("  Payload bytes  {payload_bytes}");
            println!("  Header size    {ARCHIVE_HEADER_SIZE} B");
        }

        // ── Explode ──────────────────────────────────────────────────────────
        Commands::Explode { input, output_dir } => {
            let data = std::fs::read(&input)?;
            let (_, entries) = read_toc(std::io::Cursor::new(&data))?;

            if !output_dir.exists() {
                std::fs::create_dir_all(&output_dir)?;
            }

            for entry in &entries {
                let start = entry.offset as usize;
                let end = start + entry.size as usize;
                let payload = data.get(start..end).ok_or_else(|| {
                    format!("entry {:08x}{:08x} points past end of file", entry.name, entry.ty)
                })?;

                let out_path = output_dir.join(loose_path(entry.name, entry.ty));
                std::fs::write(&out_path, payload)?;
                println!("  wrote  {}  ({} B)", out_path.display(), entry.size);
            }
            println!("Exploded {} entr(ies) → {}", entries.len(), output_dir.display());
        }
    }

    Ok(())
}
