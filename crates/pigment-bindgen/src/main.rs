//! Pigment binding generator CLI
//!
//! Bridges the declaration-discovery pass to the generator: each input file
//! holds one JSON class descriptor, each output file is one generated
//! interop unit.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pigment_interop::{generate_unit, ClassDescriptor};

#[derive(Parser)]
#[command(name = "pigment-bindgen")]
#[command(about = "Generate Pigment native interop units", long_about = None)]
#[command(version)]
struct Cli {
    /// Descriptor JSON files produced by the declaration-discovery pass
    #[arg(required = true)]
    descriptors: Vec<PathBuf>,

    /// Directory receiving one generated unit per class
    #[arg(short, long, default_value = "generated")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;

    for path in &cli.descriptors {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let descriptor: ClassDescriptor = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        let unit = generate_unit(&descriptor)
            .with_context(|| format!("generating bindings for `{}`", descriptor.name))?;

        let target = cli.out_dir.join(format!("{}.rs", unit.module_name));
        fs::write(&target, &unit.source)
            .with_context(|| format!("writing {}", target.display()))?;
        log::info!("{} -> {}", unit.class_name, target.display());
    }

    Ok(())
}
