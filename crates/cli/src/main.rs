use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stacks_iiif::v2;
use stacks_iiif::{IiifBuilder, IiifResource, NullCatalogue, UriPatterns};
use stacks_mets::work_store::FileSystemWorkStoreFactory;
use stacks_mets::{MetsRepository, MetsResource, PronomData};

#[derive(Parser)]
#[command(name = "stacks")]
#[command(about = "Digital library METS ingestion and IIIF build tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all IIIF resources for a package and write them as JSON files
    Build {
        /// Package identifier (b number)
        identifier: String,
        /// Directory holding the METS files
        #[arg(long, default_value = ".")]
        data_dir: PathBuf,
        /// Directory the JSON files are written to
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
        /// Scheme and host used in resource ids
        #[arg(long, default_value = "https://iiif.wellcomecollection.org")]
        base_uri: String,
        /// PRONOM format table (JSON map of PRONOM key to mime types)
        #[arg(long)]
        pronom_map: Option<PathBuf>,
        /// Also write Presentation 2 renditions
        #[arg(long)]
        v2: bool,
    },
    /// Show what a METS identifier resolves to
    Inspect {
        /// Package, volume or issue identifier
        identifier: String,
        /// Directory holding the METS files
        #[arg(long, default_value = ".")]
        data_dir: PathBuf,
        /// PRONOM format table (JSON map of PRONOM key to mime types)
        #[arg(long)]
        pronom_map: Option<PathBuf>,
    },
}

fn repository(
    data_dir: &Path,
    pronom_map: Option<&Path>,
) -> Result<MetsRepository, Box<dyn std::error::Error>> {
    let pronom = match pronom_map {
        Some(path) => PronomData::load(path)?,
        None => PronomData::default(),
    };
    let factory = FileSystemWorkStoreFactory::new(data_dir, Arc::new(pronom));
    Ok(MetsRepository::new(Arc::new(factory)))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Build {
            identifier,
            data_dir,
            out_dir,
            base_uri,
            pronom_map,
            v2,
        }) => {
            let repository = repository(&data_dir, pronom_map.as_deref())?;
            let builder = IiifBuilder::new(
                repository,
                Arc::new(NullCatalogue),
                UriPatterns::new(&base_uri),
            );
            info!(identifier, "building package");
            let results = builder.build_all_manifestations(&identifier).await?;

            std::fs::create_dir_all(&out_dir)?;
            let mut failures = 0;
            for result in results.iter() {
                let Some(resource) = &result.resource else {
                    failures += 1;
                    eprintln!("{}: build failed: {:?}", result.id, result.outcome);
                    continue;
                };
                let path = out_dir.join(format!("{}.json", result.id));
                std::fs::write(&path, serde_json::to_string_pretty(resource)?)?;
                println!("wrote {}", path.display());
                if v2 {
                    let rendition = match resource {
                        IiifResource::Manifest(manifest) => v2::manifest_to_v2(manifest),
                        IiifResource::Collection(collection) => v2::collection_to_v2(collection),
                    };
                    let path = out_dir.join(format!("{}.v2.json", result.id));
                    std::fs::write(&path, serde_json::to_string_pretty(&rendition)?)?;
                    println!("wrote {}", path.display());
                }
            }
            if failures > 0 {
                eprintln!("{failures} of {} resources failed", results.len());
                std::process::exit(1);
            }
        }
        Some(Commands::Inspect {
            identifier,
            data_dir,
            pronom_map,
        }) => {
            let repository = repository(&data_dir, pronom_map.as_deref())?;
            let resource = repository.get(&identifier).await?;
            match &resource {
                MetsResource::Collection(collection) => {
                    println!("Collection: {}", collection.label);
                    println!("  type: {}", collection.collection_type);
                    println!("  child collections: {}", collection.collections.len());
                    println!("  manifestations: {}", collection.manifestations.len());
                    for manifestation in &collection.manifestations {
                        println!("    {} ({})", manifestation.id.as_str(), manifestation.label);
                    }
                }
                MetsResource::Manifestation(manifestation) => {
                    println!("Manifestation: {}", manifestation.label);
                    println!("  id: {}", manifestation.id.as_str());
                    println!("  type: {}", manifestation.manifestation_type);
                    let sequence = manifestation.sequence()?;
                    println!("  files in sequence: {}", sequence.len());
                    if let Some(mime) = manifestation.first_internet_type()? {
                        println!("  first internet type: {mime}");
                    }
                    println!(
                        "  permitted operations: {}",
                        manifestation.permitted_operations()?.join(", ")
                    );
                }
            }
        }
        None => {
            println!("Use 'stacks --help' for commands");
        }
    }

    Ok(())
}
