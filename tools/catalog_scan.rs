use std::env;
use std::path::PathBuf;

use catalog::config::{config_path_from_env, load_or_create_config, resolve_music_folders};
use catalog::{Catalog, IndexerOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut folders = Vec::new();
    let mut search = None;
    let mut print_index = false;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--search" => {
                search = Some(args.next().ok_or("--search needs a value")?);
            }
            "--index" => print_index = true,
            _ => folders.push(PathBuf::from(arg)),
        }
    }

    let mut options = IndexerOptions::default();
    if folders.is_empty() {
        if let Ok(root) = env::var("MUSIC_ROOT") {
            folders.push(PathBuf::from(root));
        } else {
            let config_path = config_path_from_env();
            let (config, created) = load_or_create_config(&config_path)?;
            if created {
                info!("Wrote default config to {:?}", config_path);
            }
            folders = resolve_music_folders(&config_path, &config);
            options = config.indexer_options();
        }
    }
    if folders.is_empty() {
        return Err("no music folders given, set MUSIC_ROOT or edit the config".into());
    }

    let catalog = Catalog::with_options(folders, options);
    let index = catalog.rebuild();
    let stats = catalog.stats();
    eprintln!(
        "Indexed: {} artists, {} albums, {} songs ({} skipped)",
        stats.artists, stats.albums, stats.songs, stats.skipped
    );

    if print_index {
        println!("{}", serde_json::to_string_pretty(&index)?);
    }
    if let Some(text) = search {
        let results = catalog.search_all(&text)?;
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    Ok(())
}
