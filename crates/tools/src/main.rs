mod autoplay;
mod blob_file;
mod config_file;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use autobatt_core::{BlobStore, ContentPack, Game, GameConfig, Owner};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use autoplay::Autoplay;
use blob_file::FileBlobStore;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding save blobs. Defaults to the platform data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// TOML file overriding game rules
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load (or start) the saved game and autoplay rounds against it
    Simulate {
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        #[arg(short, long, default_value_t = 5)]
        rounds: u32,
        /// Abandon any battle still running after this many milliseconds
        #[arg(long, default_value_t = 120_000)]
        max_battle_ms: u64,
    },
    /// Restore the save and print a summary
    Inspect {
        /// Also print the stored blob as formatted JSON
        #[arg(long)]
        raw: bool,
    },
    /// Delete the save and write a fresh game in its place
    Reset {
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let cli = Cli::parse();
    let config = config_file::load(cli.config.as_deref())?;
    let dir = match cli.data_dir {
        Some(dir) => dir,
        None => FileBlobStore::default_dir().context("No data directory for this platform")?,
    };
    let mut store = FileBlobStore::new(dir);

    match cli.command {
        Commands::Simulate { seed, rounds, max_battle_ms } => {
            let mut game = new_game(seed, config)?;
            let outcome = game
                .load_or_new(&mut store)
                .with_context(|| format!("Failed to load save from {}", store.dir().display()))?;
            println!("Session: {outcome:?}");

            let report = Autoplay::new(max_battle_ms)
                .run(&mut game, &mut store, rounds)
                .context("Autoplay failed to save")?;
            println!(
                "Rounds: {} (won {}, lost {}, drawn {}, abandoned {})",
                report.rounds, report.wins, report.losses, report.draws, report.abandoned
            );
            println!("Purchases: {}", report.purchases);
            print_summary(&game);
        }
        Commands::Inspect { raw } => {
            let Some(blob) = store.get(&config.save_key).context("Failed to read save")? else {
                bail!("No save named `{}` in {}", config.save_key, store.dir().display());
            };
            if raw {
                let value: serde_json::Value =
                    serde_json::from_str(&blob).context("Save is not valid JSON")?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            let mut game = new_game(0, config)?;
            game.restore(&blob).context("Save was rejected")?;
            print_summary(&game);
        }
        Commands::Reset { seed } => {
            let mut game = new_game(seed, config)?;
            game.reset(&mut store).context("Failed to reset save")?;
            println!("Save reset in {}", store.dir().display());
            print_summary(&game);
        }
    }

    Ok(())
}

fn new_game(seed: u64, config: GameConfig) -> Result<Game> {
    Game::new(seed, config, ContentPack::default()).context("Invalid game configuration")
}

fn print_summary(game: &Game) {
    let health = game.health();
    println!("Phase: {:?}", game.phase());
    println!("Gold: {}", game.gold());
    let max = health.max;
    println!("Health: player {}/{max}, enemy {}/{max}", health.player, health.enemy);
    for owner in Owner::GRIDS.into_iter().chain([Owner::Shop]) {
        let names: Vec<String> = game
            .instances_in(owner)
            .iter()
            .map(|item| format!("{} ({})", item.name, item.id))
            .collect();
        println!("{owner}: {}", names.join(", "));
    }
    println!("Snapshot Hash: {:016x}", game.state().snapshot_hash());
}
