use anyhow::{Context, Result, bail};
use autobatt_core::{ContentPack, Game, GameConfig, ItemId, MemoryBlobStore, Owner};
use clap::Parser;
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 1000)]
    steps: u32,
}

#[derive(Clone, Copy, Debug)]
enum Action {
    Buy,
    Sell,
    Place,
    Fight,
    Tick,
    Abandon,
}

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> Option<T> {
    if slice.is_empty() {
        return None;
    }
    let p = rng.next_u64() as usize % slice.len();
    Some(slice[p].clone())
}

fn ids_in(game: &Game, owners: &[Owner]) -> Vec<ItemId> {
    owners.iter().flat_map(|owner| game.instances_in(*owner)).map(|item| item.id).collect()
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Starting Fuzz harness on seed {} for {} steps...", args.seed, args.steps);
    let config = GameConfig { battle_time_limit_ms: Some(30_000), ..GameConfig::default() };
    let mut game = Game::new(args.seed, config.clone(), ContentPack::default())?;
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut now = 0;
    let mut rounds = 0;

    let actions =
        [Action::Buy, Action::Sell, Action::Place, Action::Fight, Action::Tick, Action::Abandon];
    for step in 0..args.steps {
        let action = choose(&mut rng, &actions).context("no actions")?;
        // Rejected actions are expected; the invariants below must hold either way.
        let _ = match action {
            Action::Buy => match choose(&mut rng, &ids_in(&game, &[Owner::Shop])) {
                Some(offer) => game.buy(offer).map(|_| ()),
                None => Ok(()),
            },
            Action::Sell => match choose(&mut rng, &ids_in(&game, &Owner::GRIDS)) {
                Some(id) => game.sell(id).map(|_| ()),
                None => Ok(()),
            },
            Action::Place => {
                let all: Vec<Owner> = Owner::GRIDS.into_iter().chain([Owner::Shop]).collect();
                let item = choose(&mut rng, &ids_in(&game, &all));
                let target = choose(&mut rng, &Owner::GRIDS).context("no grids")?;
                let anchor = rng.next_u64() as usize % 60;
                match item {
                    Some(id) => game.place(id, target, anchor).map(|_| ()),
                    None => Ok(()),
                }
            }
            Action::Fight => game.start_battle(now),
            Action::Tick => {
                now += config.tick_ms * (1 + rng.next_u64() % 20);
                game.tick(now).map(|report| {
                    if report.outcome.is_some() {
                        rounds += 1;
                    }
                })
            }
            Action::Abandon => game.abandon_battle(),
        };

        // Assert invariants
        if let Err(reason) = game.state().verify_integrity() {
            bail!("Invariant failed at step {step} after {action:?}: {reason}");
        }
        let health = game.health();
        assert!(health.player <= health.max, "Invariant failed: player HP > max");
        assert!(health.enemy <= health.max, "Invariant failed: enemy HP > max");

        let mut store = MemoryBlobStore::new();
        game.save(&mut store)?;
        let mut restored = Game::new(args.seed, config.clone(), ContentPack::default())?;
        restored.load_or_new(&mut store)?;
        assert_eq!(
            restored.state().snapshot_hash(),
            game.state().snapshot_hash(),
            "Invariant failed: save round trip changed the state at step {step}"
        );
    }

    println!("Fuzzing completed successfully after {rounds} finished rounds.");
    Ok(())
}
