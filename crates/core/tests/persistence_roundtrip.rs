use autobatt_core::{
    BlobStore, ContentPack, Game, GameConfig, LoadOutcome, MemoryBlobStore, Owner, RestoreInvalid,
};
use proptest::prelude::*;

fn config() -> GameConfig {
    GameConfig { battle_time_limit_ms: Some(60_000), ..GameConfig::default() }
}

fn new_game(seed: u64) -> Game {
    Game::new(seed, config(), ContentPack::default()).expect("valid config")
}

/// Plays `rounds` rounds, buying the cheapest offer and moving the first
/// roster item to the shared stash and back before each fight.
fn play(game: &mut Game, rounds: usize) {
    let mut now = 0;
    for _ in 0..rounds {
        let cheapest = game.instances_in(Owner::Shop).into_iter().min_by_key(|item| item.price);
        if let Some(offer) = cheapest.map(|item| item.id) {
            let _ = game.buy(offer);
        }
        if let Some(first) = game.instances_in(Owner::Player).first().map(|item| item.id)
            && game.place(first, Owner::SharedStash, 0).is_ok()
        {
            let _ = game.place(first, Owner::Player, 0);
        }
        game.start_battle(now).expect("idle between rounds");
        loop {
            now += 120;
            if game.tick(now).expect("running").outcome.is_some() {
                break;
            }
        }
    }
}

fn roundtrip(game: &Game) -> Game {
    let mut store = MemoryBlobStore::new();
    game.save(&mut store).expect("memory store");
    let mut loaded = new_game(game.seed().wrapping_add(1));
    assert_eq!(loaded.load_or_new(&mut store).expect("memory store"), LoadOutcome::Restored);
    loaded
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_restore_preserves_every_observable_field(seed in any::<u64>(), rounds in 0usize..4) {
        let mut game = new_game(seed);
        play(&mut game, rounds);
        let loaded = roundtrip(&game);

        prop_assert_eq!(loaded.state().snapshot_hash(), game.state().snapshot_hash());
        prop_assert_eq!(loaded.health(), game.health());
        prop_assert_eq!(loaded.gold(), game.gold());
        for owner in Owner::GRIDS {
            let cells = |g: &Game| -> Vec<bool> {
                g.state().grid(owner).expect("grid").cells().iter().map(Option::is_some).collect()
            };
            prop_assert_eq!(cells(&loaded), cells(&game));
            prop_assert_eq!(loaded.instances_in(owner).len(), game.instances_in(owner).len());
        }
        prop_assert_eq!(loaded.state().verify_integrity(), Ok(()));
    }

    #[test]
    fn test_ids_stay_monotonic_across_restore(seed in any::<u64>(), rounds in 0usize..3) {
        let mut game = new_game(seed);
        play(&mut game, rounds);
        let highest = Owner::GRIDS
            .into_iter()
            .chain([Owner::Shop])
            .flat_map(|owner| game.instances_in(owner))
            .map(|item| item.id)
            .max();

        let mut loaded = roundtrip(&game);
        loaded.fill_shop();
        let fresh = loaded.instances_in(Owner::Shop);
        if let Some(highest) = highest {
            prop_assert!(fresh.iter().all(|item| item.id > highest));
        }
    }
}

#[test]
fn test_save_survives_a_battle_in_progress() {
    let mut game = new_game(11);
    game.start_battle(0).expect("idle");
    game.tick(1300).expect("running");

    let mut loaded = roundtrip(&game);
    assert_eq!(loaded.phase(), game.phase());
    assert_eq!(loaded.state().snapshot_hash(), game.state().snapshot_hash());
    loaded.tick(2600).expect("restored battle keeps running");
}

#[test]
fn test_tampered_owner_tag_falls_back_to_a_fresh_game() {
    let game = new_game(3);
    let mut store = MemoryBlobStore::new();
    game.save(&mut store).expect("memory store");
    let key = &game.config().save_key;
    let blob = store.get(key).expect("memory store").expect("saved");
    let tampered = blob.replacen("\"owner\":\"player\"", "\"owner\":\"enemy\"", 1);
    assert_ne!(tampered, blob);
    store.set(key, &tampered).expect("memory store");

    let mut loaded = new_game(3);
    let outcome = loaded.load_or_new(&mut store).expect("memory store");
    assert!(matches!(outcome, LoadOutcome::Replaced(RestoreInvalid::OwnerMismatch { .. })));
    let rewritten = store.get(key).expect("memory store").expect("fresh save written");
    assert_ne!(rewritten, tampered);
}
