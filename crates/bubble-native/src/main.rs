use std::thread;
use std::time::Duration;

use anyhow::Context;
use bubble_core::{
    BubbleSimulator, Catalogue, CatalogueEntry, EntityType, Person, SimulatorConfig,
};
use glam::Vec2;
use instant::Instant;
use rand::prelude::*;

const FRAME_MS: f64 = 1000.0 / 60.0;
const DEFAULT_FRAMES: u64 = 60 * 30; // half a minute
const CLICK_EVERY_FRAMES: u64 = 60;
const STATS_EVERY_FRAMES: u64 = 60 * 5;

const DEMO_SONGS: usize = 48;
const DEMO_PERSONS: usize = 24;
const DEMO_TAGS: usize = 12;
const DEMO_SEED: u64 = 2024;

/// Synthetic catalogue so the host runs without a data service.
fn demo_catalogue(rng: &mut StdRng) -> Catalogue {
    let songs = (0..DEMO_SONGS)
        .map(|i| CatalogueEntry::new(format!("song-{i:03}"), format!("Song {i}"), rng.gen_range(0..30)))
        .collect();

    let roles = [EntityType::Lyricist, EntityType::Composer, EntityType::Arranger];
    let persons = (0..DEMO_PERSONS)
        .map(|i| {
            let n = rng.gen_range(1..=roles.len());
            let credited: Vec<EntityType> = roles.choose_multiple(rng, n).copied().collect();
            Person::new(
                format!("person-{i:03}"),
                format!("Person {i}"),
                &credited,
                rng.gen_range(1..25),
            )
        })
        .collect();

    let tags = (0..DEMO_TAGS)
        .map(|i| CatalogueEntry::new(format!("tag-{i:03}"), format!("Tag {i}"), rng.gen_range(2..40)))
        .collect();

    Catalogue::new(songs, persons, tags)
}

/// A pointer position that usually lands on a bubble: half the time a live
/// bubble's centre, otherwise anywhere on the canvas.
fn pick_click_point(sim: &BubbleSimulator, rng: &mut StdRng) -> Vec2 {
    let cfg = sim.config();
    if rng.gen_bool(0.5) {
        if let Some(b) = sim.bubbles().choose(rng) {
            return b.position;
        }
    }
    Vec2::new(
        rng.gen_range(0.0..cfg.canvas_width.max(1.0)),
        rng.gen_range(0.0..cfg.canvas_height.max(1.0)),
    )
}

fn log_stats(sim: &BubbleSimulator, seconds: f64) {
    let stats = sim.get_stats();
    let perf = sim.get_animation_performance_stats();
    log::info!(
        "[native] t={:.1}s bubbles={}/{} generated={} removed={} failures={} rotations={} cycle={:.0}%",
        seconds,
        stats.active_bubbles,
        stats.max_bubbles,
        stats.generated,
        stats.removed,
        stats.generation_failures,
        stats.tracker.rotation_cycles,
        stats.tracker.cycle_progress * 100.0
    );
    log::info!(
        "[native] fps={:.1} dropped={} animations={} noise_cache={}/{} hit={:.0}% pool idle={} reused={}",
        perf.fps,
        perf.dropped_frames,
        perf.active_animations,
        perf.noise_cache.entries,
        perf.noise_cache.capacity,
        perf.noise_cache.hit_rate() * 100.0,
        stats.pool.idle,
        stats.pool.reused
    );
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let frames = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("frame count must be a number, got {arg:?}"))?,
        None => DEFAULT_FRAMES,
    };

    let mut rng = StdRng::seed_from_u64(DEMO_SEED);
    let catalogue = demo_catalogue(&mut rng);
    anyhow::ensure!(!catalogue.is_empty(), "demo catalogue is empty");

    let config = SimulatorConfig {
        seed: DEMO_SEED,
        ..SimulatorConfig::default()
    };
    let mut sim = BubbleSimulator::new(config, catalogue);
    log::info!("[native] running {} frames at 60 Hz", frames);

    let start = Instant::now();
    for frame in 0..frames {
        let now = frame as f64 * FRAME_MS;
        _ = sim.update_frame_at(now);

        if frame > 0 && frame % CLICK_EVERY_FRAMES == 0 {
            let p = pick_click_point(&sim, &mut rng);
            let hit = sim.find_bubble_at_position(p.x, p.y).map(|b| (b.id, b.name.clone()));
            match hit {
                Some((id, name)) => {
                    if sim.trigger_click_animation(id) {
                        log::info!("[native] clicked bubble {} '{}'", id, name);
                    }
                }
                None => log::debug!("[native] click at ({:.0}, {:.0}) missed", p.x, p.y),
            }
        }

        if frame % STATS_EVERY_FRAMES == 0 {
            log_stats(&sim, now / 1000.0);
        }

        // pace to wall clock
        let target = Duration::from_secs_f64((frame + 1) as f64 * FRAME_MS / 1000.0);
        let elapsed = start.elapsed();
        if target > elapsed {
            thread::sleep(target - elapsed);
        }
    }

    log_stats(&sim, frames as f64 * FRAME_MS / 1000.0);
    log::info!("[native] done in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
