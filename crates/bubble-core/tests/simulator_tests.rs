// Host-side tests for the simulator: generation, physics boundaries,
// lifecycle and interaction.

use bubble_core::*;
use std::collections::HashSet;

fn catalogue(songs: usize, persons: usize, tags: usize) -> Catalogue {
    let roles = [EntityType::Lyricist, EntityType::Composer, EntityType::Arranger];
    Catalogue::new(
        (0..songs)
            .map(|i| CatalogueEntry::new(format!("song-{i}"), format!("Song {i}"), (i % 25) as u32))
            .collect(),
        (0..persons)
            .map(|i| Person::new(format!("person-{i}"), format!("Person {i}"), &[roles[i % 3]], 5))
            .collect(),
        (0..tags)
            .map(|i| CatalogueEntry::new(format!("tag-{i}"), format!("Tag {i}"), 3))
            .collect(),
    )
}

fn config(max_bubbles: usize) -> SimulatorConfig {
    SimulatorConfig {
        max_bubbles,
        ..SimulatorConfig::default()
    }
}

fn run_frames(sim: &mut BubbleSimulator, start: f64, frames: usize, step: f64) -> f64 {
    let mut t = start;
    for _ in 0..frames {
        _ = sim.update_frame_at(t);
        t += step;
    }
    t
}

#[test]
fn size_is_linear_in_related_count_and_capped() {
    assert_eq!(size_for_related_count(0, 40.0, 120.0), 40.0);
    assert_eq!(size_for_related_count(10, 40.0, 120.0), 80.0);
    assert_eq!(size_for_related_count(20, 40.0, 120.0), 120.0);
    assert_eq!(size_for_related_count(25, 40.0, 120.0), 120.0);
}

#[test]
fn generated_bubble_takes_size_from_related_count() {
    let cat = Catalogue::new(vec![CatalogueEntry::new("s", "Song", 10)], vec![], vec![]);
    let mut sim = BubbleSimulator::new(config(5), cat);
    let b = sim.generate_bubble().expect("one song available");
    assert_eq!(b.size, 80.0);
    assert_eq!(b.entity_type, EntityType::Song);
    assert_eq!(b.content_id, "s");
    assert_eq!(b.color, EntityType::Song.base_color());
    assert!(b.lifespan >= 12_000.0 && b.lifespan <= 25_000.0);
    let r = b.radius();
    assert!(b.position.x >= r && b.position.x <= 1280.0 - r);
    assert!(b.position.y >= r && b.position.y <= 720.0 - r);
}

#[test]
fn boundary_collision_reflects_and_damps() {
    let mut b = BubbleEntity {
        size: 40.0,
        position: glam::Vec2::new(-20.0, 300.0),
        velocity: glam::Vec2::new(-30.0, 0.0),
        ..BubbleEntity::default()
    };
    resolve_boundary_collision(&mut b, 800.0, 600.0);
    assert_eq!(b.position.x, 20.0);
    assert!((b.velocity.x - 21.0).abs() < 1e-4);

    b.position = glam::Vec2::new(790.0, 300.0);
    b.velocity = glam::Vec2::new(30.0, 0.0);
    resolve_boundary_collision(&mut b, 800.0, 600.0);
    assert_eq!(b.position.x, 780.0);
    assert!((b.velocity.x + 21.0).abs() < 1e-4);

    // a near-stationary bubble still gets pushed back inside
    b.position = glam::Vec2::new(400.0, 5.0);
    b.velocity = glam::Vec2::new(0.0, -0.5);
    resolve_boundary_collision(&mut b, 800.0, 600.0);
    assert_eq!(b.position.y, 20.0);
    assert!(b.velocity.y > 0.0);
}

#[test]
fn empty_catalogue_halts_generation() {
    for dedup in [true, false] {
        let mut sim = BubbleSimulator::new(
            SimulatorConfig {
                dedup,
                ..config(5)
            },
            Catalogue::default(),
        );
        assert!(matches!(sim.generate_bubble(), Err(BubbleError::CatalogueEmpty)));

        _ = sim.update_frame_at(0.0);
        _ = sim.update_frame_at(16.0);
        let stats = sim.get_stats();
        assert_eq!(stats.active_bubbles, 0);
        assert!(stats.generation_halted);
        assert_eq!(stats.generation_failures, 1);
    }
}

#[test]
fn first_frame_fills_to_capacity_with_distinct_content() {
    let mut sim = BubbleSimulator::new(config(10), catalogue(30, 0, 0));
    let bubbles = sim.update_frame_at(0.0);
    assert_eq!(bubbles.len(), 10);
    let ids: HashSet<&str> = bubbles.iter().map(|b| b.content_id.as_str()).collect();
    assert_eq!(ids.len(), 10);
    assert_eq!(sim.tracker().displayed_len(), 10);
    for b in sim.bubbles() {
        assert_eq!(sim.animations().kind(b.id), Some(AnimationKind::Appear));
    }
}

#[test]
fn long_run_respects_capacity_and_uniqueness() {
    let mut sim = BubbleSimulator::new(config(10), catalogue(15, 10, 5));
    let mut t = 0.0;
    for _ in 0..3_600 {
        let bubbles = sim.update_frame_at(t);
        assert!(bubbles.len() <= 10);
        let mut seen = HashSet::new();
        for b in bubbles.iter().filter(|b| !b.disappearing) {
            assert!(seen.insert(b.content_id.clone()), "{} shown twice at {t}", b.content_id);
            assert!(b.position.is_finite());
            assert!((0.0..=1.0).contains(&b.opacity), "opacity {}", b.opacity);
        }
        t += 16.0;
    }
    let stats = sim.get_stats();
    assert!(stats.removed > 0);
    assert_eq!(stats.by_type.iter().sum::<usize>(), stats.active_bubbles);
}

#[test]
fn hit_test_returns_topmost() {
    let mut sim = BubbleSimulator::new(config(5), catalogue(5, 0, 0));
    let mut ids = Vec::new();
    for _ in 0..2 {
        let mut b = sim.generate_bubble().expect("content available");
        b.position = glam::Vec2::new(200.0, 200.0);
        b.scale = 1.0;
        ids.push(b.id);
        assert!(sim.add_bubble(b));
    }
    let hit = sim.find_bubble_at_position(205.0, 195.0).map(|b| b.id);
    assert_eq!(hit, Some(ids[1]));
    assert!(sim.find_bubble_at_position(900.0, 600.0).is_none());

    assert!(sim.remove_bubble(ids[1]));
    let hit = sim.find_bubble_at_position(205.0, 195.0).map(|b| b.id);
    assert_eq!(hit, Some(ids[0]));
    assert!(!sim.remove_bubble(ids[1]));
}

#[test]
fn click_triggers_pulse_only_for_live_bubbles() {
    let mut sim = BubbleSimulator::new(config(3), catalogue(5, 0, 0));
    _ = sim.update_frame_at(0.0);
    let id = sim.bubbles()[0].id;
    assert!(sim.trigger_click_animation(id));
    assert_eq!(sim.animations().kind(id), Some(AnimationKind::Click));
    assert!(!sim.trigger_click_animation(9_999));
}

#[test]
fn removing_a_bubble_frees_its_content() {
    let mut sim = BubbleSimulator::new(config(3), catalogue(5, 0, 0));
    _ = sim.update_frame_at(0.0);
    let victim = sim.bubbles()[0].clone();
    assert!(sim.tracker().is_displayed(&victim.content_id));
    assert!(sim.remove_bubble(victim.id));
    assert!(!sim.tracker().is_displayed(&victim.content_id));
    assert!(sim.animations().state(victim.id).is_none());
    assert_eq!(sim.bubbles().len(), 2);
}

#[test]
fn bubbles_disappear_then_get_removed_after_lifespan() {
    let mut sim = BubbleSimulator::new(
        SimulatorConfig {
            min_lifespan_ms: 1_000.0,
            max_lifespan_ms: 1_000.0,
            ..config(4)
        },
        catalogue(40, 0, 0),
    );
    _ = sim.update_frame_at(0.0);
    let first: Vec<BubbleId> = sim.bubbles().iter().map(|b| b.id).collect();
    assert_eq!(first.len(), 4);

    // 0.7 of the lifespan in, every first-frame bubble is fading out
    let t = run_frames(&mut sim, 16.0, 50, 16.0);
    for id in &first {
        if let Some(b) = sim.bubble(*id) {
            assert!(b.disappearing, "bubble {id} still alive at {t}");
        }
    }

    _ = run_frames(&mut sim, t, 60, 16.0);
    for id in &first {
        assert!(sim.bubble(*id).is_none(), "bubble {id} was not removed");
    }
    let stats = sim.get_stats();
    assert!(stats.removed >= 4);
    assert_eq!(stats.active_bubbles, 4);
}

#[test]
fn replacing_music_database_resets_everything() {
    let mut sim = BubbleSimulator::new(config(5), Catalogue::default());
    _ = sim.update_frame_at(0.0);
    assert!(sim.get_stats().generation_halted);

    sim.update_music_database(catalogue(0, 0, 8));
    let stats = sim.get_stats();
    assert!(!stats.generation_halted);
    assert_eq!(stats.active_bubbles, 0);
    assert_eq!(stats.tracker.total, 8);

    let bubbles = sim.update_frame_at(16.0);
    assert_eq!(bubbles.len(), 5);
    assert!(bubbles.iter().all(|b| b.entity_type == EntityType::Tag));

    sim.update_music_database(catalogue(3, 0, 0));
    assert!(sim.bubbles().is_empty());
    assert_eq!(sim.animations().active_count(), 0);
    assert_eq!(sim.tracker().displayed_len(), 0);
}

#[test]
fn instances_pack_eight_floats_per_bubble() {
    let mut sim = BubbleSimulator::new(config(6), catalogue(10, 0, 0));
    _ = run_frames(&mut sim, 0.0, 30, 16.0);
    let mut out = Vec::new();
    sim.write_instances(&mut out);
    assert_eq!(out.len(), sim.bubbles().len());
    let floats: &[f32] = bytemuck::cast_slice(&out);
    assert_eq!(floats.len(), out.len() * 8);
    for (inst, b) in out.iter().zip(sim.bubbles()) {
        assert_eq!(inst.center, b.position.to_array());
        assert_eq!(inst.color[3], b.opacity);
    }
}

#[test]
fn direct_mode_falls_back_to_types_with_content() {
    let mut sim = BubbleSimulator::new(
        SimulatorConfig {
            dedup: false,
            ..config(5)
        },
        catalogue(0, 0, 2),
    );
    for _ in 0..20 {
        let b = sim.generate_bubble().expect("tags available");
        assert_eq!(b.entity_type, EntityType::Tag);
    }
}

#[test]
fn person_bubbles_show_a_credited_role() {
    let cat = Catalogue::new(
        vec![],
        vec![Person::new(
            "p",
            "Both",
            &[EntityType::Composer, EntityType::Arranger],
            4,
        )],
        vec![],
    );
    let mut sim = BubbleSimulator::new(
        SimulatorConfig {
            dedup: false,
            ..config(5)
        },
        cat,
    );
    for _ in 0..20 {
        let b = sim.generate_bubble().expect("person available");
        assert!(matches!(b.entity_type, EntityType::Composer | EntityType::Arranger));
        assert_eq!(b.roles.len(), 2);
    }
}

#[test]
fn person_without_roles_shows_as_lyricist() {
    let cat = Catalogue::new(vec![], vec![Person::new("p", "Nobody", &[], 4)], vec![]);
    assert_eq!(cat.count_of(EntityType::Lyricist), 1);
    assert_eq!(cat.count_of(EntityType::Composer), 0);
    for dedup in [false, true] {
        let mut sim = BubbleSimulator::new(
            SimulatorConfig {
                dedup,
                ..config(5)
            },
            cat.clone(),
        );
        let b = sim.generate_bubble().expect("person available");
        assert_eq!(b.entity_type, EntityType::Lyricist, "dedup={dedup}");
        assert_eq!(b.content_id, "p");
    }

    let mut sim = BubbleSimulator::new(
        SimulatorConfig {
            dedup: false,
            ..config(3)
        },
        cat,
    );
    assert_eq!(sim.update_frame_at(0.0).len(), 3);
    assert!(!sim.get_stats().generation_halted);
}

#[test]
fn clock_starts_at_first_frame() {
    let mut sim = BubbleSimulator::new(config(3), catalogue(5, 0, 0));
    std::thread::sleep(std::time::Duration::from_millis(30));
    _ = sim.update_frame();
    assert!(sim.now() < 30.0, "now={}", sim.now());
}

#[test]
fn entity_type_names_parse_back() {
    for t in EntityType::ALL {
        assert_eq!(t.as_str().parse::<EntityType>(), Ok(t));
    }
    assert_eq!(" Composer ".parse::<EntityType>(), Ok(EntityType::Composer));
    let err = "drummer".parse::<EntityType>().unwrap_err();
    assert_eq!(err.name, "drummer");
    assert_eq!(err.to_string(), "unknown entity type 'drummer'");
}

#[test]
fn stats_break_down_by_type() {
    let mut sim = BubbleSimulator::new(config(12), catalogue(10, 10, 10));
    _ = sim.update_frame_at(0.0);
    let stats = sim.get_stats();
    assert_eq!(stats.active_bubbles, 12);
    assert_eq!(stats.max_bubbles, 12);
    assert_eq!(stats.by_type.iter().sum::<usize>(), 12);
    assert_eq!(stats.generated, 12);
    assert_eq!(
        stats.tracker.displayed_songs + stats.tracker.displayed_persons + stats.tracker.displayed_tags,
        12
    );
}

#[test]
fn small_catalogue_rotates_oldest_bubble_out() {
    let mut sim = BubbleSimulator::new(config(5), catalogue(3, 0, 0));
    let bubbles = sim.update_frame_at(0.0);
    assert_eq!(bubbles.len(), 4);
    let fading: Vec<&BubbleEntity> = bubbles.iter().filter(|b| b.disappearing).collect();
    assert_eq!(fading.len(), 1);
    assert_eq!(fading[0].content_id, "song-0");
    assert_eq!(sim.tracker().rotation_cycles(), 1);

    let live: HashSet<&str> = sim
        .bubbles()
        .iter()
        .filter(|b| !b.disappearing)
        .map(|b| b.content_id.as_str())
        .collect();
    assert_eq!(live.len(), 3);
}
