// Host-side tests for the animation state machine and its diagnostics.

use bubble_core::*;

fn manager() -> AnimationManager {
    AnimationManager::new(AnimationConfig::default())
}

#[test]
fn appear_becomes_floating_after_its_duration() {
    let mut anim = manager();
    let appear_ms = AnimationConfig::default().appear.duration_ms;
    anim.start_appear(1, 0.0);
    assert_eq!(anim.kind(1), Some(AnimationKind::Appear));

    let done = anim.update_frame(appear_ms * 0.5);
    assert!(done.is_empty());
    assert_eq!(anim.kind(1), Some(AnimationKind::Appear));

    let done = anim.update_frame(appear_ms + 1.0);
    assert!(done.is_empty());
    assert_eq!(anim.kind(1), Some(AnimationKind::Floating));
    assert_eq!(anim.state(1).and_then(|s| s.duration_ms), None);
}

#[test]
fn click_chains_through_return_to_floating() {
    let cfg = AnimationConfig::default();
    let mut anim = manager();
    anim.start_appear(7, 0.0);
    _ = anim.update_frame(cfg.appear.duration_ms + 1.0);

    let t0 = 2_000.0;
    assert!(anim.start_click(7, t0));
    assert_eq!(anim.kind(7), Some(AnimationKind::Click));

    _ = anim.update_frame(t0 + cfg.click.duration_ms + 1.0);
    assert_eq!(anim.kind(7), Some(AnimationKind::ClickReturn));

    _ = anim.update_frame(t0 + cfg.click.duration_ms + cfg.click_return.duration_ms + 2.0);
    assert_eq!(anim.kind(7), Some(AnimationKind::Floating));
}

#[test]
fn long_frame_skips_whole_click_chain() {
    let mut anim = manager();
    assert!(anim.start_click(3, 0.0));
    _ = anim.update_frame(10_000.0);
    assert_eq!(anim.kind(3), Some(AnimationKind::Floating));
}

#[test]
fn disappear_completion_deletes_state_and_reports_id() {
    let cfg = AnimationConfig::default();
    let mut anim = manager();
    anim.start_appear(1, 0.0);
    anim.start_appear(2, 0.0);
    anim.start_disappear(2, 100.0);

    let done = anim.update_frame(100.0 + cfg.disappear.duration_ms * 0.5);
    assert!(done.is_empty());
    let done = anim.update_frame(100.0 + cfg.disappear.duration_ms);
    assert_eq!(done.as_slice(), &[2]);
    assert!(anim.state(2).is_none());
    assert!(anim.state(1).is_some());
    assert_eq!(anim.active_count(), 1);
}

#[test]
fn click_is_ignored_while_disappearing() {
    let mut anim = manager();
    anim.start_disappear(5, 0.0);
    assert!(!anim.start_click(5, 10.0));
    assert_eq!(anim.kind(5), Some(AnimationKind::Disappear));
}

#[test]
fn rotation_only_accumulates_during_disappear() {
    let cfg = AnimationConfig::default();
    let speed = cfg.disappear.rotation_speed.unwrap_or(0.0);
    let mut anim = manager();
    anim.start_appear(1, 0.0);
    assert_eq!(anim.get_current_rotation(1, 300.0), 0.0);
    assert_eq!(anim.get_current_rotation(42, 300.0), 0.0);

    anim.start_disappear(1, 1_000.0);
    let r = anim.get_current_rotation(1, 1_500.0);
    assert!((r - speed * 0.5).abs() < 1e-3, "rotation {r}");
}

#[test]
fn disappear_interpolates_without_noise() {
    let cfg = AnimationConfig::default();
    let mut anim = manager();
    anim.start_disappear(1, 0.0);
    assert_eq!(anim.get_current_scale(1, 0.0), cfg.disappear.initial_scale);
    assert_eq!(anim.get_current_opacity(1, 0.0), cfg.disappear.initial_opacity);
    let end = cfg.disappear.duration_ms;
    assert!(anim.get_current_scale(1, end).abs() < 1e-6);
    assert!(anim.get_current_opacity(1, end).abs() < 1e-6);
    assert!(anim.is_overriding_opacity(1));
}

#[test]
fn floating_variation_stays_within_bounds() {
    let mut anim = manager();
    anim.start_animation(9, AnimationKind::Floating, 0.0);
    assert!(!anim.is_overriding_opacity(9));
    for i in 0..500 {
        let t = i as f64 * 37.0;
        let s = anim.get_current_scale(9, t);
        let o = anim.get_current_opacity(9, t);
        assert!((0.95 - 1e-4..=1.05 + 1e-4).contains(&s), "scale {s} at {t}");
        assert!((0.9 - 1e-4..=1.0).contains(&o), "opacity {o} at {t}");
    }
}

#[test]
fn noise_offset_respects_state_intensity() {
    let mut anim = manager();
    anim.start_animation(1, AnimationKind::Floating, 0.0);
    anim.start_disappear(2, 0.0);
    anim.start_click(3, 0.0);
    for i in 0..200 {
        let t = i as f64 * 53.0;
        let f = anim.get_noise_offset(1, t);
        assert!(f.x.abs() <= 6.0 + 1e-4 && f.y.abs() <= 4.0 + 1e-4, "floating {f:?}");
        assert_eq!(anim.get_noise_offset(2, t), glam::Vec2::ZERO);
        let c = anim.get_noise_offset(3, t);
        assert!(c.x.abs() <= 6.0 * 1.6 + 1e-3 && c.y.abs() <= 4.0 * 1.6 + 1e-3);
    }
}

#[test]
fn stop_and_clear_are_immediate() {
    let mut anim = manager();
    anim.start_appear(1, 0.0);
    anim.start_appear(2, 0.0);
    assert!(anim.stop_animation(1));
    assert!(!anim.stop_animation(1));
    assert_eq!(anim.get_current_scale(1, 10.0), 1.0);
    anim.clear_all_animations();
    assert_eq!(anim.active_count(), 0);
    assert_eq!(anim.performance_stats().noise_cache.entries, 0);
}

#[test]
fn frame_accounting_flags_sustained_drops() {
    let mut anim = manager();
    let mut t = 0.0;
    for _ in 0..80 {
        t += 16.0;
        _ = anim.update_frame(t);
    }
    let stats = anim.performance_stats();
    assert_eq!(stats.frame_count, 80);
    assert_eq!(stats.dropped_frames, 0);
    assert!((stats.average_frame_interval_ms - 16.0).abs() < 1e-9);
    assert!(!stats.reduce_quality);

    for _ in 0..80 {
        t += 50.0;
        _ = anim.update_frame(t);
    }
    let stats = anim.performance_stats();
    assert_eq!(stats.dropped_frames, 80);
    assert!(stats.reduce_quality);
    assert!(anim.should_reduce_quality());
    assert!((stats.fps - 20.0).abs() < 1e-6);

    anim.reset_performance_stats();
    assert!(!anim.should_reduce_quality());
    assert_eq!(anim.performance_stats().frame_count, 0);
}
