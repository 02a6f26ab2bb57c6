use folio_ambience::pattern::wave_bucket;
use folio_ambience::{
    generate, Animator, AnimatorOptions, AnimatorState, BufferSurface, DimensionCalculator,
    FrameRate, Measurement, PatternKind, RevealState, Tick,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn run_until_rendered(animator: &mut Animator<BufferSurface>, mut now: f64) -> f64 {
    for _ in 0..1_000 {
        if animator.frame(now) == Tick::Rendered {
            return now;
        }
        now += 16.0;
    }
    panic!("no frame rendered");
}

#[test]
fn dimension_cache_follows_throttle_window() {
    let mut surface = BufferSurface::new(Measurement::viewport(1024.0, 768.0));
    let mut dims = DimensionCalculator::new();
    let first = dims.grid_size(&surface, 0.0);

    surface.measurement = Measurement::viewport(1920.0, 1080.0);
    assert_eq!(dims.grid_size(&surface, 100.0), first);

    let fresh = dims.grid_size(&surface, 300.0);
    assert!(fresh.width > first.width);
    assert!(fresh.height > first.height);
}

#[test]
fn waves_are_continuous_between_neighbours() {
    for time in [0.0, 1_250.0, 98_765.0] {
        for y in 0..40 {
            for x in 1..120 {
                let left = wave_bucket(x - 1, y, time) as i64;
                let here = wave_bucket(x, y, time) as i64;
                assert!((left - here).abs() <= 1, "jump at ({x}, {y}) t={time}");
            }
        }
    }
}

#[test]
fn waves_share_a_frame_within_one_time_step() {
    let mut rng = SmallRng::seed_from_u64(1);
    let a = generate(PatternKind::Waves, 60, 20, 1_000.0, &mut rng);
    let b = generate(PatternKind::Waves, 60, 20, 1_049.0, &mut rng);
    assert_eq!(a, b);
}

#[test]
fn reveal_only_ever_grows() {
    let mut rng = SmallRng::seed_from_u64(9);
    let full = generate(PatternKind::Circuit, 40, 12, 0.0, &mut rng);
    let mut reveal = RevealState::new(&full, 0.0, 1_500.0, &mut rng);

    let mut previous = 0;
    let mut now = 0.0;
    while now <= 1_600.0 {
        let count = reveal.advance(now);
        assert!(count >= previous);
        assert!(reveal.positions()[..count].iter().all(|&pos| reveal.is_revealed(pos)));
        previous = count;
        now += 37.0;
    }
    assert!(reveal.is_complete(1_600.0));
    assert_eq!(reveal.render_at(1_600.0), full);
}

#[test]
fn frame_rate_eases_from_zero_to_ten() {
    let mut rate = FrameRate::new(0.0);
    rate.transition_to(10.0, 1_500.0, 0.0);

    let mut last = 0.0;
    for step in 1..15 {
        assert!(!rate.update(step as f64 * 100.0));
        assert!(rate.current() >= last);
        last = rate.current();
    }
    assert!(last > 9.0 && last < 10.0);
    assert!(rate.update(1_500.0));
    assert_eq!(rate.current(), 10.0);
    assert!(!rate.is_transitioning());
}

#[test]
fn animator_lifecycle() {
    let options = AnimatorOptions {
        pattern: PatternKind::Waves,
        progressive_reveal: false,
        seed: 3,
        ..AnimatorOptions::default()
    };
    let surface = BufferSurface::new(Measurement::viewport(800.0, 600.0));
    let mut animator = Animator::new(Some(surface), options);
    assert_eq!(animator.frame(0.0), Tick::Inactive);

    animator.start(0.0);
    assert_eq!(animator.state(), AnimatorState::Running);
    let now = run_until_rendered(&mut animator, 0.0);

    let text = animator.surface().map(|s| s.text.clone()).unwrap_or_default();
    let rows: Vec<&str> = text.lines().collect();
    assert!(!rows.is_empty());
    let width = rows[0].chars().count();
    assert!(rows.iter().all(|row| row.chars().count() == width));

    animator.stop();
    assert_eq!(animator.frame(now + 500.0), Tick::Inactive);
    assert!(!animator.frame(now + 500.0).should_reschedule());
}

#[test]
fn animator_without_surface_is_inert() {
    let mut animator: Animator<BufferSurface> = Animator::new(None, AnimatorOptions::default());
    animator.start(0.0);
    assert!(animator.is_inert());
    assert!(!animator.is_running());
    assert_eq!(animator.frame(16.0), Tick::Inactive);
}
