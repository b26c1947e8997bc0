use quickcheck_macros::quickcheck;
use render_bench_wasm::domain::workload::{AnimationBuffer, AnimationProfile, Bounds, WorkloadCache, WorkloadGenerator};
use std::rc::Rc;

#[quickcheck]
fn same_seed_same_workload(count: u16, seed: u64) -> bool {
    let count = usize::from(count % 2_000) + 1;
    let generator = WorkloadGenerator::default();
    let a = generator.generate(count, seed).unwrap();
    let b = generator.generate(count, seed).unwrap();
    a == b && a.len() == count
}

#[quickcheck]
fn entity_count_is_stable_across_frames(count: u8, t: f32) -> bool {
    let count = usize::from(count) + 1;
    let t = if t.is_finite() { t.abs() % 600.0 } else { 0.0 };
    let workload = WorkloadGenerator::default().generate(count, 42).unwrap();
    let mut buffer = AnimationBuffer::new();
    workload.animate_into(0.0, &mut buffer);
    workload.animate_into(t, &mut buffer);
    buffer.positions().len() == count && buffer.resize_count() == 1
}

#[test]
fn different_seeds_move_points() {
    let generator = WorkloadGenerator::default();
    let a = generator.generate(100, 1).unwrap();
    let b = generator.generate(100, 2).unwrap();
    assert_ne!(a, b);
    let ids: Vec<u32> = a.entities().iter().map(|e| e.id).collect();
    assert_eq!(ids, (0..100).collect::<Vec<_>>());
}

#[test]
fn animation_circles_base_position() {
    let workload = WorkloadGenerator::default().generate(25, 42).unwrap();
    let mut buffer = AnimationBuffer::new();
    workload.animate_into(3.5, &mut buffer);

    for (entity, moved) in workload.entities().iter().zip(buffer.positions()) {
        let profile = AnimationProfile::for_index(entity.id);
        let angle = profile.phase + 3.5 * profile.speed;
        let expected_x = entity.base.x + profile.radius * angle.cos();
        let expected_y = entity.base.y + profile.radius * angle.sin();
        assert!((moved.x - expected_x).abs() < 1e-5);
        assert!((moved.y - expected_y).abs() < 1e-5);

        let dx = f64::from(moved.x - entity.base.x);
        let dy = f64::from(moved.y - entity.base.y);
        assert!(((dx * dx + dy * dy).sqrt() - f64::from(profile.radius)).abs() < 1e-4);
    }
}

#[test]
fn animation_at_zero_keeps_phase_offset() {
    let workload = WorkloadGenerator::default().generate(1, 42).unwrap();
    let mut buffer = AnimationBuffer::new();
    workload.animate_into(0.0, &mut buffer);
    let base = workload.entities()[0].base;
    // index 0: phase 0, radius 0.002
    assert!((buffer.positions()[0].x - (base.x + 0.002)).abs() < 1e-6);
    assert!((buffer.positions()[0].y - base.y).abs() < 1e-6);
}

#[test]
fn custom_bounds_are_respected() {
    let bounds = Bounds { min_x: -1.0, max_x: 1.0, min_y: 10.0, max_y: 11.0 };
    let workload = WorkloadGenerator::new(bounds).unwrap().generate(500, 3).unwrap();
    assert!(workload.base_positions().all(|p| (-1.0..1.0).contains(&p.x) && (10.0..11.0).contains(&p.y)));

    let flipped = Bounds { min_x: 1.0, max_x: -1.0, ..bounds };
    assert!(WorkloadGenerator::new(flipped).is_err());
}

#[test]
fn cache_warms_every_size_once() {
    let mut cache = WorkloadCache::new(WorkloadGenerator::default(), 42);
    cache.warm(&[500, 1_000, 500]).unwrap();
    assert_eq!(cache.len(), 2);

    let warmed = cache.get(1_000).unwrap();
    let fetched = cache.get_or_generate(1_000).unwrap();
    assert!(Rc::ptr_eq(&warmed, &fetched));
    assert_eq!(fetched.seed(), 42);
    assert!(cache.warm(&[0]).is_err());
}
