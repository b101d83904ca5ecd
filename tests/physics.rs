use discgas::core::particle::Particle;
use discgas::core::{CollisionMode, ParticleSystem};
use discgas::error::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn crowded(mode: CollisionMode, seed: u64) -> Result<ParticleSystem> {
    let mut sys = ParticleSystem::new(4.0, mode)?.with_speeds((2.0, 4.0), 1.5)?;
    let mut rng = StdRng::seed_from_u64(seed);
    sys.populate(120, [300.0, 200.0], &mut rng);
    // A clump dropped at one point, as a pointer spawn would do.
    sys.spawn(150.0, 100.0, 20, &mut rng);
    Ok(sys)
}

/// Every centre stays within [r, extent - r] after every step, in both modes.
#[test]
fn wall_invariant_holds_every_step() -> Result<()> {
    for mode in [CollisionMode::Sequential, CollisionMode::Snapshot] {
        let mut sys = crowded(mode, 99)?;
        let (w, h) = (300.0, 200.0);
        for step in 0..400 {
            sys.step(w, h);
            for (i, p) in sys.particles().iter().enumerate() {
                let r = p.radius;
                assert!(
                    p.r[0] >= r && p.r[0] <= w - r && p.r[1] >= r && p.r[1] <= h - r,
                    "{mode:?} step {step}: particle {i} escaped to {:?}",
                    p.r
                );
            }
        }
    }
    Ok(())
}

/// Shrinking the surface pulls stray particles back in on the next step.
#[test]
fn shrunk_bounds_confine_after_one_step() -> Result<()> {
    let mut sys = crowded(CollisionMode::Sequential, 3)?;
    sys.step(300.0, 200.0);
    sys.step(120.0, 80.0);
    for p in sys.particles() {
        assert!(p.r[0] >= 4.0 && p.r[0] <= 116.0, "x = {}", p.r[0]);
        assert!(p.r[1] >= 4.0 && p.r[1] <= 76.0, "y = {}", p.r[1]);
    }
    Ok(())
}

/// Head-on equal-mass collision swaps velocities and conserves energy and momentum.
#[test]
fn head_on_collision_exchanges_velocities() -> Result<()> {
    let mut sys = ParticleSystem::new(5.0, CollisionMode::Sequential)?;
    sys.push(Particle::new([50.0, 50.0], [2.0, 0.0], 5.0)?);
    sys.push(Particle::new([59.0, 50.0], [-0.5, 0.0], 5.0)?);
    let e0 = sys.kinetic_energy();
    let p0 = sys.momentum();

    let report = sys.step(200.0, 200.0);
    assert_eq!(report.contacts, 1);

    let ps = sys.particles();
    assert!((ps[0].v[0] + 0.5).abs() < 1e-12 && ps[0].v[1].abs() < 1e-12);
    assert!((ps[1].v[0] - 2.0).abs() < 1e-12 && ps[1].v[1].abs() < 1e-12);

    let e1 = sys.kinetic_energy();
    let p1 = sys.momentum();
    assert!((e1 - e0).abs() < 1e-12, "energy {e0} -> {e1}");
    assert!((p1[0] - p0[0]).abs() < 1e-12 && (p1[1] - p0[1]).abs() < 1e-12);
    Ok(())
}

/// Sequential resolution is pairwise elastic and walls only flip signs, so the
/// total kinetic energy of a closed box is conserved.
#[test]
fn sequential_mode_conserves_kinetic_energy() -> Result<()> {
    let mut sys = crowded(CollisionMode::Sequential, 2024)?;
    let e0 = sys.kinetic_energy();
    let mut contacts = 0;
    for _ in 0..300 {
        contacts += sys.step(300.0, 200.0).contacts;
    }
    let e1 = sys.kinetic_energy();
    let rel = ((e1 - e0) / e0).abs();
    assert!(contacts > 0, "expected some collisions in a crowded box");
    assert!(
        rel < 1e-9,
        "relative energy drift {} too large (E0={}, E1={})",
        rel,
        e0,
        e1
    );
    Ok(())
}

/// Snapshot mode exchanges velocity at most once per disc per step, so a
/// crowded box with many simultaneous contacts keeps its energy.
#[test]
fn snapshot_mode_conserves_kinetic_energy() -> Result<()> {
    let mut sys = crowded(CollisionMode::Snapshot, 2024)?;
    let e0 = sys.kinetic_energy();
    let p_count = sys.len();
    let mut contacts = 0;
    for step in 0..300 {
        contacts += sys.step(300.0, 200.0).contacts;
        assert!(
            sys.particles().iter().all(|p| p.r.iter().chain(&p.v).all(|c| c.is_finite())),
            "non-finite state at step {step}"
        );
    }
    let e1 = sys.kinetic_energy();
    let rel = ((e1 - e0) / e0).abs();
    assert_eq!(sys.len(), p_count);
    assert!(contacts > 0, "expected some collisions in a crowded box");
    assert!(rel < 1e-9, "relative energy drift {rel} (E0={e0}, E1={e1})");
    Ok(())
}

/// Particles spawned on one point spread out instead of staying stacked.
#[test]
fn stacked_spawn_separates() -> Result<()> {
    let mut sys = ParticleSystem::new(4.0, CollisionMode::Sequential)?;
    let mut rng = StdRng::seed_from_u64(8);
    sys.spawn(100.0, 100.0, 10, &mut rng);
    for _ in 0..30 {
        sys.step(200.0, 200.0);
    }
    let ps = sys.particles();
    let distinct = ps
        .iter()
        .enumerate()
        .all(|(i, a)| ps[i + 1..].iter().all(|b| a.r != b.r));
    assert!(distinct, "spawned particles should no longer share a centre");
    Ok(())
}

/// The two collision modes agree when only one pair is touching.
#[test]
fn modes_agree_on_isolated_pair() -> Result<()> {
    let mut results = Vec::new();
    for mode in [CollisionMode::Sequential, CollisionMode::Snapshot] {
        let mut sys = ParticleSystem::new(3.0, mode)?;
        sys.push(Particle::new([30.0, 30.0], [1.0, 0.5], 3.0)?);
        sys.push(Particle::new([34.0, 33.0], [-0.5, -1.0], 3.0)?);
        sys.step(100.0, 100.0);
        results.push(sys.particles().iter().map(|p| p.v).collect::<Vec<_>>());
    }
    for (a, b) in results[0].iter().zip(&results[1]) {
        assert!((a[0] - b[0]).abs() < 1e-12 && (a[1] - b[1]).abs() < 1e-12);
    }
    Ok(())
}
