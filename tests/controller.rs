use discgas::core::particle::Particle;
use discgas::error::Result;
use discgas::{SimConfig, Simulation};
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn quiet(initial: usize) -> SimConfig {
    SimConfig {
        width: 400.0,
        height: 300.0,
        initial_particles: initial,
        spawn_burst: 3,
        spawn_repeat_ms: 50,
        seed: Some(42),
        ..SimConfig::default()
    }
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Holding the pointer spawns a burst immediately and then one per repeat
/// interval; releasing stops it, and releasing twice is harmless.
#[test]
fn held_spawn_repeats_until_cancelled() -> Result<()> {
    init_logging();
    let mut sim = Simulation::new(quiet(0))?;
    let hold = sim.begin_spawn(200.0, 150.0, ms(0));
    assert_eq!(sim.num_particles(), 3);

    // Frames at 16 ms up to 208 ms: bursts at 64, 112, 160 and 208.
    for f in 1..=13u64 {
        sim.step(ms(f * 16));
    }
    assert_eq!(sim.num_particles(), 15);
    assert_eq!(sim.active_spawners(), 1);

    hold.cancel();
    hold.cancel();
    for f in 14..=40u64 {
        sim.step(ms(f * 16));
    }
    assert_eq!(sim.num_particles(), 15);
    assert_eq!(sim.active_spawners(), 0);
    Ok(())
}

/// Losing the handle cannot leak a repeating task.
#[test]
fn dropped_handle_stops_spawning() -> Result<()> {
    let mut sim = Simulation::new(quiet(0))?;
    drop(sim.begin_spawn(10.0, 10.0, ms(0)));
    for f in 1..=20u64 {
        sim.step(ms(f * 16));
    }
    assert_eq!(sim.num_particles(), 3);
    Ok(())
}

/// A held spawn follows pointer moves.
#[test]
fn moved_spawn_emits_at_new_point() -> Result<()> {
    let mut sim = Simulation::new(quiet(0))?;
    let hold = sim.begin_spawn(50.0, 50.0, ms(0));
    assert!(sim.move_spawn(&hold, 300.0, 200.0));
    sim.tick_spawners(ms(50));
    let moved = sim.particles()[3..]
        .iter()
        .all(|p| p.r == [300.0, 200.0]);
    assert!(moved);
    Ok(())
}

/// The particle cap truncates spawns instead of growing without bound.
#[test]
fn cap_limits_growth() -> Result<()> {
    let cfg = SimConfig {
        max_particles: Some(12),
        ..quiet(5)
    };
    let mut sim = Simulation::new(cfg)?;
    assert_eq!(sim.spawn(100.0, 100.0, 4), 4);
    assert_eq!(sim.spawn(100.0, 100.0, 4), 3);
    let _hold = sim.begin_spawn(100.0, 100.0, ms(0));
    for f in 1..=30u64 {
        sim.step(ms(f * 16));
    }
    assert_eq!(sim.num_particles(), 12);
    assert_eq!(sim.views().count(), 12);
    Ok(())
}

/// Non-positive spawn counts are no-ops.
#[test]
fn non_positive_spawn_is_ignored() -> Result<()> {
    let mut sim = Simulation::new(quiet(2))?;
    assert_eq!(sim.spawn(10.0, 10.0, 0), 0);
    assert_eq!(sim.spawn(10.0, 10.0, -3), 0);
    assert_eq!(sim.num_particles(), 2);
    Ok(())
}

/// Entropy is measured after the physics step, so a sample reflects the
/// positions the renderer will draw.
#[test]
fn sample_reflects_post_step_positions() -> Result<()> {
    let mut sim = Simulation::new(SimConfig {
        grid_size: 4,
        ..quiet(0)
    })?;
    // Two discs in the same cell, one about to cross into the next column.
    sim.insert(Particle::new([10.0, 10.0], [0.0, 0.0], 4.0)?);
    sim.insert(Particle::new([99.0, 10.0], [3.0, 0.0], 4.0)?);
    let s = sim.step(ms(0)).expect("first frame samples");
    assert!((s.h - 2f64.ln()).abs() < 1e-12, "{s}");
    Ok(())
}

/// Views pair every particle with its tint, in container order.
#[test]
fn views_follow_particles() -> Result<()> {
    let mut sim = Simulation::new(quiet(7))?;
    sim.spawn(20.0, 30.0, 2);
    let views: Vec<_> = sim.views().collect();
    assert_eq!(views.len(), 9);
    assert_eq!((views[7].x, views[7].y), (20.0, 30.0));
    assert!(views.iter().all(|v| (0.0..360.0).contains(&v.tint.hue)));
    Ok(())
}

/// Config survives a trip through a JSON file and builds an equivalent simulation.
#[test]
fn config_file_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sim.json");
    let cfg = SimConfig {
        grid_size: 16,
        history_capacity: 50,
        ..quiet(25)
    };
    cfg.save(&path)?;
    assert_eq!(SimConfig::load(&path)?, cfg);

    let mut a = Simulation::from_config_file(&path)?;
    let mut b = Simulation::new(cfg)?;
    for f in 0..20u64 {
        a.step(ms(f * 16));
        b.step(ms(f * 16));
    }
    assert_eq!(a.particles(), b.particles());
    assert_eq!(a.history().len(), b.history().len());
    Ok(())
}

/// A malformed or out-of-range config file is an error, not a panic.
#[test]
fn bad_config_file_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"grid_size": 0}"#)?;
    assert!(Simulation::from_config_file(&path).is_err());
    std::fs::write(&path, "{ not json")?;
    assert!(matches!(
        SimConfig::load(&path),
        Err(discgas::Error::Config(_))
    ));
    Ok(())
}
