mod config;
mod estimator;

use {
    self::{config::Config, estimator::Source},
    animate::{
        decode_frames,
        filter::{is_lower_body_visible, is_upper_body_visible, visible_joints},
        MotionPlayer, Retargeter, SkeletonGraph,
    },
    color_eyre::Report,
    eyre::WrapErr as _,
    hecs::World,
    nalgebra as na,
    rand::{rngs::StdRng, Rng as _, SeedableRng as _},
    std::time::Duration,
    wilds::{scatter, update_globals, FrameDriver, Global3, Rig},
};

fn main() -> Result<(), Report> {
    install_tracing();
    color_eyre::install()?;

    tracing::info!("Running at {}", std::env::current_dir()?.display());

    let config = Config::load_default()?;
    tracing::info!("Config loaded: {:?}", config);

    let rate = config.game.frames.rate;
    if !(rate > 0.0 && rate.is_finite()) {
        eyre::bail!("Tick rate must be positive, got {}", rate);
    }

    let skeleton = config.engine.skeleton.load()?;
    let graph = SkeletonGraph::build(&skeleton);
    let retargeter =
        Retargeter::bind(&graph, &config.engine.retarget.limbs())
            .wrap_err("Limb table does not match skeleton")?
            .with_threshold(config.engine.retarget.visibility_threshold);

    let mut rng = match config.engine.scatter.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut world = World::new();
    let markers = scatter(&mut world, &config.engine.scatter, &mut rng);
    tracing::info!("{} markers placed", markers.len());

    let rig = Rig::spawn(&graph, na::Isometry3::identity(), &mut world);

    let source = match &config.game.motion {
        Some(motion) => {
            let bytes = std::fs::read(&motion.path).wrap_err_with(|| {
                format!("Failed to read motion '{}'", motion.path.display())
            })?;
            let frames = decode_frames(&bytes)?;
            tracing::info!("{} motion frames decoded", frames.len());
            Source::Motion(
                MotionPlayer::new(frames, motion.fps)?
                    .with_looping(motion.looping),
            )
        }
        None => Source::Synthetic { seed: rng.gen() },
    };

    let (sender, receiver) = flume::bounded(64);
    let estimator = estimator::spawn(source, rate, sender)?;

    let mut driver = FrameDriver::new(
        &graph,
        retargeter,
        config.engine.retarget.smoothing_window,
        receiver,
    );

    let period = Duration::from_secs_f32(1.0 / rate);

    for index in 0..config.game.frames.count {
        let tick = driver.tick(&graph)?;

        if tick.disconnected {
            tracing::warn!("Estimator stopped");
            break;
        }

        if let (Some(report), Some(frame)) =
            (&tick.report, driver.latest_frame())
        {
            tracing::debug!(
                frame = index,
                upper = is_upper_body_visible(frame),
                lower = is_lower_body_visible(frame),
                visible = visible_joints(frame).len(),
                updated = report.updated.len(),
                skipped = report.skipped.len(),
                "Pose updated",
            );
        }

        rig.sync(driver.pose(), &mut world)?;
        update_globals(&mut world);

        std::thread::sleep(period);
    }

    for name in ["Head", "LeftHand", "RightHand"].iter() {
        let entity = graph.get(name).and_then(|bone| rig.bone_entity(bone));
        if let Some(entity) = entity {
            if let Ok(global) = world.get::<Global3>(entity) {
                tracing::info!(
                    "{} ends at {:?}",
                    name,
                    global.translation()
                );
            }
        }
    }

    drop(driver);
    if estimator.join().is_err() {
        tracing::error!("Estimator thread panicked");
    }

    rig.despawn(&mut world);
    Ok(())
}

fn install_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(tracing_error::ErrorLayer::default())
        .init();
}
