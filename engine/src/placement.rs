use {
    crate::{config::ScatterConfig, scene::Global3},
    hecs::{Entity, World},
    nalgebra as na,
    rand::Rng,
    wilds_noise::{poisson_disk, rasterize, spiral},
};

/// Marks entity spawned by `scatter`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    pub index: usize,
}

/// Spawns marker entities at Poisson-disk distributed points
/// on the XZ plane centered at origin.
pub fn scatter(
    world: &mut World,
    config: &ScatterConfig,
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let samples = poisson_disk(
        config.width,
        config.height,
        config.min_dist,
        config.max_points,
        rng,
    );

    if let Some(path) = &config.debug_image {
        let canvas = rasterize(&samples, config.width, config.height, 4.0);
        if let Err(err) = canvas.save_to_image(path) {
            tracing::error!(
                "Failed to save layout image '{}': {}",
                path.display(),
                err
            );
        }
    }

    let half_width = config.width * 0.5;
    let half_height = config.height * 0.5;

    samples
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            let iso = na::Isometry3::translation(
                sample.x - half_width,
                0.0,
                sample.y - half_height,
            );
            world.spawn((Global3::from_iso(iso), Marker { index }))
        })
        .collect()
}

/// Positions of `count` slots on a square grid with `spacing`,
/// nearest to origin first.
pub fn spiral_layout(count: usize, spacing: f32) -> Vec<na::Point3<f32>> {
    let mut radius = 1;
    while (radius * radius) < count {
        radius += 1;
    }

    spiral(radius as u32)
        .into_iter()
        .take(count)
        .map(|(x, z)| {
            na::Point3::new(x as f32 * spacing, 0.0, z as f32 * spacing)
        })
        .collect()
}
