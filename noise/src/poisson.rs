use {
    crate::canvas::Canvas,
    rand::{distributions::uniform::Uniform, Rng},
    smallvec::SmallVec,
    std::{
        collections::HashMap,
        f32::consts::{SQRT_2, TAU},
    },
};

/// Candidates tried around an active sample before it is retired.
pub const ATTEMPTS: usize = 30;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
}

impl Sample {
    pub fn distance(&self, other: &Sample) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Limits the number of cells along either side of the area.
const MAX_CELLS_PER_AXIS: f32 = 1_048_576.0;

/// Sparse background grid.
///
/// Cells are never smaller than `min_dist / sqrt(2)`, so a sample closer
/// than `min_dist` to a candidate is at most two cells away on each axis.
struct Grid {
    cell: f32,
    cells: HashMap<(i64, i64), SmallVec<[usize; 1]>>,
}

impl Grid {
    fn new(width: f32, height: f32, min_dist: f32) -> Self {
        let cell = (min_dist / SQRT_2)
            .max(width.max(height) / MAX_CELLS_PER_AXIS);

        Grid {
            cell,
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, sample: &Sample) -> (i64, i64) {
        (
            (sample.x / self.cell).floor() as i64,
            (sample.y / self.cell).floor() as i64,
        )
    }

    fn insert(&mut self, sample: &Sample, index: usize) {
        let cell = self.cell_of(sample);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Checks 5x5 cells around the candidate.
    fn is_free(
        &self,
        candidate: &Sample,
        points: &[Sample],
        min_dist: f32,
    ) -> bool {
        let (cx, cy) = self.cell_of(candidate);

        for y in cy - 2..=cy + 2 {
            for x in cx - 2..=cx + 2 {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    let close = indices.iter().any(|&index| {
                        candidate.distance(&points[index]) < min_dist
                    });
                    if close {
                        return false;
                    }
                }
            }
        }

        true
    }
}

/// Generates points in `[0, width) x [0, height)` no closer than `min_dist`
/// to each other.
///
/// Sampling stops when no active point can spawn a neighbour or when
/// `max_points` points were generated.
/// Empty when `max_points` is zero or the area is degenerate.
pub fn poisson_disk(
    width: f32,
    height: f32,
    min_dist: f32,
    max_points: usize,
    rng: &mut impl Rng,
) -> Vec<Sample> {
    if max_points == 0
        || !(width > 0.0 && height > 0.0 && min_dist > 0.0)
        || !(width.is_finite() && height.is_finite())
    {
        return Vec::new();
    }

    let first = Sample {
        x: rng.sample(Uniform::new(0.0, width)),
        y: rng.sample(Uniform::new(0.0, height)),
    };

    if !min_dist.is_finite() {
        return vec![first];
    }

    let mut grid = Grid::new(width, height, min_dist);
    let mut points = Vec::new();
    let mut active = Vec::new();

    grid.insert(&first, 0);
    points.push(first);
    active.push(0);

    let unit = Uniform::new(0.0f32, 1.0);

    while !active.is_empty() && points.len() < max_points {
        let slot = rng.gen_range(0..active.len());
        let origin = points[active[slot]];

        let found = (0..ATTEMPTS).find_map(|_| {
            let radius = min_dist * (1.0 + rng.sample(unit));
            let angle = TAU * rng.sample(unit);
            let candidate = Sample {
                x: origin.x + radius * angle.cos(),
                y: origin.y + radius * angle.sin(),
            };

            let inside = candidate.x >= 0.0
                && candidate.x < width
                && candidate.y >= 0.0
                && candidate.y < height;

            if inside && grid.is_free(&candidate, &points, min_dist) {
                Some(candidate)
            } else {
                None
            }
        });

        match found {
            Some(sample) => {
                let index = points.len();
                grid.insert(&sample, index);
                points.push(sample);
                active.push(index);
            }
            None => {
                active.swap_remove(slot);
            }
        }
    }

    tracing::debug!(
        "Poisson disk sampling produced {} points in {}x{} with min distance {}",
        points.len(),
        width,
        height,
        min_dist,
    );

    points
}

/// Marks every sample in a canvas covering `width x height` at `scale`
/// pixels per unit.
pub fn rasterize(
    points: &[Sample],
    width: f32,
    height: f32,
    scale: f32,
) -> Canvas<u8> {
    let w = (width * scale).ceil().max(0.0) as usize;
    let h = (height * scale).ceil().max(0.0) as usize;
    let mut canvas = Canvas::new(w, h, 0);

    for sample in points {
        let x = (sample.x * scale).floor();
        let y = (sample.y * scale).floor();
        if x >= 0.0 && y >= 0.0 && (x as usize) < w && (y as usize) < h {
            *canvas.pixel(x as usize, y as usize) = 255;
        }
    }

    canvas
}
