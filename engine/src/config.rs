use {
    animate::{
        humanoid, humanoid_limbs, Limb, SkeletonNode, VISIBILITY_THRESHOLD,
    },
    color_eyre::Report,
    eyre::WrapErr as _,
    std::path::PathBuf,
};

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    pub skeleton: SkeletonSource,

    #[serde(default)]
    pub retarget: RetargetConfig,

    #[serde(default)]
    pub scatter: ScatterConfig,
}

/// Where the rig's node hierarchy comes from.
#[derive(Clone, Debug, serde::Deserialize)]
pub enum SkeletonSource {
    Gltf { path: PathBuf },

    /// Serialized `SkeletonNode` tree.
    Ron { path: PathBuf },

    /// Humanoid skeleton matching the built-in limb table.
    Builtin,
}

impl SkeletonSource {
    #[tracing::instrument]
    pub fn load(&self) -> Result<SkeletonNode, Report> {
        match self {
            SkeletonSource::Gltf { path } => crate::gltf::load_skeleton(path)
                .wrap_err_with(|| {
                    format!("Failed to load skeleton from '{}'", path.display())
                }),
            SkeletonSource::Ron { path } => {
                let file = std::fs::File::open(path).wrap_err_with(|| {
                    format!("Failed to open skeleton '{}'", path.display())
                })?;
                Ok(ron::de::from_reader(file).wrap_err_with(|| {
                    format!("Failed to parse skeleton '{}'", path.display())
                })?)
            }
            SkeletonSource::Builtin => Ok(humanoid()),
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct RetargetConfig {
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f32,

    /// Number of frames averaged before retargeting.
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,

    /// Replaces the humanoid limb table.
    #[serde(default)]
    pub limbs: Option<Vec<Limb>>,
}

impl Default for RetargetConfig {
    fn default() -> Self {
        RetargetConfig {
            visibility_threshold: default_visibility_threshold(),
            smoothing_window: default_smoothing_window(),
            limbs: None,
        }
    }
}

impl RetargetConfig {
    pub fn limbs(&self) -> Vec<Limb> {
        match &self.limbs {
            Some(limbs) => limbs.clone(),
            None => humanoid_limbs(),
        }
    }
}

fn default_visibility_threshold() -> f32 {
    VISIBILITY_THRESHOLD
}

fn default_smoothing_window() -> usize {
    1
}

/// Area and density of procedurally placed markers.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ScatterConfig {
    #[serde(default = "default_extent")]
    pub width: f32,

    #[serde(default = "default_extent")]
    pub height: f32,

    #[serde(default = "default_min_dist")]
    pub min_dist: f32,

    #[serde(default = "default_max_points")]
    pub max_points: usize,

    /// Seed for reproducible layouts. Entropy is used when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Writes occupancy image of generated layout.
    #[serde(default)]
    pub debug_image: Option<PathBuf>,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        ScatterConfig {
            width: default_extent(),
            height: default_extent(),
            min_dist: default_min_dist(),
            max_points: default_max_points(),
            seed: None,
            debug_image: None,
        }
    }
}

fn default_extent() -> f32 {
    100.0
}

fn default_min_dist() -> f32 {
    5.0
}

fn default_max_points() -> usize {
    1000
}
