use {
    color_eyre::Report,
    eyre::WrapErr as _,
    std::path::{Path, PathBuf},
};

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    pub engine: wilds::config::Config,

    #[serde(default)]
    pub game: GameConfig,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct GameConfig {
    /// Recorded motion replayed instead of synthetic frames.
    #[serde(default)]
    pub motion: Option<MotionConfig>,

    #[serde(default)]
    pub frames: FramesConfig,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct MotionConfig {
    pub path: PathBuf,

    #[serde(default = "default_rate")]
    pub fps: f32,

    #[serde(default = "default_looping")]
    pub looping: bool,
}

#[derive(Clone, Copy, Debug, serde::Deserialize)]
pub struct FramesConfig {
    /// Number of ticks before the demo exits.
    #[serde(default = "default_count")]
    pub count: usize,

    /// Ticks per second.
    #[serde(default = "default_rate")]
    pub rate: f32,
}

impl Default for FramesConfig {
    fn default() -> Self {
        FramesConfig {
            count: default_count(),
            rate: default_rate(),
        }
    }
}

fn default_count() -> usize {
    300
}

fn default_rate() -> f32 {
    30.0
}

fn default_looping() -> bool {
    true
}

impl Config {
    pub fn load_default() -> Result<Self, Report> {
        let path = std::env::var("WILDS_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./cfg.ron"));

        Self::load(&path)
    }

    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, Report> {
        let file = std::fs::File::open(path).wrap_err_with(|| {
            format!("Failed to open config '{}'", path.display())
        })?;

        let config = ron::de::from_reader(file).wrap_err_with(|| {
            format!("Failed to parse config '{}'", path.display())
        })?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses() {
        let config: Config =
            ron::de::from_str(include_str!("../../cfg.ron")).unwrap();
        assert!(config.game.frames.rate > 0.0);
        assert!(config.engine.scatter.min_dist > 0.0);
    }

    #[test]
    fn game_section_is_optional() {
        let config: Config =
            ron::de::from_str("(engine: (skeleton: Builtin))").unwrap();
        assert!(config.game.motion.is_none());
        assert_eq!(config.game.frames.count, 300);
        assert_eq!(config.game.frames.rate, 30.0);
    }
}
