pub mod config;
pub mod driver;
pub mod gltf;
pub mod placement;
pub mod rig;
pub mod scene;

pub use self::{
    config::{Config, RetargetConfig, ScatterConfig, SkeletonSource},
    driver::{FrameDriver, Tick},
    placement::{scatter, spiral_layout, Marker},
    rig::{Bone, Rig, RigError},
    scene::{update_globals, Global3, Local3},
};
