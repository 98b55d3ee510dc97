//! Point distributions for procedural placement.

mod canvas;
mod poisson;
mod spiral;

pub use self::{
    canvas::Canvas,
    poisson::{poisson_disk, rasterize, Sample, ATTEMPTS},
    spiral::spiral,
};
