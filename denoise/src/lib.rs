mod config;
mod error;
mod estimator;
mod filter;
mod noise;
mod padding;
mod raster;

pub mod backend;
pub mod prelude;

pub use prelude::*;
