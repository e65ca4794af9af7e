pub mod annotate;
pub mod cell_sampler;
pub mod color_classifier;
pub mod debug_sink;
pub mod filters;
pub mod grid_extractor;
pub mod motion_gate;
pub mod position;
