//! Sliding-window flood counter

mod window;

pub use window::FloodCounter;
