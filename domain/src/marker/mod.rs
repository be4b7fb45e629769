//! Marker rendering model
//!
//! Pure mapping from a problem snapshot to how its map pin looks: size grows
//! with confirmations, color follows status.

pub mod style;

pub use style::{
    BASE_MARKER_SIZE, ColorToken, MARKER_SIZE_STEP, MAX_MARKER_SIZE, MarkerStyle, visual_color,
    visual_weight,
};
