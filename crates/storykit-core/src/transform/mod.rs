//! Transform stack for the crop stage.
//!
//! # Transform Order
//!
//! The crop viewport is drawn the way a 2D canvas context is driven:
//! 1. Translate to the viewport center plus the pan offset
//! 2. Rotate by `rotation_deg`
//! 3. Scale by `zoom`
//! 4. Draw the source centered, aspect-filled to the viewport
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = clockwise on screen (y down)
//! - Pan offset is in viewport pixels
//! - Origin is top-left corner

mod crop;

pub use crop::{aspect_fill_size, render_crop_viewport, CropTransform};
