//! Output encoding.
//!
//! Every finished render leaves the engine as a JPEG `data:` URI. Alpha is
//! dropped on the way out; composited frames are opaque anyway.
//!
//! # Examples
//!
//! ```ignore
//! use image::RgbaImage;
//! use storykit_core::encode::encode_data_uri;
//!
//! let frame = RgbaImage::new(100, 100);
//! let uri = encode_data_uri(&frame, 85).unwrap();
//! assert!(uri.starts_with("data:image/jpeg;base64,"));
//! ```

mod data_uri;
mod jpeg;

pub use data_uri::{encode_data_uri, JPEG_DATA_URI_PREFIX};
pub use jpeg::{encode_jpeg, EncodeError};
