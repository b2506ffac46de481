//! Media acquisition and decoding.
//!
//! This module provides functionality for:
//! - Resolving media and sticker URIs to bytes through an [`AssetLoader`]
//! - Parsing `data:` URIs
//! - Decoding JPEG/PNG/WebP bytes to RGBA with EXIF orientation applied
//!
//! # Architecture
//!
//! Fetching is the host's job. In the browser the host fetches asynchronously
//! and hands bytes to a [`MemoryLoader`]; decoding itself is synchronous.

mod codec;
mod source;
mod ticket;
mod types;

pub use codec::{decode_image, get_orientation, load_image};
pub use source::{parse_data_uri, AssetLoader, MemoryLoader};
pub use ticket::{DecodeSlot, DecodeTicket, StaleDecode};
pub use types::{DecodeError, MediaAsset, MediaKind, Orientation};
