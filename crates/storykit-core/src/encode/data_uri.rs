use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::RgbaImage;

use super::{encode_jpeg, EncodeError};

pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Encode `image` as a base64 JPEG `data:` URI.
pub fn encode_data_uri(image: &RgbaImage, quality: u8) -> Result<String, EncodeError> {
    let jpeg = encode_jpeg(image, quality)?;
    let mut uri = String::with_capacity(JPEG_DATA_URI_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
    uri.push_str(JPEG_DATA_URI_PREFIX);
    BASE64_STANDARD.encode_string(&jpeg, &mut uri);
    Ok(uri)
}
