//! Canonical profile image encoding.
//!
//! Every uploaded profile image is decoded (any format the `image` crate can
//! sniff from its content) and re-encoded as lossy WebP at a fixed quality.
//! The codec is stateless; a decode failure is permanent for that input.

use bytes::Bytes;
use thiserror::Error;

/// Content type of every stored profile image.
pub const CANONICAL_CONTENT_TYPE: &str = "image/webp";

/// File extension of every stored profile image.
pub const CANONICAL_EXTENSION: &str = "webp";

/// Lossy WebP quality (0-100).
pub const CANONICAL_QUALITY: f32 = 80.0;

/// Errors from decoding or re-encoding an uploaded image.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The upload contained no bytes.
    #[error("image is empty")]
    Empty,

    /// The bytes are not a decodable image.
    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The WebP encoder rejected the decoded image.
    #[error("cannot encode image as webp: {0}")]
    Encode(String),
}

/// An image in the canonical encoding.
#[derive(Debug, Clone)]
pub struct CanonicalImage {
    /// Encoded WebP bytes.
    pub bytes: Bytes,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Decode `raw` and re-encode it in the canonical format.
///
/// CPU-bound; call from `spawn_blocking` inside async handlers.
///
/// # Errors
///
/// Returns `CodecError` if the input is empty, cannot be decoded, or cannot
/// be encoded as WebP (e.g. dimensions beyond the WebP limit).
pub fn encode_canonical(raw: &[u8]) -> Result<CanonicalImage, CodecError> {
    if raw.is_empty() {
        return Err(CodecError::Empty);
    }

    let decoded = image::load_from_memory(raw)?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let encoded = webp::Encoder::from_rgba(rgba.as_raw(), width, height)
        .encode_simple(false, CANONICAL_QUALITY)
        .map_err(|e| CodecError::Encode(format!("{e:?}")))?;

    Ok(CanonicalImage {
        bytes: Bytes::copy_from_slice(&encoded),
        width,
        height,
    })
}

/// Accept an image pushed by the peer node.
///
/// The peer already stored its copy in the canonical encoding, so WebP input
/// is kept byte-for-byte once it decodes. Anything else goes through
/// [`encode_canonical`].
///
/// # Errors
///
/// Returns `CodecError` under the same conditions as [`encode_canonical`].
pub fn accept_replica(raw: &[u8]) -> Result<CanonicalImage, CodecError> {
    if raw.is_empty() {
        return Err(CodecError::Empty);
    }
    if !matches!(image::guess_format(raw), Ok(image::ImageFormat::WebP)) {
        return encode_canonical(raw);
    }

    let decoded = image::load_from_memory_with_format(raw, image::ImageFormat::WebP)?;
    Ok(CanonicalImage {
        bytes: Bytes::copy_from_slice(raw),
        width: decoded.width(),
        height: decoded.height(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    /// Encode a small gradient in the given format.
    pub(crate) fn sample_image(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(16, 8, |x, y| {
            #[allow(clippy::cast_possible_truncation)] // coordinates are tiny
            Rgb([(x * 16) as u8, (y * 32) as u8, 128])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn is_webp(bytes: &[u8]) -> bool {
        bytes.len() > 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
    }

    #[test]
    fn test_png_becomes_webp() {
        let canonical = encode_canonical(&sample_image(ImageFormat::Png)).unwrap();
        assert!(is_webp(&canonical.bytes));
        assert_eq!((canonical.width, canonical.height), (16, 8));

        let decoded = image::load_from_memory(&canonical.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
        assert_eq!(
            image::guess_format(&canonical.bytes).unwrap(),
            ImageFormat::WebP
        );
    }

    #[test]
    fn test_jpeg_becomes_webp() {
        let canonical = encode_canonical(&sample_image(ImageFormat::Jpeg)).unwrap();
        assert!(is_webp(&canonical.bytes));
    }

    #[test]
    fn test_reencoding_canonical_output_is_stable_in_format() {
        let first = encode_canonical(&sample_image(ImageFormat::Png)).unwrap();
        let second = encode_canonical(&first.bytes).unwrap();
        assert!(is_webp(&second.bytes));
        assert_eq!((second.width, second.height), (16, 8));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(encode_canonical(&[]), Err(CodecError::Empty)));
        assert!(matches!(accept_replica(&[]), Err(CodecError::Empty)));
    }

    #[test]
    fn test_replica_webp_is_kept_verbatim() {
        let canonical = encode_canonical(&sample_image(ImageFormat::Png)).unwrap();
        let replica = accept_replica(&canonical.bytes).unwrap();
        assert_eq!(replica.bytes, canonical.bytes);
        assert_eq!((replica.width, replica.height), (16, 8));
    }

    #[test]
    fn test_replica_in_other_format_is_reencoded() {
        let replica = accept_replica(&sample_image(ImageFormat::Png)).unwrap();
        assert!(is_webp(&replica.bytes));
    }

    #[test]
    fn test_replica_with_webp_header_but_broken_body() {
        let mut webp = encode_canonical(&sample_image(ImageFormat::Png))
            .unwrap()
            .bytes
            .to_vec();
        webp.truncate(20);
        assert!(matches!(accept_replica(&webp), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_garbage_input() {
        let err = encode_canonical(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
        assert!(err.to_string().starts_with("cannot decode image"));
    }

    #[test]
    fn test_truncated_png() {
        let mut png = sample_image(ImageFormat::Png);
        png.truncate(png.len() / 2);
        assert!(encode_canonical(&png).is_err());
    }
}
