//! `multipart/form-data` encoding for complaint photos.

use image::ImageFormat;
use thiserror::Error;

use crate::complaint::ComplaintId;
use crate::{AppError, ErrorKind, IMAGE_FORM_FIELD, MAX_IMAGE_BYTES};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("image bytes empty")]
    EmptyImage,

    #[error("image too large: {size} bytes, max {max}")]
    TooLarge { size: usize, max: usize },

    #[error("unsupported image format: {format}")]
    UnsupportedFormat { format: String },
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        let kind = match e {
            UploadError::TooLarge { .. } => ErrorKind::ImageTooLarge,
            UploadError::EmptyImage | UploadError::UnsupportedFormat { .. } => {
                ErrorKind::ImageFormatUnsupported
            }
        };
        let message = AppError::new(kind, String::new()).user_facing_message();
        AppError::new(kind, message).with_internal(e.to_string())
    }
}

/// The image formats the backend stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoFormat {
    Jpeg,
    Png,
    WebP,
}

impl PhotoFormat {
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }
}

/// A picked photo waiting to be uploaded with a complaint.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    bytes: Vec<u8>,
    format: PhotoFormat,
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("len", &self.bytes.len())
            .field("format", &self.format)
            .finish()
    }
}

impl ImageAttachment {
    /// Sniffs the format from the magic bytes. Bytes no decoder recognises
    /// are sent as JPEG; a recognised format other than JPEG, PNG or WebP is
    /// refused.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::EmptyImage);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                max: MAX_IMAGE_BYTES,
            });
        }

        let format = match image::guess_format(&bytes) {
            Ok(ImageFormat::Jpeg) | Err(_) => PhotoFormat::Jpeg,
            Ok(ImageFormat::Png) => PhotoFormat::Png,
            Ok(ImageFormat::WebP) => PhotoFormat::WebP,
            Ok(other) => {
                return Err(UploadError::UnsupportedFormat {
                    format: format!("{other:?}"),
                })
            }
        };
        Ok(Self { bytes, format })
    }

    #[must_use]
    pub fn format(&self) -> PhotoFormat {
        self.format
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn file_name(&self, complaint: ComplaintId) -> String {
        format!("complaint_{complaint}.{}", self.format.extension())
    }
}

/// A finished form body and the `Content-Type` header that goes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// One file part under the `image` field.
#[must_use]
pub fn encode_image(complaint: ComplaintId, attachment: &ImageAttachment) -> MultipartBody {
    let boundary = format!("----campus{}", uuid::Uuid::new_v4().simple());
    let head = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{IMAGE_FORM_FIELD}\"; filename=\"{}\"\r\n\
         Content-Type: {}\r\n\r\n",
        attachment.file_name(complaint),
        attachment.format.mime_type(),
    );
    let tail = format!("\r\n--{boundary}--\r\n");

    let mut body = Vec::with_capacity(head.len() + attachment.bytes.len() + tail.len());
    body.extend_from_slice(head.as_bytes());
    body.extend_from_slice(&attachment.bytes);
    body.extend_from_slice(tail.as_bytes());

    MultipartBody {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];
    const GIF_MAGIC: &[u8] = b"GIF89a\x01\x00\x01\x00";

    #[test]
    fn test_sniffs_known_formats() {
        let png = ImageAttachment::from_bytes(PNG_MAGIC.to_vec()).unwrap();
        assert_eq!(png.format(), PhotoFormat::Png);
        assert_eq!(png.file_name(ComplaintId(42)), "complaint_42.png");

        let jpeg = ImageAttachment::from_bytes(JPEG_MAGIC.to_vec()).unwrap();
        assert_eq!(jpeg.format(), PhotoFormat::Jpeg);
    }

    #[test]
    fn test_unrecognised_bytes_fall_back_to_jpeg() {
        let attachment = ImageAttachment::from_bytes(b"not an image".to_vec()).unwrap();
        assert_eq!(attachment.format(), PhotoFormat::Jpeg);
        assert_eq!(attachment.file_name(ComplaintId(7)), "complaint_7.jpg");
    }

    #[test]
    fn test_rejects_other_formats_and_sizes() {
        assert_matches!(
            ImageAttachment::from_bytes(GIF_MAGIC.to_vec()),
            Err(UploadError::UnsupportedFormat { .. })
        );
        assert_matches!(ImageAttachment::from_bytes(Vec::new()), Err(UploadError::EmptyImage));
        assert_matches!(
            ImageAttachment::from_bytes(vec![0; MAX_IMAGE_BYTES + 1]),
            Err(UploadError::TooLarge { .. })
        );
    }

    #[test]
    fn test_upload_error_maps_to_kind() {
        let error: AppError = UploadError::TooLarge { size: 11, max: 10 }.into();
        assert_eq!(error.kind, ErrorKind::ImageTooLarge);
        assert_eq!(error.message, "Photos must be under 10 MB");
        assert!(error.internal_message.unwrap().contains("11 bytes"));
    }

    #[test]
    fn test_encoded_body_layout() {
        let attachment = ImageAttachment::from_bytes(PNG_MAGIC.to_vec()).unwrap();
        let encoded = encode_image(ComplaintId(42), &attachment);

        let boundary = encoded
            .content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap()
            .to_string();
        let text = String::from_utf8_lossy(&encoded.body);

        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.contains(
            "Content-Disposition: form-data; name=\"image\"; filename=\"complaint_42.png\"\r\n"
        ));
        assert!(text.contains("Content-Type: image/png\r\n\r\n"));
        assert!(text.ends_with(&format!("\r\n--{boundary}--\r\n")));
        assert!(encoded
            .body
            .windows(PNG_MAGIC.len())
            .any(|w| w == PNG_MAGIC));
    }

    #[test]
    fn test_debug_hides_bytes() {
        let attachment = ImageAttachment::from_bytes(PNG_MAGIC.to_vec()).unwrap();
        assert_eq!(
            format!("{attachment:?}"),
            "ImageAttachment { len: 12, format: Png }"
        );
    }
}
