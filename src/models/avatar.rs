/// Largest accepted avatar upload, in bytes.
pub const MAX_AVATAR_BYTES: usize = 1_000_000;

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Stored avatar image together with the content type it is served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Avatar {
    /// Accepts PNG or JPEG data within the size limit, detecting the format
    /// from the file signature rather than trusting the client.
    pub fn from_upload(bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > MAX_AVATAR_BYTES {
            return None;
        }
        let content_type = if bytes.starts_with(PNG_SIGNATURE) {
            "image/png"
        } else if bytes.starts_with(JPEG_SIGNATURE) {
            "image/jpeg"
        } else {
            return None;
        };
        Some(Self {
            content_type: content_type.to_string(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_png_and_jpeg() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(b"rest");
        assert_eq!(Avatar::from_upload(png).unwrap().content_type, "image/png");

        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        assert_eq!(
            Avatar::from_upload(jpeg).unwrap().content_type,
            "image/jpeg"
        );
    }

    #[test]
    fn test_rejects_other_content() {
        assert!(Avatar::from_upload(Vec::new()).is_none());
        assert!(Avatar::from_upload(b"GIF89a....".to_vec()).is_none());

        let mut oversized = PNG_SIGNATURE.to_vec();
        oversized.resize(MAX_AVATAR_BYTES + 1, 0);
        assert!(Avatar::from_upload(oversized).is_none());
    }
}
