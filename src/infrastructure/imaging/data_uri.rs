use base64::{engine::general_purpose::STANDARD, Engine};

use super::ImageError;

/// A decoded `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl DataUri {
    pub fn parse(input: &str) -> Result<Self, ImageError> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ImageError::InvalidDataUri("missing data: scheme".into()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ImageError::InvalidDataUri("missing payload separator".into()))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ImageError::InvalidDataUri("only base64 payloads are supported".into()))?;

        if mime_type.is_empty() {
            return Err(ImageError::InvalidDataUri("missing media type".into()));
        }

        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| ImageError::InvalidDataUri(e.to_string()))?;

        Ok(DataUri {
            mime_type: mime_type.to_ascii_lowercase(),
            data,
        })
    }

    pub fn encode(mime_type: &str, data: &[u8]) -> String {
        format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base64_payload() {
        let uri = DataUri::parse("data:image/PNG;base64,aGVsbG8=").unwrap();
        assert_eq!(uri.mime_type, "image/png");
        assert_eq!(uri.data, b"hello");
    }

    #[test]
    fn encode_produces_parseable_uri() {
        let encoded = DataUri::encode("video/mp4", b"\x00\x01\x02");
        assert_eq!(encoded, "data:video/mp4;base64,AAEC");
        assert_eq!(DataUri::parse(&encoded).unwrap().data, vec![0, 1, 2]);
    }

    #[test]
    fn rejects_malformed_uris() {
        assert!(DataUri::parse("image/png;base64,aGVsbG8=").is_err());
        assert!(DataUri::parse("data:image/png,hello").is_err());
        assert!(DataUri::parse("data:image/png;base64").is_err());
        assert!(DataUri::parse("data:;base64,aGVsbG8=").is_err());
        assert!(DataUri::parse("data:image/png;base64,***").is_err());
    }
}
