//! Visit passes rendered as QR codes

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use serde::Serialize;
use std::io::Cursor;
use uuid::Uuid;

use crate::error::{VisitsError, VisitsResult};

/// Smallest rendered side, in pixels
const MIN_SIZE: u32 = 256;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Data encoded in a visit pass; unset fields are left out
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitPass {
    pub visit_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
}

impl VisitPass {
    pub fn new(visit_id: Uuid) -> Self {
        Self {
            visit_id,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// JSON text stored in the code
    pub fn payload(&self) -> VisitsResult<String> {
        serde_json::to_string(self).map_err(|e| VisitsError::Qr(e.to_string()))
    }

    /// PNG data URL of the pass
    pub fn to_data_url(&self) -> VisitsResult<String> {
        render_data_url(&self.payload()?)
    }
}

/// Render `payload` as a QR code PNG wrapped in a `data:` URL
pub fn render_data_url(payload: &str) -> VisitsResult<String> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| VisitsError::Qr(e.to_string()))?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_SIZE, MIN_SIZE)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| VisitsError::Qr(e.to_string()))?;

    Ok(format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(png)))
}

/// PNG bytes inside a data URL made by `render_data_url`
pub fn png_bytes(data_url: &str) -> VisitsResult<Vec<u8>> {
    let encoded = data_url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| VisitsError::Qr("Not a PNG data URL".to_string()))?;
    STANDARD
        .decode(encoded)
        .map_err(|e| VisitsError::Qr(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_uses_camel_case_and_skips_unset_fields() {
        let visit_id = Uuid::parse_str("7a0e7a5c-7f57-4c36-a3ff-5d0c58d9e7c1").unwrap();
        let pass = VisitPass::new(visit_id).with_name("Ada");

        assert_eq!(
            pass.payload().unwrap(),
            r#"{"visitId":"7a0e7a5c-7f57-4c36-a3ff-5d0c58d9e7c1","name":"Ada"}"#
        );
    }

    #[test]
    fn test_data_url_is_png() {
        let url = VisitPass::new(Uuid::new_v4()).to_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        let bytes = png_bytes(&url).unwrap();

        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
