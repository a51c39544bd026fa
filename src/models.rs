use serde::{Serialize, Deserialize};
use chrono::{DateTime, Local, Utc};
use uuid::Uuid;
use bytes::Bytes;
use base64::Engine;
use std::{fmt, str::FromStr};

use crate::error::UnknownOption;

/// Declares a closed set of selector values that travel as lowercase names.
macro_rules! selector {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name { $($variant),+ }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self { $($name::$variant => $wire),+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(UnknownOption { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

selector!(
    /// Which part of the body the garment is fitted to.
    ModelType, "model type" { Top => "top", Bottom => "bottom", Full => "full" }
);
selector!(Gender, "gender" { Male => "male", Female => "female", Unisex => "unisex" });
selector!(GarmentType, "garment type" {
    Shirt => "shirt", Pants => "pants", Jacket => "jacket", Dress => "dress", Tshirt => "tshirt",
});
selector!(Style, "style" {
    Casual => "casual", Formal => "formal", Streetwear => "streetwear",
    Traditional => "traditional", Sports => "sports",
});

/// An uploaded image, kept opaque. Only the MIME type is ever derived from the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Bytes,
    pub file_name: String,
    pub mime_type: String,
}

impl ImagePayload {
    pub const FALLBACK_MIME: &'static str = "application/octet-stream";

    /// Builds a payload, sniffing whatever the uploader did not say about it.
    /// A declared type is only trusted when it is an `image/*` type.
    /// `stem` names the file when no file name is given (`person` -> `person.png`).
    pub fn new(bytes: impl Into<Bytes>, file_name: Option<String>, mime_type: Option<String>, stem: &str) -> Self {
        let bytes = bytes.into();
        let sniffed = image::guess_format(&bytes).ok();
        let mime_type = mime_type
            .map(|m| m.trim().to_string())
            .filter(|m| m.to_ascii_lowercase().starts_with("image/"))
            .or_else(|| sniffed.map(|f| f.to_mime_type().to_string()))
            .unwrap_or_else(|| Self::FALLBACK_MIME.to_string());
        let file_name = file_name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| {
            match sniffed.and_then(|f| f.extensions_str().first().copied()) {
                Some(ext) => format!("{stem}.{ext}"),
                None => stem.to_string(),
            }
        });
        Self { bytes, file_name, mime_type }
    }

    pub fn len(&self) -> usize { self.bytes.len() }

    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
}

/// Success body of `POST /api/try-on`. Every field may be missing or null.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TryOnResponse {
    #[serde(default, alias = "image")]
    pub openai_image: Option<String>,
    #[serde(default)]
    pub external_image: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TryOnResult {
    pub id: Uuid,
    pub openai_image: Option<String>,
    pub external_image: Option<String>,
    pub text: String,
    /// Local wall-clock time, for people.
    pub timestamp: String,
    pub created_at: DateTime<Utc>,
}

impl TryOnResult {
    pub fn from_response(response: TryOnResponse) -> Self {
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            openai_image: response.openai_image,
            external_image: response.external_image,
            text: response.text.unwrap_or_default(),
            timestamp: created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            created_at,
        }
    }

    pub fn has_image(&self) -> bool {
        self.openai_image.is_some() || self.external_image.is_some()
    }
}

/// Failure body of the remote API. `detail` wins over `message`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

impl ApiErrorBody {
    pub fn text(&self) -> Option<&str> {
        non_empty_str(&self.detail).or_else(|| non_empty_str(&self.message))
    }
}

fn non_empty_str(value: &Option<serde_json::Value>) -> Option<&str> {
    value.as_ref().and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginReply {
    #[serde(default)]
    pub detail: Option<String>,
}

/// Short description of a result image reference for logs.
/// Inline `data:` URLs are decoded just enough to name the format and size.
pub fn describe_image_ref(reference: &str) -> String {
    if let Some(rest) = reference.strip_prefix("data:") {
        if let Some((_, payload)) = rest.split_once(";base64,") {
            return match base64::engine::general_purpose::STANDARD.decode(payload) {
                Ok(raw) => {
                    let format = image::guess_format(&raw)
                        .map(|f| format!("{:?}", f).to_uppercase())
                        .unwrap_or_else(|_| "unknown".into());
                    format!("inline {} image, {} bytes", format, raw.len())
                }
                Err(_) => format!("inline image, {} undecodable chars", payload.len()),
            };
        }
    }
    if reference.len() > 80 {
        let cut = (0..=80).rev().find(|i| reference.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...[{} chars]", &reference[..cut], reference.len())
    } else {
        reference.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn selectors_parse_their_wire_names() {
        assert_eq!("tshirt".parse::<GarmentType>().unwrap(), GarmentType::Tshirt);
        assert_eq!(" Streetwear ".parse::<Style>().unwrap(), Style::Streetwear);
        assert_eq!(ModelType::Full.to_string(), "full");
        assert_eq!(Gender::ALL.len(), 3);
    }

    #[test]
    fn unknown_selector_names_the_kind() {
        let err = "kilt".parse::<GarmentType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown garment type 'kilt'");
    }

    #[test]
    fn payload_sniffs_png_when_uploader_is_silent() {
        let payload = ImagePayload::new(PNG_MAGIC.to_vec(), None, None, "person");
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.file_name, "person.png");
    }

    #[test]
    fn payload_keeps_what_the_uploader_said() {
        let payload = ImagePayload::new(
            b"not really an image".to_vec(),
            Some("me.jpg".into()),
            Some("image/jpeg".into()),
            "person",
        );
        assert_eq!(payload.mime_type, "image/jpeg");
        assert_eq!(payload.file_name, "me.jpg");

        let unknown = ImagePayload::new(b"???".to_vec(), None, Some("  ".into()), "cloth");
        assert_eq!(unknown.mime_type, ImagePayload::FALLBACK_MIME);
        assert_eq!(unknown.file_name, "cloth");
    }

    #[test]
    fn non_image_content_type_is_replaced_by_sniffed_format() {
        let form_encoded = ImagePayload::new(
            PNG_MAGIC.to_vec(),
            None,
            Some("application/x-www-form-urlencoded".into()),
            "person",
        );
        assert_eq!(form_encoded.mime_type, "image/png");
        assert_eq!(form_encoded.file_name, "person.png");

        let unknown_bytes = ImagePayload::new(b"???".to_vec(), None, Some("text/plain".into()), "cloth");
        assert_eq!(unknown_bytes.mime_type, ImagePayload::FALLBACK_MIME);
    }

    #[test]
    fn response_fields_are_all_optional() {
        let resp: TryOnResponse = serde_json::from_str(r#"{"openai_image":"x.png","external_image":null,"text":"done"}"#).unwrap();
        let result = TryOnResult::from_response(resp);
        assert_eq!(result.openai_image.as_deref(), Some("x.png"));
        assert_eq!(result.external_image, None);
        assert_eq!(result.text, "done");

        let empty = TryOnResult::from_response(serde_json::from_str("{}").unwrap());
        assert!(!empty.has_image());
        assert_eq!(empty.text, "");
    }

    #[test]
    fn single_image_field_is_read_as_primary_image() {
        let resp: TryOnResponse = serde_json::from_str(r#"{"image":"data:image/png;base64,AAAA","text":"ok"}"#).unwrap();
        assert_eq!(resp.openai_image.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn results_get_distinct_ids() {
        let a = TryOnResult::from_response(TryOnResponse::default());
        let b = TryOnResult::from_response(TryOnResponse::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn error_body_prefers_detail_then_message() {
        let both: ApiErrorBody = serde_json::from_str(r#"{"detail":"Invalid image format","message":"nope"}"#).unwrap();
        assert_eq!(both.text(), Some("Invalid image format"));
        let message: ApiErrorBody = serde_json::from_str(r#"{"message":"nope"}"#).unwrap();
        assert_eq!(message.text(), Some("nope"));
        let structured: ApiErrorBody = serde_json::from_str(r#"{"detail":[{"loc":["body"],"msg":"field required"}]}"#).unwrap();
        assert_eq!(structured.text(), None);
    }

    #[test]
    fn describes_inline_png() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(PNG_MAGIC);
        let described = describe_image_ref(&format!("data:image/png;base64,{encoded}"));
        assert_eq!(described, format!("inline PNG image, {} bytes", PNG_MAGIC.len()));
        assert_eq!(describe_image_ref("https://cdn.example/x.png"), "https://cdn.example/x.png");
    }
}
