use reqwest::multipart::{Form, Part};

use crate::error::TryOnError;
use crate::models::ImagePayload;
use crate::staging::ReadyInputs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(ImagePayload),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: &'static str,
    pub value: FormValue,
}

/// Body of `POST /api/try-on`, kept inspectable until it is handed to reqwest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryOnForm {
    parts: Vec<FormPart>,
}

fn text(name: &'static str, value: impl Into<String>) -> FormPart {
    FormPart { name, value: FormValue::Text(value.into()) }
}

fn or_empty<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl TryOnForm {
    /// Unset selectors go out as empty strings; the service expects every field.
    pub fn build(inputs: &ReadyInputs<'_>) -> Self {
        let parts = vec![
            FormPart { name: "person_image", value: FormValue::File(inputs.person_image.clone()) },
            FormPart { name: "cloth_image", value: FormValue::File(inputs.cloth_image.clone()) },
            text("instructions", inputs.instructions),
            text("model_type", or_empty(inputs.model_type)),
            text("gender", or_empty(inputs.gender)),
            text("garment_type", or_empty(inputs.garment_type)),
            text("style", or_empty(inputs.style)),
        ];
        Self { parts }
    }

    pub fn parts(&self) -> &[FormPart] { &self.parts }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find(|p| p.name == name).and_then(|p| match &p.value {
            FormValue::Text(t) => Some(t.as_str()),
            FormValue::File(_) => None,
        })
    }

    pub fn file(&self, name: &str) -> Option<&ImagePayload> {
        self.parts.iter().find(|p| p.name == name).and_then(|p| match &p.value {
            FormValue::File(f) => Some(f),
            FormValue::Text(_) => None,
        })
    }

    pub fn into_multipart(self) -> Result<Form, TryOnError> {
        let mut form = Form::new();
        for part in self.parts {
            form = match part.value {
                FormValue::Text(value) => form.text(part.name, value),
                FormValue::File(image) => {
                    let file = Part::bytes(image.bytes.to_vec())
                        .file_name(image.file_name)
                        .mime_str(&image.mime_type)
                        .map_err(|e| TryOnError::Transport(format!("bad mime type for {}: {}", part.name, e)))?;
                    form.part(part.name, file)
                }
            };
        }
        Ok(form)
    }
}
