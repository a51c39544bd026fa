use serde::Serialize;

use crate::error::{TryOnError, MISSING_IMAGES};
use crate::models::{GarmentType, Gender, ImagePayload, ModelType, Style};

/// Everything the user has picked so far. Setters never validate; half-filled
/// states are normal while the form is being edited.
#[derive(Debug, Clone, Default)]
pub struct StagedInputs {
    person_image: Option<ImagePayload>,
    cloth_image: Option<ImagePayload>,
    instructions: String,
    model_type: Option<ModelType>,
    gender: Option<Gender>,
    garment_type: Option<GarmentType>,
    style: Option<Style>,
}

/// Staged inputs that passed the submit precondition.
#[derive(Debug, Clone, Copy)]
pub struct ReadyInputs<'a> {
    pub person_image: &'a ImagePayload,
    pub cloth_image: &'a ImagePayload,
    pub instructions: &'a str,
    pub model_type: Option<ModelType>,
    pub gender: Option<Gender>,
    pub garment_type: Option<GarmentType>,
    pub style: Option<Style>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StagedImageSummary {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StagedSummary {
    pub person_image: Option<StagedImageSummary>,
    pub cloth_image: Option<StagedImageSummary>,
    pub instructions: String,
    pub model_type: Option<ModelType>,
    pub gender: Option<Gender>,
    pub garment_type: Option<GarmentType>,
    pub style: Option<Style>,
    pub ready: bool,
}

impl StagedInputs {
    pub fn set_person_image(&mut self, image: Option<ImagePayload>) { self.person_image = image; }

    pub fn set_cloth_image(&mut self, image: Option<ImagePayload>) { self.cloth_image = image; }

    pub fn set_instructions(&mut self, instructions: impl Into<String>) { self.instructions = instructions.into(); }

    pub fn set_model_type(&mut self, model_type: Option<ModelType>) { self.model_type = model_type; }

    pub fn set_gender(&mut self, gender: Option<Gender>) { self.gender = gender; }

    pub fn set_garment_type(&mut self, garment_type: Option<GarmentType>) { self.garment_type = garment_type; }

    pub fn set_style(&mut self, style: Option<Style>) { self.style = style; }

    /// Both images present, or the validation error shown to the user.
    pub fn ready(&self) -> Result<ReadyInputs<'_>, TryOnError> {
        match (&self.person_image, &self.cloth_image) {
            (Some(person_image), Some(cloth_image)) => Ok(ReadyInputs {
                person_image,
                cloth_image,
                instructions: &self.instructions,
                model_type: self.model_type,
                gender: self.gender,
                garment_type: self.garment_type,
                style: self.style,
            }),
            _ => Err(TryOnError::Validation(MISSING_IMAGES.to_string())),
        }
    }

    pub fn summary(&self) -> StagedSummary {
        let describe = |image: &Option<ImagePayload>| image.as_ref().map(|i| StagedImageSummary {
            file_name: i.file_name.clone(),
            mime_type: i.mime_type.clone(),
            size_bytes: i.len(),
        });
        StagedSummary {
            person_image: describe(&self.person_image),
            cloth_image: describe(&self.cloth_image),
            instructions: self.instructions.clone(),
            model_type: self.model_type,
            gender: self.gender,
            garment_type: self.garment_type,
            style: self.style,
            ready: self.ready().is_ok(),
        }
    }
}
