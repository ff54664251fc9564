//! Crop growth-stage reference data.

use serde::{Deserialize, Serialize};

/// Ordered growth stages registered for one crop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropStage {
    pub id: String,
    pub crop_name: String,
    pub stages: Vec<String>,
    pub created_at: String,
}

/// Stages valid for `main_crops`, matched case-insensitively on the crop name.
pub fn available_stages<'a>(crop_stages: &'a [CropStage], main_crops: &str) -> &'a [String] {
    let wanted = main_crops.trim().to_lowercase();
    if wanted.is_empty() {
        return &[];
    }

    crop_stages
        .iter()
        .find(|c| c.crop_name.to_lowercase() == wanted)
        .map(|c| c.stages.as_slice())
        .unwrap_or(&[])
}
