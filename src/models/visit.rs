//! Farm visit model and its flat store-boundary representation.

use serde::{Deserialize, Serialize};

/// Kind of farm, which decides which conditional sections apply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FarmType {
    #[default]
    Crop,
    Livestock,
    Mixed,
}

impl FarmType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FarmType::Crop => "Crop",
            FarmType::Livestock => "Livestock",
            FarmType::Mixed => "Mixed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Crop" => Some(FarmType::Crop),
            "Livestock" => Some(FarmType::Livestock),
            "Mixed" => Some(FarmType::Mixed),
            _ => None,
        }
    }
}

/// Reason for the visit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum VisitType {
    #[default]
    Routine,
    Emergency,
    #[serde(rename = "Follow-up")]
    FollowUp,
}

impl VisitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitType::Routine => "Routine",
            VisitType::Emergency => "Emergency",
            VisitType::FollowUp => "Follow-up",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Routine" => Some(VisitType::Routine),
            "Emergency" => Some(VisitType::Emergency),
            "Follow-up" => Some(VisitType::FollowUp),
            _ => None,
        }
    }
}

/// Crop problems an officer can tick on the form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CropIssue {
    Pests,
    Diseases,
    #[serde(rename = "Nutrient Deficiency")]
    NutrientDeficiency,
    #[serde(rename = "Poor Germination")]
    PoorGermination,
    #[serde(rename = "Water Stress")]
    WaterStress,
}

impl CropIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropIssue::Pests => "Pests",
            CropIssue::Diseases => "Diseases",
            CropIssue::NutrientDeficiency => "Nutrient Deficiency",
            CropIssue::PoorGermination => "Poor Germination",
            CropIssue::WaterStress => "Water Stress",
        }
    }
}

/// Livestock problems an officer can tick on the form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LivestockIssue {
    Illness,
    Parasites,
    Malnutrition,
    #[serde(rename = "Poor Housing")]
    PoorHousing,
}

impl LivestockIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            LivestockIssue::Illness => "Illness",
            LivestockIssue::Parasites => "Parasites",
            LivestockIssue::Malnutrition => "Malnutrition",
            LivestockIssue::PoorHousing => "Poor Housing",
        }
    }
}

/// Crop observations. Only exists when `main_crops` is non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CropDetails {
    pub main_crops: String,
    pub crop_stage: Option<String>,
    pub crop_issues: Vec<CropIssue>,
}

/// Livestock observations. Only exists when `livestock_type` is non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct LivestockDetails {
    pub livestock_type: String,
    pub number_of_animals: u32,
    pub livestock_issues: Vec<LivestockIssue>,
}

/// Farm type together with the observations that type allows.
#[derive(Debug, Clone, PartialEq)]
pub enum FarmProfile {
    Crop(Option<CropDetails>),
    Livestock(Option<LivestockDetails>),
    Mixed {
        crop: Option<CropDetails>,
        livestock: Option<LivestockDetails>,
    },
}

impl FarmProfile {
    /// Build a profile, dropping whichever payload the farm type does not allow.
    pub fn new(
        farm_type: FarmType,
        crop: Option<CropDetails>,
        livestock: Option<LivestockDetails>,
    ) -> Self {
        match farm_type {
            FarmType::Crop => FarmProfile::Crop(crop),
            FarmType::Livestock => FarmProfile::Livestock(livestock),
            FarmType::Mixed => FarmProfile::Mixed { crop, livestock },
        }
    }

    pub fn farm_type(&self) -> FarmType {
        match self {
            FarmProfile::Crop(_) => FarmType::Crop,
            FarmProfile::Livestock(_) => FarmType::Livestock,
            FarmProfile::Mixed { .. } => FarmType::Mixed,
        }
    }

    pub fn crop(&self) -> Option<&CropDetails> {
        match self {
            FarmProfile::Crop(crop) | FarmProfile::Mixed { crop, .. } => crop.as_ref(),
            FarmProfile::Livestock(_) => None,
        }
    }

    pub fn livestock(&self) -> Option<&LivestockDetails> {
        match self {
            FarmProfile::Livestock(livestock) | FarmProfile::Mixed { livestock, .. } => {
                livestock.as_ref()
            }
            FarmProfile::Crop(_) => None,
        }
    }
}

/// One submitted farm-visit report.
#[derive(Debug, Clone, PartialEq)]
pub struct FarmVisit {
    /// Assigned by the store; `None` before persistence.
    pub id: Option<String>,
    pub farmer_name: String,
    pub farm_id: String,
    pub phone_number: String,
    pub village_location: String,
    pub gps_coordinates: Option<String>,
    pub farm_size_acres: f64,
    pub profile: FarmProfile,
    /// Raw calendar date as submitted; may be empty.
    pub visit_date: String,
    pub visit_type: VisitType,
    pub officer_name: String,
    pub time_spent_hours: f64,
    /// Ordered photo references. Legacy single-photo rows land here too.
    pub photos: Vec<String>,
    pub video_link: Option<String>,
    pub advice_given: String,
    pub follow_up_needed: bool,
    pub proposed_follow_up_date: Option<String>,
    pub routine_check: bool,
    pub routine_check_date: Option<String>,
    pub training_needed: bool,
    pub referral_to_specialist: Option<String>,
    pub additional_notes: Option<String>,
    pub created_at: Option<String>,
}

impl FarmVisit {
    pub fn farm_type(&self) -> FarmType {
        self.profile.farm_type()
    }
}

/// Flat record as exchanged with the form client and stored in SQLite.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FarmVisitRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub farmer_name: String,
    pub farm_id: String,
    pub phone_number: String,
    pub village_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_coordinates: Option<String>,
    pub farm_size_acres: f64,
    pub farm_type: FarmType,
    pub visit_date: String,
    pub visit_type: VisitType,
    pub officer_name: String,
    pub time_spent_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_crops: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub livestock_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_animals: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_issues: Option<Vec<CropIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub livestock_issues: Option<Vec<LivestockIssue>>,
    /// Legacy single photo reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_link: Option<String>,
    pub advice_given: String,
    pub follow_up_needed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_follow_up_date: Option<String>,
    pub routine_check: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routine_check_date: Option<String>,
    pub training_needed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_to_specialist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl From<FarmVisitRecord> for FarmVisit {
    fn from(record: FarmVisitRecord) -> Self {
        let crop = non_empty(record.main_crops).map(|main_crops| CropDetails {
            main_crops,
            crop_stage: non_empty(record.crop_stage),
            crop_issues: dedup(record.crop_issues.unwrap_or_default()),
        });
        let livestock = non_empty(record.livestock_type).map(|livestock_type| LivestockDetails {
            livestock_type,
            number_of_animals: record.number_of_animals.unwrap_or(0),
            livestock_issues: dedup(record.livestock_issues.unwrap_or_default()),
        });

        // photo_urls wins over the legacy single photo
        let urls: Vec<String> = record
            .photo_urls
            .unwrap_or_default()
            .into_iter()
            .filter(|u| !u.is_empty())
            .collect();
        let photos = if !urls.is_empty() {
            urls
        } else {
            non_empty(record.photo_url).into_iter().collect()
        };

        FarmVisit {
            id: record.id,
            farmer_name: record.farmer_name,
            farm_id: record.farm_id,
            phone_number: record.phone_number,
            village_location: record.village_location,
            gps_coordinates: non_empty(record.gps_coordinates),
            farm_size_acres: record.farm_size_acres,
            profile: FarmProfile::new(record.farm_type, crop, livestock),
            visit_date: record.visit_date,
            visit_type: record.visit_type,
            officer_name: record.officer_name,
            time_spent_hours: record.time_spent_hours,
            photos,
            video_link: non_empty(record.video_link),
            advice_given: record.advice_given,
            follow_up_needed: record.follow_up_needed,
            proposed_follow_up_date: non_empty(record.proposed_follow_up_date),
            routine_check: record.routine_check,
            routine_check_date: non_empty(record.routine_check_date),
            training_needed: record.training_needed,
            referral_to_specialist: non_empty(record.referral_to_specialist),
            additional_notes: non_empty(record.additional_notes),
            created_at: non_empty(record.created_at),
        }
    }
}

impl From<&FarmVisit> for FarmVisitRecord {
    fn from(visit: &FarmVisit) -> Self {
        let crop = visit.profile.crop();
        let livestock = visit.profile.livestock();

        FarmVisitRecord {
            id: visit.id.clone(),
            farmer_name: visit.farmer_name.clone(),
            farm_id: visit.farm_id.clone(),
            phone_number: visit.phone_number.clone(),
            village_location: visit.village_location.clone(),
            gps_coordinates: visit.gps_coordinates.clone(),
            farm_size_acres: visit.farm_size_acres,
            farm_type: visit.farm_type(),
            visit_date: visit.visit_date.clone(),
            visit_type: visit.visit_type,
            officer_name: visit.officer_name.clone(),
            time_spent_hours: visit.time_spent_hours,
            main_crops: crop.map(|c| c.main_crops.clone()),
            crop_stage: crop.and_then(|c| c.crop_stage.clone()),
            livestock_type: livestock.map(|l| l.livestock_type.clone()),
            number_of_animals: livestock.map(|l| l.number_of_animals),
            crop_issues: crop.map(|c| c.crop_issues.clone()),
            livestock_issues: livestock.map(|l| l.livestock_issues.clone()),
            photo_url: None,
            photo_urls: (!visit.photos.is_empty()).then(|| visit.photos.clone()),
            video_link: visit.video_link.clone(),
            advice_given: visit.advice_given.clone(),
            follow_up_needed: visit.follow_up_needed,
            proposed_follow_up_date: visit.proposed_follow_up_date.clone(),
            routine_check: visit.routine_check,
            routine_check_date: visit.routine_check_date.clone(),
            training_needed: visit.training_needed,
            referral_to_specialist: visit.referral_to_specialist.clone(),
            additional_notes: visit.additional_notes.clone(),
            created_at: visit.created_at.clone(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
