//! Report rendering for a single farm visit.
//!
//! [`render`] maps a visit to an ordered list of sections. Both the expanded dashboard view and
//! the printable export are drawn from this one structure (see [`html::sections_html`]), so the
//! two can never disagree on which sections appear or in what order.

pub mod html;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{FarmVisit, VisitType};

/// Placeholder for absent values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Turns a raw date string into display text.
pub trait DateFormatter {
    /// Format `raw`, returning [`NOT_AVAILABLE`] for missing or unparseable input.
    fn format(&self, raw: Option<&str>) -> String;
}

/// Long-form dates such as `January 5, 2025`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongDate;

impl LongDate {
    fn parse(raw: &str) -> Option<NaiveDate> {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.date_naive());
        }
        // SQLite datetime('now') output, then offset-less ISO timestamps
        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|ts| ts.date())
    }
}

impl DateFormatter for LongDate {
    fn format(&self, raw: Option<&str>) -> String {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(Self::parse)
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

/// Identifies a section independently of its display title.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    FarmerDetails,
    VisitInformation,
    CropInformation,
    LivestockInformation,
    Photos,
    Video,
    Recommendations,
    FollowUp,
}

impl SectionKind {
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::FarmerDetails => "Farmer Details",
            SectionKind::VisitInformation => "Visit Information",
            SectionKind::CropInformation => "Crop Information",
            SectionKind::LivestockInformation => "Livestock Information",
            SectionKind::Photos => "Photos",
            SectionKind::Video => "Video",
            SectionKind::Recommendations => "Recommendations",
            SectionKind::FollowUp => "Follow-up",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            SectionKind::FarmerDetails => "farmer-details",
            SectionKind::VisitInformation => "visit-information",
            SectionKind::CropInformation => "crop-information",
            SectionKind::LivestockInformation => "livestock-information",
            SectionKind::Photos => "photos",
            SectionKind::Video => "video",
            SectionKind::Recommendations => "recommendations",
            SectionKind::FollowUp => "follow-up",
        }
    }
}

/// A formatted field value.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    Text(String),
    /// Rendered as Yes / No.
    Flag(bool),
    /// Rendered as a colour-coded badge.
    VisitType(VisitType),
    /// Free text whose newlines are kept as line breaks.
    Paragraph(String),
    /// External link opened in a new window.
    Link(String),
    /// Ordered image references.
    Images(Vec<String>),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Field {
    pub label: &'static str,
    pub value: FieldValue,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub title: &'static str,
    pub fields: Vec<Field>,
}

impl Section {
    fn new(kind: SectionKind, fields: Vec<Field>) -> Self {
        Self {
            kind,
            title: kind.title(),
            fields,
        }
    }
}

/// Ordered sections for one visit.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Report {
    pub sections: Vec<Section>,
}

fn text(label: &'static str, value: impl Into<String>) -> Field {
    Field {
        label,
        value: FieldValue::Text(value.into()),
    }
}

fn flag(label: &'static str, value: bool) -> Field {
    Field {
        label,
        value: FieldValue::Flag(value),
    }
}

fn paragraph(label: &'static str, value: &str) -> Field {
    Field {
        label,
        value: FieldValue::Paragraph(value.to_string()),
    }
}

/// Render a visit into its ordered report sections.
pub fn render<D: DateFormatter>(visit: &FarmVisit, dates: &D) -> Report {
    let mut sections = Vec::with_capacity(8);

    sections.push(Section::new(
        SectionKind::FarmerDetails,
        vec![
            text("Farmer Name", &visit.farmer_name),
            text("Farm ID", &visit.farm_id),
            text("Location", &visit.village_location),
            text("Phone", &visit.phone_number),
            text(
                "GPS",
                visit.gps_coordinates.as_deref().unwrap_or(NOT_AVAILABLE),
            ),
            text("Farm Size", format!("{} acres", visit.farm_size_acres)),
            text("Farm Type", visit.farm_type().as_str()),
        ],
    ));

    sections.push(Section::new(
        SectionKind::VisitInformation,
        vec![
            text("Visit Date", dates.format(Some(visit.visit_date.as_str()))),
            Field {
                label: "Visit Type",
                value: FieldValue::VisitType(visit.visit_type),
            },
            text("Officer", &visit.officer_name),
            text("Time Spent", format!("{} hours", visit.time_spent_hours)),
            text("Created", dates.format(visit.created_at.as_deref())),
        ],
    ));

    if let Some(crop) = visit.profile.crop() {
        let mut fields = vec![
            text("Main Crops", &crop.main_crops),
            text(
                "Crop Stage",
                crop.crop_stage.as_deref().unwrap_or(NOT_AVAILABLE),
            ),
        ];
        if !crop.crop_issues.is_empty() {
            let issues: Vec<&str> = crop.crop_issues.iter().map(|i| i.as_str()).collect();
            fields.push(text("Crop Issues", issues.join(", ")));
        }
        sections.push(Section::new(SectionKind::CropInformation, fields));
    }

    if let Some(livestock) = visit.profile.livestock() {
        let mut fields = vec![
            text("Livestock Type", &livestock.livestock_type),
            text("Number of Animals", livestock.number_of_animals.to_string()),
        ];
        if !livestock.livestock_issues.is_empty() {
            let issues: Vec<&str> = livestock
                .livestock_issues
                .iter()
                .map(|i| i.as_str())
                .collect();
            fields.push(text("Livestock Issues", issues.join(", ")));
        }
        sections.push(Section::new(SectionKind::LivestockInformation, fields));
    }

    if !visit.photos.is_empty() {
        sections.push(Section::new(
            SectionKind::Photos,
            vec![Field {
                label: "Photos",
                value: FieldValue::Images(visit.photos.clone()),
            }],
        ));
    }

    if let Some(link) = visit.video_link.as_deref().filter(|l| !l.is_empty()) {
        sections.push(Section::new(
            SectionKind::Video,
            vec![Field {
                label: "Video Link",
                value: FieldValue::Link(link.to_string()),
            }],
        ));
    }

    sections.push(Section::new(
        SectionKind::Recommendations,
        vec![paragraph("Advice Given", &visit.advice_given)],
    ));

    let mut follow_up = vec![flag("Follow-up Needed", visit.follow_up_needed)];
    if visit.follow_up_needed {
        if let Some(date) = visit.proposed_follow_up_date.as_deref() {
            follow_up.push(text("Proposed Date", dates.format(Some(date))));
        }
    }
    follow_up.push(flag("Routine Check", visit.routine_check));
    if visit.routine_check {
        if let Some(date) = visit.routine_check_date.as_deref() {
            follow_up.push(text("Routine Check Date", dates.format(Some(date))));
        }
    }
    follow_up.push(flag("Training Needed", visit.training_needed));
    if let Some(referral) = visit
        .referral_to_specialist
        .as_deref()
        .filter(|r| !r.is_empty())
    {
        follow_up.push(text("Referral", referral));
    }
    if let Some(notes) = visit.additional_notes.as_deref().filter(|n| !n.is_empty()) {
        follow_up.push(paragraph("Additional Notes", notes));
    }
    sections.push(Section::new(SectionKind::FollowUp, follow_up));

    Report { sections }
}
