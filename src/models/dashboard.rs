//! Dashboard list payloads.

use serde::Serialize;

use super::FarmVisitRecord;

/// Filtered record list shown on the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Number of entries after filtering.
    pub total: usize,
    /// Active visit-type selector, absent when showing all types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_by: Option<String>,
    pub visits: Vec<FarmVisitRecord>,
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
