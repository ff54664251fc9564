//! Printable export of a single farm visit.
//!
//! The document is self-contained HTML: embedded styles, header banner with the visit-type badge,
//! the shared report sections, and a footer carrying the record identity. It asks the browser to
//! print itself once loaded.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};

use crate::errors::AppError;
use crate::models::FarmVisit;
use crate::report::{self, html, DateFormatter, LongDate, NOT_AVAILABLE};

/// Delay between the load event and the print request, so embedded photos can settle.
pub const PRINT_SETTLE_DELAY_MS: u64 = 500;

const STYLES: &str = r#"
body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; padding: 20px; }
.header { background: linear-gradient(135deg, #10b981 0%, #14b8a6 100%); color: white; padding: 30px; border-radius: 10px; margin-bottom: 30px; }
.header h1 { margin: 0 0 10px 0; font-size: 28px; }
.header p { margin: 0; opacity: 0.9; }
.section { margin-bottom: 30px; page-break-inside: avoid; }
.section-title { font-size: 20px; font-weight: bold; color: #10b981; border-bottom: 2px solid #10b981; padding-bottom: 10px; margin-bottom: 15px; }
.field { margin-bottom: 12px; padding: 8px; background: #f9fafb; border-radius: 5px; }
.field-label { font-weight: 600; color: #374151; display: inline-block; min-width: 180px; }
.field-value { color: #1f2937; }
.flag-yes { font-weight: 600; color: #ea580c; }
.flag-no { font-weight: 600; color: #059669; }
.badge { display: inline-block; padding: 4px 12px; border-radius: 12px; font-size: 12px; font-weight: 600; }
.badge-routine { background: #d1fae5; color: #065f46; }
.badge-emergency { background: #fee2e2; color: #991b1b; }
.badge-followup { background: #fef3c7; color: #92400e; }
.photo { max-width: 100%; height: auto; border-radius: 8px; margin-top: 10px; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); }
.notes-box { background: #f0fdf4; border-left: 4px solid #10b981; padding: 15px; margin-top: 10px; border-radius: 5px; }
.footer { margin-top: 40px; padding-top: 20px; border-top: 2px solid #e5e7eb; text-align: center; color: #6b7280; font-size: 12px; }
"#;

/// A standalone printable report.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintableDocument {
    pub title: String,
    pub html: String,
}

impl PrintableDocument {
    /// Suggested download name, e.g. `farm-visit-report-jane-kato.html`.
    pub fn filename(&self, visit: &FarmVisit) -> String {
        format!("{}.html", stem(visit))
    }

    /// Archive name, unique per record: `farm-visit-report-jane-kato-<id>.html`.
    pub fn archive_name(&self, visit: &FarmVisit) -> String {
        let identity = visit
            .id
            .as_deref()
            .map(slugify)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Utc::now().timestamp_millis().to_string());

        format!("{}-{}.html", stem(visit), identity)
    }
}

fn stem(visit: &FarmVisit) -> String {
    let slug = slugify(&visit.farmer_name);
    if slug.is_empty() {
        "farm-visit-report".to_string()
    } else {
        format!("farm-visit-report-{}", slug)
    }
}

/// Lowercase ASCII alphanumerics joined by single dashes.
fn slugify(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    mapped
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Display collaborator that shows a document and lets it print.
pub trait Presenter {
    /// Handle to whatever surface the document was shown on.
    type Surface;

    /// Show `document`, returning `None` when no display surface can be acquired.
    fn open(&self, visit: &FarmVisit, document: &PrintableDocument) -> Option<Self::Surface>;
}

/// Serves the document directly as the response body. Always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlinePresenter;

impl Presenter for InlinePresenter {
    type Surface = ();

    fn open(&self, _visit: &FarmVisit, _document: &PrintableDocument) -> Option<()> {
        Some(())
    }
}

/// Keeps a copy of every exported document in a directory, one file per record.
///
/// Writes block; call from a blocking context.
#[derive(Debug, Clone)]
pub struct ArchivePresenter {
    dir: PathBuf,
}

impl ArchivePresenter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Presenter for ArchivePresenter {
    type Surface = PathBuf;

    fn open(&self, visit: &FarmVisit, document: &PrintableDocument) -> Option<PathBuf> {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!("Export directory {:?} unavailable: {}", self.dir, e);
            return None;
        }

        let path = self.dir.join(document.archive_name(visit));
        match std::fs::write(&path, &document.html) {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!("Failed to write export {:?}: {}", path, e);
                None
            }
        }
    }
}

/// Build the printable document for `visit`, stamped with `generated_on`.
pub fn build_document(visit: &FarmVisit, generated_on: NaiveDate) -> PrintableDocument {
    let dates = LongDate;
    let report = report::render(visit, &dates);
    let title = format!("Farm Visit Report - {}", visit.farmer_name);
    let generated = generated_on.format("%B %-d, %Y").to_string();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>{title}</title>
<style>{styles}</style>
</head>
<body>
<div class="header">
<h1>Farm Visit Report</h1>
<p>Generated on {generated}</p>
<p>{badge}</p>
</div>
{sections}<div class="footer">
<p>Farm Visit Management System</p>
<p>Report ID: {id}</p>
<p>Created: {created}</p>
</div>
<script>
window.addEventListener('load', function () {{
  setTimeout(function () {{ window.print(); }}, {delay});
}});
</script>
</body>
</html>
"#,
        title = html::escape(&title),
        styles = STYLES,
        generated = html::escape(&generated),
        badge = html::badge(visit.visit_type),
        sections = html::sections_html(&report),
        id = html::escape(visit.id.as_deref().unwrap_or(NOT_AVAILABLE)),
        created = html::escape(&dates.format(visit.created_at.as_deref())),
        delay = PRINT_SETTLE_DELAY_MS,
    );

    PrintableDocument { title, html }
}

/// Build the document for `visit` and hand it to `presenter`.
pub fn export_document<P: Presenter>(
    visit: &FarmVisit,
    presenter: &P,
) -> Result<(PrintableDocument, P::Surface), AppError> {
    let document = build_document(visit, Utc::now().date_naive());

    match presenter.open(visit, &document) {
        Some(surface) => {
            tracing::debug!("Exported \"{}\"", document.title);
            Ok((document, surface))
        }
        None => Err(AppError::PresentationBlocked),
    }
}
