//! HTML markup for rendered report sections.
//!
//! Shared by the expanded dashboard view and the printable export.

use std::fmt::Write;

use super::{Field, FieldValue, Report, Section};
use crate::models::VisitType;

/// Escape text for use in element content and double-quoted attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// CSS class for the visit-type badge: green, red, or amber.
pub fn badge_class(visit_type: VisitType) -> &'static str {
    match visit_type {
        VisitType::Routine => "badge-routine",
        VisitType::Emergency => "badge-emergency",
        VisitType::FollowUp => "badge-followup",
    }
}

/// Visit-type badge element.
pub fn badge(visit_type: VisitType) -> String {
    format!(
        r#"<span class="badge {}">{}</span>"#,
        badge_class(visit_type),
        escape(visit_type.as_str())
    )
}

/// Markup for every section of `report`, in order.
pub fn sections_html(report: &Report) -> String {
    let mut out = String::new();
    for section in &report.sections {
        write_section(&mut out, section);
    }
    out
}

fn write_section(out: &mut String, section: &Section) {
    let _ = write!(
        out,
        r#"<section class="section" data-section="{}"><h2 class="section-title">{}</h2>"#,
        section.kind.slug(),
        escape(section.title)
    );
    for field in &section.fields {
        write_field(out, field);
    }
    out.push_str("</section>\n");
}

fn write_field(out: &mut String, field: &Field) {
    let _ = write!(
        out,
        r#"<div class="field"><span class="field-label">{}:</span> "#,
        escape(field.label)
    );

    match &field.value {
        FieldValue::Text(value) => {
            let _ = write!(out, r#"<span class="field-value">{}</span>"#, escape(value));
        }
        FieldValue::Flag(value) => {
            let (class, label) = if *value {
                ("flag-yes", "Yes")
            } else {
                ("flag-no", "No")
            };
            let _ = write!(out, r#"<span class="field-value {}">{}</span>"#, class, label);
        }
        FieldValue::VisitType(visit_type) => out.push_str(&badge(*visit_type)),
        FieldValue::Paragraph(value) => {
            let lines: Vec<String> = value.split('\n').map(escape).collect();
            let _ = write!(out, r#"<div class="notes-box">{}</div>"#, lines.join("<br>"));
        }
        FieldValue::Link(url) => {
            let url = escape(url);
            let _ = write!(
                out,
                r#"<span class="field-value"><a href="{url}" target="_blank" rel="noopener noreferrer">{url}</a></span>"#
            );
        }
        FieldValue::Images(urls) => {
            out.push_str(r#"<div class="photos">"#);
            for (index, url) in urls.iter().enumerate() {
                let _ = write!(
                    out,
                    r#"<img src="{}" alt="Farm visit photo {}" class="photo" crossorigin="anonymous">"#,
                    escape(url),
                    index + 1
                );
            }
            out.push_str("</div>");
        }
    }

    out.push_str("</div>");
}
