//! Dashboard filtering over an already-loaded record list.
//!
//! Pure and order-preserving: the output is always a subsequence of the input.

use crate::models::FarmVisit;

/// Sentinel selector value that disables the visit-type restriction.
pub const ALL_TYPES: &str = "all";

/// Visit-type selector from the dashboard drop-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeFilter {
    All,
    /// Exact match against the visit type's wire value, e.g. `Follow-up`.
    Exact(String),
}

impl TypeFilter {
    pub fn parse(selector: &str) -> Self {
        if selector == ALL_TYPES {
            TypeFilter::All
        } else {
            TypeFilter::Exact(selector.to_string())
        }
    }

    pub fn matches(&self, visit: &FarmVisit) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Exact(wanted) => visit.visit_type.as_str() == wanted,
        }
    }
}

/// True when the lowercased query is a substring of any searchable field.
pub fn matches_query(visit: &FarmVisit, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let term = query.to_lowercase();
    [
        &visit.farmer_name,
        &visit.farm_id,
        &visit.village_location,
        &visit.officer_name,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term))
}

/// Keep the records matching both the type selector and the free-text query.
pub fn filter<'a, I>(records: I, query: &str, type_filter: &TypeFilter) -> Vec<FarmVisit>
where
    I: IntoIterator<Item = &'a FarmVisit>,
{
    records
        .into_iter()
        .filter(|visit| type_filter.matches(visit) && matches_query(visit, query))
        .cloned()
        .collect()
}
