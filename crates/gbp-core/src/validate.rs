//! Location completeness checks.
//!
//! Validation is local: it inspects a location record and never talks to the
//! API.

use serde::Serialize;

use crate::model::{Location, is_blank};

/// A field a complete location must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Name,
    Address,
    Category,
    Phone,
    Website,
    Hours,
}

impl RequiredField {
    /// The upstream field path backing this requirement.
    pub fn field_path(self) -> &'static str {
        match self {
            Self::Name => "locationName",
            Self::Address => "address",
            Self::Category => "primaryCategory",
            Self::Phone => "primaryPhone",
            Self::Website => "websiteUri",
            Self::Hours => "regularHours",
        }
    }
}

/// Address sub-fields checked for completeness when an address is present.
const ADDRESS_FIELDS: [&str; 4] = ["addressLines", "locality", "administrativeArea", "postalCode"];

/// Outcome of [`validate_location`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Required fields that are absent or blank.
    pub missing: Vec<RequiredField>,
    /// Address sub-fields (`address.locality`, ...) that are absent or blank.
    pub incomplete: Vec<String>,
}

impl ValidationReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.incomplete.is_empty()
    }

    /// Human readable issue list.
    pub fn issues(&self) -> Vec<String> {
        self.missing
            .iter()
            .map(|f| format!("Missing required field: {}", f.field_path()))
            .chain(
                self.incomplete
                    .iter()
                    .map(|f| format!("Incomplete field: {f}")),
            )
            .collect()
    }
}

/// Checks a location for the fields a complete profile needs.
///
/// Phone and website satisfy the contact requirement together: a location
/// with either one passes, a location with neither reports both.
pub fn validate_location(location: &Location) -> ValidationReport {
    let mut report = ValidationReport::default();

    if is_blank(location.location_name.as_deref()) {
        report.missing.push(RequiredField::Name);
    }

    match &location.address {
        Some(address) => {
            let present = [
                address.address_lines.iter().any(|l| !l.trim().is_empty()),
                !is_blank(address.locality.as_deref()),
                !is_blank(address.administrative_area.as_deref()),
                !is_blank(address.postal_code.as_deref()),
            ];
            if present.iter().all(|p| !p) {
                report.missing.push(RequiredField::Address);
            } else {
                for (field, ok) in ADDRESS_FIELDS.iter().zip(present) {
                    if !ok {
                        report.incomplete.push(format!("address.{field}"));
                    }
                }
            }
        }
        None => report.missing.push(RequiredField::Address),
    }

    if location.primary_category.as_ref().is_none_or(|c| c.is_empty()) {
        report.missing.push(RequiredField::Category);
    }

    let has_phone = !is_blank(location.primary_phone.as_deref());
    let has_website = !is_blank(location.website_uri.as_deref());
    if !has_phone && !has_website {
        report.missing.push(RequiredField::Phone);
        report.missing.push(RequiredField::Website);
    }

    if location.regular_hours.as_ref().is_none_or(|h| h.is_empty()) {
        report.missing.push(RequiredField::Hours);
    }

    report
}
