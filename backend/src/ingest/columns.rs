//! Column map between the Preeti-typed sheet headers and canonical fields.

use crate::models::Field;

/// Sheet headers as typed in Preeti, in the order the payroll template lays
/// them out.
pub const COLUMN_MAP: [(&str, Field); 13] = [
    ("l;=g++", Field::Sn),
    ("gfdy/", Field::Name),
    ("kb", Field::Designation),
    ("sfo{/t ljefu", Field::Department),
    ("kfg g+=", Field::PanNumber),
    ("vftf g+=", Field::AccountNumber),
    (">fj)f", Field::Allowance),
    ("efb|", Field::Bhadi),
    ("hDdf", Field::Total),
    ("b/", Field::Rate),
    ("kfpg] /sd", Field::GrossAmount),
    ("kfl/>lds s/", Field::Tax),
    ("s'n kfpg]", Field::NetPayable),
];

/// Expected header row of an upload template.
pub fn expected_headers() -> impl Iterator<Item = &'static str> {
    COLUMN_MAP.iter().map(|(header, _)| *header)
}

/// Canonical field for a sheet header.
///
/// Surrounding whitespace is ignored; anything else must match exactly.
/// Unknown headers map to `None`.
pub fn lookup(header: &str) -> Option<Field> {
    let header = header.trim();
    COLUMN_MAP
        .iter()
        .find(|(known, _)| *known == header)
        .map(|(_, field)| *field)
}

/// Sheet header for a canonical field, if the template has a column for it.
pub fn header_for(field: Field) -> Option<&'static str> {
    COLUMN_MAP
        .iter()
        .find(|(_, f)| *f == field)
        .map(|(header, _)| *header)
}
