//! Column names for the SBC LTER annual kelp forest biomass table and the
//! canonical naming applied before projection.

use std::collections::HashMap;

/// Positional column labels of the source CSV, in file order.
pub const SOURCE_COLUMNS: [&str; 24] = [
    "YEAR",
    "MONTH",
    "DATE",
    "SITE",
    "TRANSECT",
    "VIS",
    "SP_CODE",
    "PERCENT_COVER",
    "DENSITY",
    "WM_GM2",
    "DRY_GM2",
    "SFDM",
    "AFDM",
    "SCIENTIFIC_NAME",
    "COMMON_NAME",
    "TAXON_KINGDOM",
    "TAXON_PHYLUM",
    "TAXON_CLASS",
    "TAXON_ORDER",
    "TAXON_FAMILY",
    "TAXON_GENUS",
    "GROUP",
    "MOBILITY",
    "GROWTH_MORPH",
];

pub const COL_YEAR: &str = "year";
pub const COL_DATE: &str = "date";
pub const COL_SITE: &str = "site";
pub const COL_DRY_GM2: &str = "dry_gm2"; // dry mass per area, g/m2
pub const COL_COMMON_NAME: &str = "common_name";

/// The normalized projection, in output order.
pub const PROJECTED_COLUMNS: [&str; 5] =
    [COL_YEAR, COL_DATE, COL_SITE, COL_DRY_GM2, COL_COMMON_NAME];

pub fn default_source_columns() -> Vec<String> {
    SOURCE_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Converts a label to lowercase snake case.
///
/// Runs of anything that is not alphanumeric collapse to a single `_`, and a
/// lowercase-to-uppercase transition (`dryMass`) starts a new word. Already
/// canonical names come back unchanged.
///
/// ```
/// use urchin_biomass::canonical_column_name;
///
/// assert_eq!(canonical_column_name("SCIENTIFIC_NAME"), "scientific_name");
/// assert_eq!(canonical_column_name("Percent Cover (%)"), "percent_cover");
/// assert_eq!(canonical_column_name("dryMassGM2"), "dry_mass_gm2");
/// ```
pub fn canonical_column_name(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut prev_lower = false;
    let mut pending_sep = false;

    for ch in label.chars() {
        if ch.is_alphanumeric() {
            if (pending_sep || (prev_lower && ch.is_uppercase())) && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            prev_lower = ch.is_lowercase() || ch.is_numeric();
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
            prev_lower = false;
        }
    }
    out
}

/// Canonicalizes every label. Collisions get a numeric suffix (`name_2`).
pub fn canonical_column_names<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    labels
        .into_iter()
        .map(|label| {
            let base = canonical_column_name(label);
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{}_{}", base, count)
            }
        })
        .collect()
}
