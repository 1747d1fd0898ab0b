//! Training-set loading and column normalization.

use std::collections::HashMap;

use crate::domain::model::{ColumnSynonyms, ExportRecord, TrainingRow, CANONICAL_COLUMNS};
use crate::utils::error::{Result, ServiceError};

/// Header name in canonical form: trimmed and lowercased.
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// For each canonical column, the index of the first matching header among the
/// canonical name and its synonyms.
fn resolve_columns(headers: &csv::StringRecord, synonyms: &ColumnSynonyms) -> Result<[usize; 4]> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (index, header) in headers.iter().enumerate() {
        // First occurrence wins on duplicate headers.
        positions.entry(normalize_header(header)).or_insert(index);
    }

    let mut resolved = [0usize; 4];
    for (slot, canonical) in resolved.iter_mut().zip(CANONICAL_COLUMNS) {
        *slot = synonyms
            .candidates(canonical)
            .find_map(|candidate| positions.get(&normalize_header(candidate)).copied())
            .ok_or_else(|| {
                ServiceError::retraining(format!(
                    "dataset has no '{}' column (headers: {})",
                    canonical,
                    headers.iter().collect::<Vec<_>>().join(", ")
                ))
            })?;
    }
    Ok(resolved)
}

/// Parses CSV bytes into training rows. Missing or short cells become empty strings.
pub fn parse_dataset(data: &[u8], synonyms: &ColumnSynonyms) -> Result<Vec<TrainingRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Fields)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let [education, skills, interests, label] = resolve_columns(&headers, synonyms)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |index: usize| record.get(index).unwrap_or_default().to_string();
        rows.push(TrainingRow {
            education: cell(education),
            skills: cell(skills),
            interests: cell(interests),
            career_label: cell(label),
        });
    }

    tracing::debug!("Parsed {} dataset rows", rows.len());
    Ok(rows)
}

/// Converts evaluation-export rows into training rows; rows without a usable role are dropped.
pub fn rows_from_export(records: &[ExportRecord]) -> Vec<TrainingRow> {
    records
        .iter()
        .filter(|r| {
            let role = r.role.trim();
            !role.is_empty() && !role.eq_ignore_ascii_case("unknown")
        })
        .map(|r| TrainingRow {
            education: r.education.trim().to_string(),
            skills: r
                .start_skills
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            interests: String::new(),
            career_label: r.role.trim().to_string(),
        })
        .collect()
}
