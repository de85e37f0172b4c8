// src/schema.rs
//! Shape checks for RenderCV resumes before anything else touches them

use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::fmt;

use crate::error::CustomizeError;
use crate::types::resume::{
    split_details, DetailsForm, ExperienceEntry, TechnologyEntry, CV_KEY, DETAILS_KEY,
    EXPERIENCE_SECTION, HIGHLIGHTS_KEY, SECTIONS_KEY, TECHNOLOGIES_SECTION,
};

/// A field that is missing or has the wrong shape, named by its dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub field: String,
    pub message: String,
}

impl SchemaViolation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.field, self.message)
    }
}

impl From<SchemaViolation> for CustomizeError {
    fn from(violation: SchemaViolation) -> Self {
        CustomizeError::Schema {
            field: violation.field,
            message: violation.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResumeSections {
    pub name: String,
    pub experience_key: String,
    pub technologies_key: String,
    pub experiences: Vec<ExperienceEntry>,
    pub technologies: Vec<TechnologyEntry>,
}

/// Validate a parsed resume document.
pub fn validate(document: &Value) -> Result<ResumeSections, CustomizeError> {
    Ok(inspect(document)?)
}

pub(crate) fn inspect(document: &Value) -> Result<ResumeSections, SchemaViolation> {
    let root = document
        .as_mapping()
        .ok_or_else(|| SchemaViolation::new("<document>", "must be a mapping"))?;

    let cv = root
        .get(CV_KEY)
        .ok_or_else(|| SchemaViolation::new(CV_KEY, "is missing"))?
        .as_mapping()
        .ok_or_else(|| SchemaViolation::new(CV_KEY, "must be a mapping"))?;

    let name_path = format!("{CV_KEY}.name");
    let name = required_str(cv, "name", &name_path)?;
    if name.trim().is_empty() {
        return Err(SchemaViolation::new(name_path, "must not be empty"));
    }

    let sections_path = format!("{CV_KEY}.{SECTIONS_KEY}");
    let sections = cv
        .get(SECTIONS_KEY)
        .ok_or_else(|| SchemaViolation::new(&sections_path, "is missing"))?
        .as_mapping()
        .ok_or_else(|| SchemaViolation::new(&sections_path, "must be a mapping"))?;

    let (experience_key, experience) =
        find_section(sections, EXPERIENCE_SECTION, &sections_path)?;
    let experiences =
        extract_experiences(experience, &format!("{sections_path}.{experience_key}"))?;

    let (technologies_key, technologies) =
        find_section(sections, TECHNOLOGIES_SECTION, &sections_path)?;
    let technologies =
        extract_technologies(technologies, &format!("{sections_path}.{technologies_key}"))?;

    Ok(ResumeSections {
        name: name.to_string(),
        experience_key,
        technologies_key,
        experiences,
        technologies,
    })
}

/// Look a section up case-insensitively; a case-insensitive collision is ambiguous.
fn find_section<'a>(
    sections: &'a Mapping,
    section_name: &str,
    path: &str,
) -> Result<(String, &'a Value), SchemaViolation> {
    let mut found: Option<(String, &'a Value)> = None;

    for (key, value) in sections {
        let Some(key) = key.as_str() else { continue };
        if key.to_lowercase() != section_name {
            continue;
        }
        if let Some((previous, _)) = &found {
            return Err(SchemaViolation::new(
                format!("{path}.{section_name}"),
                format!("is defined twice (`{previous}` and `{key}`)"),
            ));
        }
        found = Some((key.to_string(), value));
    }

    found.ok_or_else(|| SchemaViolation::new(format!("{path}.{section_name}"), "is missing"))
}

pub(crate) fn extract_experiences(
    value: &Value,
    path: &str,
) -> Result<Vec<ExperienceEntry>, SchemaViolation> {
    let entries = value
        .as_sequence()
        .ok_or_else(|| SchemaViolation::new(path, "must be a list"))?;

    let mut seen = HashSet::new();
    let mut experiences = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let entry_path = format!("{path}[{index}]");
        let mapping = entry
            .as_mapping()
            .ok_or_else(|| SchemaViolation::new(&entry_path, "must be a mapping"))?;

        let company = required_str(mapping, "company", &format!("{entry_path}.company"))?;
        let position = required_str(mapping, "position", &format!("{entry_path}.position"))?;

        let highlights_path = format!("{entry_path}.{HIGHLIGHTS_KEY}");
        let highlights = mapping
            .get(HIGHLIGHTS_KEY)
            .ok_or_else(|| SchemaViolation::new(&highlights_path, "is missing"))?;
        let highlights = string_list(highlights, &highlights_path)?;

        let experience = ExperienceEntry {
            company: company.trim().to_string(),
            position: position.trim().to_string(),
            highlights,
        };
        if !seen.insert((experience.company.clone(), experience.position.clone())) {
            return Err(SchemaViolation::new(
                entry_path,
                format!("duplicates experience {}", experience.describe()),
            ));
        }
        experiences.push(experience);
    }

    Ok(experiences)
}

pub(crate) fn extract_technologies(
    value: &Value,
    path: &str,
) -> Result<Vec<TechnologyEntry>, SchemaViolation> {
    let entries = value
        .as_sequence()
        .ok_or_else(|| SchemaViolation::new(path, "must be a list"))?;

    let mut seen = HashSet::new();
    let mut technologies = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let entry_path = format!("{path}[{index}]");
        let mapping = entry
            .as_mapping()
            .ok_or_else(|| SchemaViolation::new(&entry_path, "must be a mapping"))?;

        let label = required_str(mapping, "label", &format!("{entry_path}.label"))?;

        let details_path = format!("{entry_path}.{DETAILS_KEY}");
        let (details, form) = match mapping.get(DETAILS_KEY) {
            None => return Err(SchemaViolation::new(details_path, "is missing")),
            Some(Value::String(inline)) => (split_details(inline), DetailsForm::Inline),
            Some(list @ Value::Sequence(_)) => {
                (string_list(list, &details_path)?, DetailsForm::List)
            }
            Some(_) => {
                return Err(SchemaViolation::new(
                    details_path,
                    "must be a list or a comma-separated string",
                ))
            }
        };

        let technology = TechnologyEntry {
            label: label.trim().to_string(),
            details,
            form,
        };
        if !seen.insert(technology.label.clone()) {
            return Err(SchemaViolation::new(
                entry_path,
                format!("duplicates technology category {}", technology.describe()),
            ));
        }
        technologies.push(technology);
    }

    Ok(technologies)
}

fn required_str<'a>(
    mapping: &'a Mapping,
    key: &str,
    path: &str,
) -> Result<&'a str, SchemaViolation> {
    mapping
        .get(key)
        .ok_or_else(|| SchemaViolation::new(path, "is missing"))?
        .as_str()
        .ok_or_else(|| SchemaViolation::new(path, "must be a string"))
}

fn string_list(value: &Value, path: &str) -> Result<Vec<String>, SchemaViolation> {
    let items = value
        .as_sequence()
        .ok_or_else(|| SchemaViolation::new(path, "must be a list"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| SchemaViolation::new(format!("{path}[{index}]"), "must be a string"))
        })
        .collect()
}
