// src/types/resume.rs
//! RenderCV resume document plus the typed view the customizer reorders

use serde_yaml::{Mapping, Value};

use crate::error::CustomizeError;
use crate::schema::{self, ResumeSections};

pub const CV_KEY: &str = "cv";
pub const SECTIONS_KEY: &str = "sections";
pub const EXPERIENCE_SECTION: &str = "experience";
pub const TECHNOLOGIES_SECTION: &str = "technologies";
pub const HIGHLIGHTS_KEY: &str = "highlights";
pub const DETAILS_KEY: &str = "details";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceEntry {
    pub company: String,
    pub position: String,
    pub highlights: Vec<String>,
}

impl ExperienceEntry {
    pub fn describe(&self) -> String {
        format!("\"{}\" at \"{}\"", self.position, self.company)
    }
}

/// How a technology category stores its details on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsForm {
    /// RenderCV one-line entry: `details: "Rust, Go, Python"`
    Inline,
    /// `details: [Rust, Go, Python]`
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechnologyEntry {
    pub label: String,
    pub details: Vec<String>,
    pub form: DetailsForm,
}

impl TechnologyEntry {
    pub fn describe(&self) -> String {
        format!("\"{}\"", self.label)
    }

    fn details_value(&self, details: &[String]) -> Value {
        match self.form {
            DetailsForm::Inline => Value::String(details.join(", ")),
            DetailsForm::List => Value::Sequence(
                details.iter().map(|d| Value::String(d.clone())).collect(),
            ),
        }
    }
}

/// Split an inline details string on top-level commas.
///
/// Commas inside parentheses or brackets stay with their item, so
/// `"Python (NumPy, Pandas), Rust"` yields two details.
pub fn split_details(details: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in details.chars() {
        match c {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                items.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    items.push(current);

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// A validated resume.
///
/// The whole document is kept as an ordered YAML value so fields the
/// customizer does not own are written back untouched. Equality compares the
/// document structure only.
#[derive(Debug, Clone)]
pub struct Resume {
    source: String,
    document: Value,
    name: String,
    experience_key: String,
    technologies_key: String,
    experiences: Vec<ExperienceEntry>,
    technologies: Vec<TechnologyEntry>,
}

impl PartialEq for Resume {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl Resume {
    /// Parse and validate RenderCV YAML.
    pub fn from_yaml(text: &str) -> Result<Self, CustomizeError> {
        let document: Value = serde_yaml::from_str(text)
            .map_err(|e| CustomizeError::schema("<document>", format!("invalid YAML: {}", e)))?;
        let sections = schema::validate(&document)?;
        Ok(Self::from_parts(text.to_string(), document, sections))
    }

    fn from_parts(source: String, document: Value, sections: ResumeSections) -> Self {
        Self {
            source,
            document,
            name: sections.name,
            experience_key: sections.experience_key,
            technologies_key: sections.technologies_key,
            experiences: sections.experiences,
            technologies: sections.technologies,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn experiences(&self) -> &[ExperienceEntry] {
        &self.experiences
    }

    pub fn technologies(&self) -> &[TechnologyEntry] {
        &self.technologies
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The YAML text this resume was read from, or serialized to after a merge.
    pub fn as_yaml(&self) -> &str {
        &self.source
    }

    /// Build a new resume with each experience's highlights and each
    /// technology category's details replaced, index for index.
    ///
    /// Callers must pass one list per entry; the original is left untouched.
    pub fn with_reordered(
        &self,
        highlights: &[Vec<String>],
        details: &[Vec<String>],
    ) -> Result<Self, CustomizeError> {
        if highlights.len() != self.experiences.len() || details.len() != self.technologies.len()
        {
            return Err(CustomizeError::schema(
                CV_KEY,
                "reordering does not cover every entry",
            ));
        }

        let mut document = self.document.clone();
        let sections = sections_mut(&mut document)?;

        let experience_path = format!("{CV_KEY}.{SECTIONS_KEY}.{}", self.experience_key);
        let experience = entries_mut(sections, &self.experience_key, &experience_path)?;
        for (index, ordered) in highlights.iter().enumerate() {
            let entry = entry_mut(experience, index, &experience_path)?;
            entry.insert(
                Value::String(HIGHLIGHTS_KEY.to_string()),
                Value::Sequence(ordered.iter().map(|h| Value::String(h.clone())).collect()),
            );
        }

        let technologies_path = format!("{CV_KEY}.{SECTIONS_KEY}.{}", self.technologies_key);
        let technologies = entries_mut(sections, &self.technologies_key, &technologies_path)?;
        for (index, ordered) in details.iter().enumerate() {
            let entry = entry_mut(technologies, index, &technologies_path)?;
            entry.insert(
                Value::String(DETAILS_KEY.to_string()),
                self.technologies[index].details_value(ordered),
            );
        }

        let source = serde_yaml::to_string(&document).map_err(|e| {
            CustomizeError::schema(CV_KEY, format!("failed to serialize resume: {}", e))
        })?;

        let experiences = self
            .experiences
            .iter()
            .zip(highlights)
            .map(|(entry, ordered)| ExperienceEntry {
                highlights: ordered.clone(),
                ..entry.clone()
            })
            .collect();
        let technologies = self
            .technologies
            .iter()
            .zip(details)
            .map(|(entry, ordered)| TechnologyEntry {
                details: ordered.clone(),
                ..entry.clone()
            })
            .collect();

        Ok(Self {
            source,
            document,
            name: self.name.clone(),
            experience_key: self.experience_key.clone(),
            technologies_key: self.technologies_key.clone(),
            experiences,
            technologies,
        })
    }
}

fn sections_mut(document: &mut Value) -> Result<&mut Mapping, CustomizeError> {
    document
        .get_mut(CV_KEY)
        .and_then(|cv| cv.get_mut(SECTIONS_KEY))
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| CustomizeError::schema(format!("{CV_KEY}.{SECTIONS_KEY}"), "is missing"))
}

fn entries_mut<'a>(
    sections: &'a mut Mapping,
    key: &str,
    path: &str,
) -> Result<&'a mut Vec<Value>, CustomizeError> {
    sections
        .get_mut(key)
        .and_then(Value::as_sequence_mut)
        .ok_or_else(|| CustomizeError::schema(path, "must be a list"))
}

fn entry_mut<'a>(
    entries: &'a mut [Value],
    index: usize,
    path: &str,
) -> Result<&'a mut Mapping, CustomizeError> {
    entries
        .get_mut(index)
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| CustomizeError::schema(format!("{path}[{index}]"), "must be a mapping"))
}
