// src/merge.rs
//! Reconciles the AI reply with the original resume.
//!
//! The reply is parsed as an untyped YAML value first, then converted into a
//! strict [`Reordering`]. Entries are matched back by declared key:
//! `(company, position)` for experiences and `label` for technology
//! categories. Every original entry must be matched exactly once and every
//! sub-list must be a permutation of the original one. Anything else is a
//! `FormatError`; nothing is merged partially.

use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::hash::Hash;

use crate::app_log;
use crate::error::CustomizeError;
use crate::schema::{self, SchemaViolation};
use crate::types::resume::{CV_KEY, EXPERIENCE_SECTION, TECHNOLOGIES_SECTION};
use crate::types::{ExperienceEntry, Resume, TechnologyEntry};

/// The mutable subset of a resume as proposed by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Reordering {
    pub experiences: Vec<ExperienceEntry>,
    pub technologies: Vec<TechnologyEntry>,
}

/// Strip surrounding whitespace and a Markdown code fence, if any.
pub fn clean_response(response: &str) -> &str {
    let mut cleaned = response.trim();

    for fence in ["```yaml", "```yml", "```"] {
        if let Some(rest) = cleaned.strip_prefix(fence) {
            cleaned = rest.trim();
            break;
        }
    }

    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest.trim();
    }

    cleaned
}

/// Parse a reply into a [`Reordering`].
///
/// Accepts the compact `experience`/`technologies` layout requested by the
/// prompt, or a full RenderCV document echoed back.
pub fn parse_reordering(response: &str) -> Result<Reordering, CustomizeError> {
    let cleaned = clean_response(response);
    if cleaned.is_empty() {
        return Err(CustomizeError::format("reply is empty", response));
    }

    let value: Value = serde_yaml::from_str(cleaned).map_err(|e| {
        CustomizeError::format(format!("reply is not valid YAML: {}", e), response)
    })?;

    let mapping = value
        .as_mapping()
        .ok_or_else(|| CustomizeError::format("reply is not a YAML mapping", response))?;

    let reject = |violation: SchemaViolation| {
        CustomizeError::format(format!("reply field {}", violation), response)
    };

    if mapping.get(CV_KEY).is_some() {
        app_log!(debug, "Reply echoes a full resume document");
        let sections = schema::inspect(&value).map_err(reject)?;
        return Ok(Reordering {
            experiences: sections.experiences,
            technologies: sections.technologies,
        });
    }

    for key in mapping.keys() {
        match key.as_str() {
            Some(EXPERIENCE_SECTION) | Some(TECHNOLOGIES_SECTION) => {}
            _ => {
                return Err(CustomizeError::format(
                    format!(
                        "reply has unexpected top-level key `{}`",
                        key.as_str().unwrap_or("<non-string>")
                    ),
                    response,
                ))
            }
        }
    }

    let experience = reply_section(mapping, EXPERIENCE_SECTION, response)?;
    let technologies = reply_section(mapping, TECHNOLOGIES_SECTION, response)?;

    Ok(Reordering {
        experiences: schema::extract_experiences(experience, EXPERIENCE_SECTION)
            .map_err(reject)?,
        technologies: schema::extract_technologies(technologies, TECHNOLOGIES_SECTION)
            .map_err(reject)?,
    })
}

static EMPTY_SECTION: Value = Value::Sequence(Vec::new());

/// A section key with nothing under it reads as an empty list.
fn reply_section<'a>(
    mapping: &'a Mapping,
    key: &str,
    response: &str,
) -> Result<&'a Value, CustomizeError> {
    match mapping.get(key) {
        Some(Value::Null) => Ok(&EMPTY_SECTION),
        Some(value) => Ok(value),
        None => Err(CustomizeError::format(
            format!("reply is missing `{key}`"),
            response,
        )),
    }
}

/// Merge the reply into a new resume; `resume` itself is never modified.
pub fn merge(resume: &Resume, response: &str) -> Result<Resume, CustomizeError> {
    let proposal = parse_reordering(response)?;

    let highlights = align(resume.experiences(), &proposal.experiences, "experience entries")
        .map_err(|message| CustomizeError::format(message, response))?;
    let details = align(resume.technologies(), &proposal.technologies, "technology categories")
        .map_err(|message| CustomizeError::format(message, response))?;

    let merged = resume.with_reordered(&highlights, &details)?;

    app_log!(
        info,
        "Merged reordering for {} experience entries and {} technology categories",
        highlights.len(),
        details.len()
    );
    Ok(merged)
}

trait Reorderable {
    type Key: Eq + Hash;

    fn key(&self) -> Self::Key;
    fn describe(&self) -> String;
    fn items(&self) -> &[String];
    fn item_name() -> &'static str;
}

impl Reorderable for ExperienceEntry {
    type Key = (String, String);

    fn key(&self) -> Self::Key {
        (self.company.clone(), self.position.clone())
    }

    fn describe(&self) -> String {
        format!("experience {}", ExperienceEntry::describe(self))
    }

    fn items(&self) -> &[String] {
        &self.highlights
    }

    fn item_name() -> &'static str {
        "highlight"
    }
}

impl Reorderable for TechnologyEntry {
    type Key = String;

    fn key(&self) -> Self::Key {
        self.label.clone()
    }

    fn describe(&self) -> String {
        format!("technology category {}", TechnologyEntry::describe(self))
    }

    fn items(&self) -> &[String] {
        &self.details
    }

    fn item_name() -> &'static str {
        "detail"
    }
}

/// For every original entry, in original order, the proposed ordering of its items.
fn align<T: Reorderable>(
    originals: &[T],
    proposed: &[T],
    what: &str,
) -> Result<Vec<Vec<String>>, String> {
    if proposed.len() != originals.len() {
        return Err(format!(
            "reply has {} {} but the resume has {}",
            proposed.len(),
            what,
            originals.len()
        ));
    }

    let index: HashMap<T::Key, usize> = originals
        .iter()
        .enumerate()
        .map(|(position, entry)| (entry.key(), position))
        .collect();

    let mut slots: Vec<Option<&T>> = vec![None; originals.len()];
    for entry in proposed {
        let position = *index
            .get(&entry.key())
            .ok_or_else(|| format!("reply names unknown {}", entry.describe()))?;
        if slots[position].is_some() {
            return Err(format!("reply lists {} more than once", entry.describe()));
        }
        slots[position] = Some(entry);
    }

    originals
        .iter()
        .zip(slots)
        .map(|(original, slot)| {
            let entry = slot.ok_or_else(|| format!("reply omits {}", original.describe()))?;
            permutation_of(original, entry.items())
        })
        .collect()
}

/// Map the proposed order back onto the original strings, rejecting any
/// added, dropped or rewritten item.
fn permutation_of<T: Reorderable>(original: &T, proposed: &[String]) -> Result<Vec<String>, String> {
    let mut available: HashMap<&str, Vec<&String>> = HashMap::new();
    for item in original.items().iter().rev() {
        available.entry(item.trim()).or_default().push(item);
    }

    let mut ordered = Vec::with_capacity(original.items().len());
    for item in proposed {
        let candidate = available
            .get_mut(item.trim())
            .and_then(|candidates| candidates.pop())
            .ok_or_else(|| {
                format!(
                    "reply adds or rewrites {} {:?} in {}",
                    T::item_name(),
                    item,
                    original.describe()
                )
            })?;
        ordered.push(candidate.clone());
    }

    if ordered.len() != original.items().len() {
        return Err(format!(
            "reply drops {} {}(s) from {}",
            original.items().len() - ordered.len(),
            T::item_name(),
            original.describe()
        ));
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = r#"cv:
  name: Jane Doe
  sections:
    experience:
      - company: Acme
        position: Engineer
        highlights:
          - Built the billing pipeline
          - Mentored two juniors
          - Cut build times by 40%
    technologies:
      - label: Languages
        details: Rust, Go, Python
"#;

    fn resume() -> Resume {
        Resume::from_yaml(RESUME).unwrap()
    }

    const REPLY: &str = r#"experience:
  - company: Acme
    position: Engineer
    highlights:
      - Cut build times by 40%
      - Built the billing pipeline
      - Mentored two juniors
technologies:
  - label: Languages
    details: [Go, Rust, Python]
"#;

    fn expect_format(response: &str) -> String {
        match merge(&resume(), response) {
            Err(CustomizeError::Format { message, raw }) => {
                assert_eq!(raw, response);
                message
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_response_strips_fences() {
        assert_eq!(clean_response("```yaml\na: 1\n```"), "a: 1");
        assert_eq!(clean_response("```yml\na: 1\n```\n"), "a: 1");
        assert_eq!(clean_response("  ```\na: 1\n```  "), "a: 1");
        assert_eq!(clean_response("a: 1"), "a: 1");
    }

    #[test]
    fn test_merge_reorders_sub_lists() {
        let merged = merge(&resume(), REPLY).unwrap();
        assert_eq!(
            merged.experiences()[0].highlights,
            vec![
                "Cut build times by 40%",
                "Built the billing pipeline",
                "Mentored two juniors"
            ]
        );
        assert_eq!(merged.technologies()[0].details, vec!["Go", "Rust", "Python"]);
        // Inline form is preserved on disk.
        assert_eq!(
            merged.document()["cv"]["sections"]["technologies"][0]["details"].as_str(),
            Some("Go, Rust, Python")
        );
    }

    #[test]
    fn test_merge_accepts_fenced_reply() {
        let fenced = format!("```yaml\n{}```", REPLY);
        assert!(merge(&resume(), &fenced).is_ok());
    }

    #[test]
    fn test_merge_accepts_echoed_document() {
        let echoed = RESUME
            .replace("Rust, Go, Python", "Python, Rust, Go")
            .replace(
                "          - Built the billing pipeline\n          - Mentored two juniors\n",
                "          - Mentored two juniors\n          - Built the billing pipeline\n",
            );
        let merged = merge(&resume(), &echoed).unwrap();
        assert_eq!(merged.technologies()[0].details, vec!["Python", "Rust", "Go"]);
        assert_eq!(merged.experiences()[0].highlights[0], "Mentored two juniors");
    }

    #[test]
    fn test_merge_tolerates_surrounding_whitespace_in_items() {
        let reply = REPLY.replace("- Mentored two juniors", "- \"  Mentored two juniors \"");
        let merged = merge(&resume(), &reply).unwrap();
        assert_eq!(merged.experiences()[0].highlights[2], "Mentored two juniors");
    }

    #[test]
    fn test_rejects_invalid_yaml() {
        let message = expect_format("experience: [unclosed");
        assert!(message.contains("not valid YAML"));
    }

    #[test]
    fn test_rejects_non_mapping_and_empty() {
        assert!(expect_format("just prose from the model").contains("mapping"));
        assert!(expect_format("```\n```").contains("empty"));
    }

    #[test]
    fn test_rejects_unknown_key() {
        let reply = format!("{}notes: looks great\n", REPLY);
        assert!(expect_format(&reply).contains("unexpected top-level key"));
    }

    #[test]
    fn test_bare_section_key_reads_as_empty_list() {
        let resume = Resume::from_yaml(
            "cv:\n  name: Jane\n  sections:\n    experience: []\n    technologies: []\n",
        )
        .unwrap();

        let merged = merge(&resume, "experience:\ntechnologies:\n").unwrap();
        assert_eq!(merged, resume);

        let message = expect_format("experience:\ntechnologies:\n");
        assert!(message.contains("but the resume has 1"), "{message}");
    }

    #[test]
    fn test_rejects_added_highlight() {
        let reply = REPLY.replace(
            "      - Mentored two juniors\n",
            "      - Mentored two juniors\n      - Invented Rust\n",
        );
        assert!(expect_format(&reply).contains("adds or rewrites highlight"));
    }

    #[test]
    fn test_rejects_dropped_and_rewritten_details() {
        let dropped = REPLY.replace("[Go, Rust, Python]", "[Go, Rust]");
        assert!(expect_format(&dropped).contains("drops 1 detail"));

        let rewritten = REPLY.replace("[Go, Rust, Python]", "[Go, Rust, Python 3]");
        assert!(expect_format(&rewritten).contains("adds or rewrites detail"));

        let duplicated = REPLY.replace("[Go, Rust, Python]", "[Go, Rust, Rust]");
        assert!(expect_format(&duplicated).contains("adds or rewrites detail"));
    }

    #[test]
    fn test_rejects_unknown_missing_and_duplicate_entries() {
        let renamed = REPLY.replace("company: Acme", "company: Acme Corp");
        assert!(expect_format(&renamed).contains("unknown experience"));

        let no_tech = "experience: []\ntechnologies: []\n";
        assert!(expect_format(no_tech).contains("reply has 0 experience entries"));

        let doubled = REPLY.replace(
            "technologies:\n",
            "  - company: Acme\n    position: Engineer\n    highlights: []\ntechnologies:\n",
        );
        assert!(expect_format(&doubled).contains("duplicates experience"));
    }

    #[test]
    fn test_original_resume_is_untouched() {
        let original = resume();
        let before = original.clone();
        let _ = merge(&original, REPLY).unwrap();
        assert_eq!(original, before);
        assert_eq!(original.experiences(), before.experiences());
    }
}
