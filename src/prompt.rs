// src/prompt.rs
//! Builds the single instruction payload sent to the AI model

use crate::types::Resume;

const PREAMBLE: &str = "You are an expert resume writer and ATS optimization specialist. \
You will receive a job posting and a resume in RenderCV YAML format. Your task is to \
reorder the highlights of every Experience entry and the details of every Technologies \
category so the content most relevant to the job posting comes first.";

const INSTRUCTIONS: &str = r#"INSTRUCTIONS:
1. EXPERIENCE HIGHLIGHTS:
   - Reorder the highlights within each experience entry, most relevant first.
   - Keep every highlight exactly as written. Do not add, remove, merge or rephrase any.
2. TECHNOLOGIES DETAILS:
   - Reorder the details within each technology category, most relevant first.
   - Keep every detail exactly as written. Do not add, remove or rename any.
   - Keep every category and its label unchanged.
3. RESTRICTIONS:
   - Do not change company names, positions or labels; they identify the entries.
   - Every experience entry and every technology category listed below must appear
     exactly once in your reply.
"#;

const CLOSING: &str = "CRITICAL: Return ONLY the raw YAML content in the format above. \
Do not wrap it in code blocks, markdown, or any other formatting, and do not add commentary.";

/// Build the prompt for one customization run.
///
/// The job posting and every highlight and detail appear verbatim.
pub fn build_prompt(resume: &Resume, job_posting: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\nJOB POSTING:\n");
    prompt.push_str(job_posting);
    prompt.push_str("\n\nCURRENT RESUME (YAML format):\n");
    prompt.push_str(resume.as_yaml());
    prompt.push_str("\n\nCONTENT TO REORDER:\n");
    prompt.push_str(&content_listing(resume));
    prompt.push('\n');
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\nOUTPUT FORMAT:\n");
    prompt.push_str(&output_skeleton(resume));
    prompt.push('\n');
    prompt.push_str(CLOSING);
    prompt.push('\n');

    prompt
}

fn content_listing(resume: &Resume) -> String {
    let mut listing = String::new();

    for experience in resume.experiences() {
        listing.push_str(&format!(
            "Experience {} ({} highlights):\n",
            experience.describe(),
            experience.highlights.len()
        ));
        for highlight in &experience.highlights {
            listing.push_str(&format!("  - {}\n", highlight));
        }
    }

    for technology in resume.technologies() {
        listing.push_str(&format!(
            "Technology category {} ({} details):\n",
            technology.describe(),
            technology.details.len()
        ));
        for detail in &technology.details {
            listing.push_str(&format!("  - {}\n", detail));
        }
    }

    listing
}

fn output_skeleton(resume: &Resume) -> String {
    let mut skeleton = String::new();

    if resume.experiences().is_empty() {
        skeleton.push_str("experience: []\n");
    } else {
        skeleton.push_str("experience:\n");
    }

    for experience in resume.experiences() {
        skeleton.push_str(&format!("  - company: {}\n", yaml_quote(&experience.company)));
        skeleton.push_str(&format!("    position: {}\n", yaml_quote(&experience.position)));
        skeleton.push_str("    highlights:\n");
        skeleton.push_str("      - <every highlight of this entry, most relevant first>\n");
    }

    if resume.technologies().is_empty() {
        skeleton.push_str("technologies: []\n");
    } else {
        skeleton.push_str("technologies:\n");
    }
    for technology in resume.technologies() {
        skeleton.push_str(&format!("  - label: {}\n", yaml_quote(&technology.label)));
        skeleton.push_str("    details:\n");
        skeleton.push_str("      - <every detail of this category, most relevant first>\n");
    }

    skeleton
}

/// Double-quoted YAML scalar.
fn yaml_quote(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{}\"", escaped)
}
