pub mod resume;

pub use resume::{DetailsForm, ExperienceEntry, Resume, TechnologyEntry};
