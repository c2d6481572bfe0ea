// Text handling for resumes: PDF extraction, cleanup, skill keywords.

pub mod pdf;
pub mod preprocess;
pub mod skills;

pub use preprocess::preprocess;
pub use skills::extract_skills;
