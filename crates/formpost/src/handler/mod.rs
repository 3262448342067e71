mod report;
mod submission;

pub use report::*;
pub use submission::*;
