mod candidate;
mod document;
mod outcome;

pub use candidate::*;
pub use document::*;
pub use outcome::*;
