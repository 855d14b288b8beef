//! One step per role in the write/review/package loop

pub use architect::Architect;
pub use coder::Coder;
pub use packager::Packager;
pub use reviewer::Reviewer;

mod architect;
mod coder;
mod packager;
mod reviewer;
