pub mod outcome;
pub mod report;
pub mod target;
pub mod templates;

pub use outcome::*;
pub use report::*;
pub use target::*;
pub use templates::*;
