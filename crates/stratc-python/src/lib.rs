//! Python frontend for strategy compilation: parsing, metadata extraction,
//! DSL validation, and lowering into the restricted statement tree.

pub mod frontend;
pub mod validator;

pub use frontend::{ParsedStrategy, PythonFrontend};
pub use validator::validate;
