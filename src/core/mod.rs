pub mod error;
pub mod types;
pub mod value;

pub use error::{EditError, Result};
pub use types::{DataType, PropertyValue};
pub use value::Value;
