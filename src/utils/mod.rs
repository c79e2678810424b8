pub mod json;

pub use json::{merge_objects, type_name};
