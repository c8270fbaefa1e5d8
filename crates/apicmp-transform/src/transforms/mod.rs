//! Built-in transforms.

pub mod differences;

pub use differences::{DifferenceRecipe, DifferencesConfig, DifferencesTransform};
