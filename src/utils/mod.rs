pub mod matrix;
pub mod translate;
