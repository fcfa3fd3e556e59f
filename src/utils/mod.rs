pub mod lenient;
pub mod prompt_ops;
