pub mod jwt;
pub mod template;

pub use template::validate_template;
