pub mod json;
pub mod string;
pub mod time;
