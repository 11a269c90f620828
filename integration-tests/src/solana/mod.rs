pub mod instructions;
pub mod utils;
