pub mod codec;
pub mod errors;
