pub mod analyzer;
pub mod export;
pub mod trending;

pub use analyzer::*;
pub use export::*;
pub use trending::*;
