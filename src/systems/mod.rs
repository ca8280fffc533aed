pub mod batch;
pub mod rule;
pub mod urn;

pub use batch::*;
pub use rule::*;
pub use urn::*;
