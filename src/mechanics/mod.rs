pub mod feedback;
pub mod stoch;

pub use feedback::*;
pub use stoch::*;
