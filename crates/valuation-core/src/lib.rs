pub mod calendar_date;
pub mod error;
pub mod stats;
pub mod traits;
pub mod types;
pub mod wire;

pub use error::*;
pub use traits::*;
pub use types::*;
pub use wire::*;
