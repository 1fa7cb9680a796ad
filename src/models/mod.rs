pub mod clock_in;
pub mod item;
pub mod record_id;
pub mod timestamp;
pub mod validation;

pub use clock_in::*;
pub use item::*;
pub use record_id::*;
