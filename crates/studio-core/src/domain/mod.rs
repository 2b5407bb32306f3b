pub mod errors;

pub use errors::{CoreResult, StudioError, StudioErrorCategory, StudioResult};
