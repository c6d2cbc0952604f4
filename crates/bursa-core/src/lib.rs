pub mod article;
pub mod error;
pub mod params;
pub mod traits;
pub mod types;

pub use article::*;
pub use error::*;
pub use params::*;
pub use traits::*;
pub use types::*;
