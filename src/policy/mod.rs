mod errors;
mod linear;
mod traits;

pub use errors::PolicyError;
pub use linear::LinearPolicy;
pub use traits::Policy;
