pub mod token;

pub use token::{int_to_base36, ResetTokenIssuer};
