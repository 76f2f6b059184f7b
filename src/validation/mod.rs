pub mod assembler;
pub mod identity;

pub use assembler::ResultAssembler;
pub use identity::{IdentityChecker, NameMatch};
