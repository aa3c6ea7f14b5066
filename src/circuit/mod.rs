//! ZK circuit definitions.

mod verification_code;

pub use verification_code::{digest_to_digits, VerificationCodeCircuit};
