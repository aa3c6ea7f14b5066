//! Verification code derivation.
//!
//! The deterministic generator packs the email and the user's salt into field
//! elements, XORs them element by element, runs the result through MiMC and
//! keeps the low 24 bits of the digest as six lowercase hex characters. The same
//! (email, salt) pair always yields the same code, so anyone handed the email out
//! of band can recompute it.

use rand::Rng;

use crate::encoding::{field_element_bytes, string_to_field_elements, CODE_LENGTH, ELEMENT_BYTES, FIELD_ELEMENTS};
use crate::error::CryptoError;
use crate::mimc::MimcHasher;
use crate::models::User;

/// Produces the code mailed to a user.
pub trait CodeGenerator: Send + Sync {
    fn generate_code(&self, user: &User, email: &str) -> Result<String, CryptoError>;
}

/// Deterministic MiMC-based generator. Its codes can be proven in zero knowledge.
#[derive(Debug, Clone, Copy, Default)]
pub struct MimcCodeGenerator;

impl MimcCodeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl CodeGenerator for MimcCodeGenerator {
    fn generate_code(&self, user: &User, email: &str) -> Result<String, CryptoError> {
        generate_code(email, &user.salt)
    }
}

/// Derive the verification code for an email and salt.
pub fn generate_code(email: &str, salt: &str) -> Result<String, CryptoError> {
    let email_elements = string_to_field_elements(email)?;
    let salt_elements = string_to_field_elements(salt)?;

    let mut mixed = Vec::with_capacity(FIELD_ELEMENTS * ELEMENT_BYTES);
    for (e, s) in email_elements.iter().zip(salt_elements.iter()) {
        let e = field_element_bytes(e);
        let s = field_element_bytes(s);
        mixed.extend(e.iter().zip(s.iter()).map(|(a, b)| a ^ b));
    }

    let mut hasher = MimcHasher::new();
    hasher.update(&mixed)?;
    let digest = hasher.finalize();

    Ok(hex::encode(&digest[digest.len() - CODE_LENGTH / 2..]))
}

/// Random hex codes. Not bound to the email, so these cannot back a proof.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate_code(&self, _user: &User, _email: &str) -> Result<String, CryptoError> {
        let bytes: [u8; CODE_LENGTH / 2] = rand::thread_rng().gen();
        Ok(hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::code_to_digits;
    use proptest::prelude::*;
    use std::collections::HashSet;

    const SALT: &str = "ajdjsjsaafktyowqqrtgpowrkdkdkfak";

    fn user() -> User {
        User {
            id: 1,
            username: "user".to_string(),
            salt: SALT.to_string(),
        }
    }

    #[test]
    fn test_reference_fixture() {
        assert_eq!(generate_code("myemail@gmail.com", SALT).unwrap(), "724b2c");
    }

    #[test]
    fn test_generator_uses_user_salt() {
        let code = MimcCodeGenerator::new()
            .generate_code(&user(), "myemail@gmail.com")
            .unwrap();
        assert_eq!(code, "724b2c");
    }

    #[test]
    fn test_salt_changes_code() {
        assert_eq!(generate_code("myemail@gmail.com", "anothersalt").unwrap(), "b29a93");
    }

    #[test]
    fn test_non_ascii_emails() {
        assert_eq!(generate_code("用户@例子.广告", SALT).unwrap(), "0c7409");
        assert_eq!(generate_code("Dörte@Sörensen.example.com", SALT).unwrap(), "79f01c");
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(generate_code("", "").unwrap(), "eb8b74");
    }

    #[test]
    fn test_oversized_email_is_rejected() {
        let email = format!("{}@example.com", "a".repeat(300));
        assert!(matches!(generate_code(&email, SALT), Err(CryptoError::Encoding(_))));
    }

    #[test]
    fn test_no_collisions_in_sample() {
        let codes: HashSet<String> = (0..500)
            .map(|i| generate_code(&format!("user{}@example.com", i), SALT).unwrap())
            .collect();
        assert_eq!(codes.len(), 500);
    }

    #[test]
    fn test_random_codes_are_hex() {
        let generator = RandomCodeGenerator;
        for _ in 0..32 {
            let code = generator.generate_code(&user(), "ignored@example.com").unwrap();
            assert!(code_to_digits(&code).is_ok());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_code_is_deterministic(email in "\\PC{0,80}", salt in "[a-z0-9]{0,32}") {
            let first = generate_code(&email, &salt).unwrap();
            let second = generate_code(&email, &salt).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert!(code_to_digits(&first).is_ok());
        }
    }
}
