//! Panel credential generation
//!
//! Usernames are derived from the requested panel name with a random numeric
//! suffix; collisions are possible and the control plane is the final
//! arbiter. Passwords are provisioning defaults the customer is told to
//! change, but they travel in plaintext so they come from the OS RNG.

use rand::rngs::OsRng;
use rand::Rng;

/// Alphabet for generated passwords: lower/upper alphanumerics plus symbols
pub const PASSWORD_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

/// Default generated password length
pub const DEFAULT_PASSWORD_LENGTH: usize = 12;

/// Generate a random password of `length` characters from the fixed alphabet
pub fn generate_password(length: usize) -> String {
    let alphabet: Vec<char> = PASSWORD_ALPHABET.chars().collect();
    let mut rng = OsRng;

    (0..length)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
        .collect()
}

/// Derive a panel username from the requested panel name
///
/// Lowercases, strips everything outside [a-z0-9], truncates to 8 chars,
/// and appends a 0-999 suffix. Uniqueness is probabilistic only.
pub fn generate_username(panel_name: &str) -> String {
    let sanitized: String = panel_name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect();
    let suffix = rand::thread_rng().gen_range(0..1000);

    format!("{}{}", sanitized, suffix)
}

/// Synthetic email for the control-plane user record
pub fn synthesize_email(username: &str, domain: &str) -> String {
    format!("{}@{}", username, domain)
}
