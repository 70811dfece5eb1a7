use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

const SCHEME: &str = "sha256";
const ITERATIONS: u32 = 10_000;

/// Salted, iterated SHA-256 in the form `sha256$<iterations>$<salt>$<hex digest>`
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!(
        "{}${}${}${}",
        SCHEME,
        ITERATIONS,
        salt,
        digest(password, &salt, ITERATIONS)
    )
}

/// False for a wrong password and for any hash this module did not produce
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };

    let actual = digest(password, salt, iterations);
    actual.len() == expected.len() && actual.as_bytes().ct_eq(expected.as_bytes()).unwrap_u8() == 1
}

fn digest(password: &str, salt: &str, iterations: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let mut out = hasher.finalize();

    for _ in 1..iterations {
        let mut hasher = Sha256::new();
        hasher.update(&out);
        hasher.update(password.as_bytes());
        out = hasher.finalize();
    }

    format!("{:x}", out)
}
