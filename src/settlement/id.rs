//! Settlement identifiers: `STL-<unix-ms>-<16 hex chars>`

use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;

pub const PREFIX: &str = "STL";

/// New id from the wall clock and 8 bytes of OS entropy
pub fn generate() -> String {
    let mut entropy = [0u8; 8];
    OsRng.fill_bytes(&mut entropy);
    format!(
        "{}-{}-{}",
        PREFIX,
        Utc::now().timestamp_millis(),
        hex::encode(entropy)
    )
}

/// Shape check used before touching the store
pub fn is_well_formed(id: &str) -> bool {
    let mut parts = id.splitn(3, '-');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(PREFIX), Some(ms), Some(rand))
            if !ms.is_empty()
                && ms.bytes().all(|b| b.is_ascii_digit())
                && rand.len() == 16
                && rand.bytes().all(|b| b.is_ascii_hexdigit())
    )
}
