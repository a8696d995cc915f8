//! Room code generation.

use rally_protocol::RoomCode;
use rand::Rng;

/// Alphabet for room codes: digits plus uppercase letters (base 36).
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a fresh 6-character room code from a uniform random source.
///
/// 36^6 ≈ 2.2 billion codes, so a collision among the handful of rooms
/// live at once is negligible — but callers still check the registry and
/// regenerate on conflict, because two clients creating rooms in the
/// same instant must never share one.
pub(crate) fn generate() -> RoomCode {
    let mut rng = rand::rng();
    let code = (0..RoomCode::LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    RoomCode(code)
}
