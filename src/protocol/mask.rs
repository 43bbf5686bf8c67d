//! Client-to-server payload masking.
//!
//! Every byte of a masked payload is XORed with `key[i % 4]`. Applying the
//! same key twice restores the original bytes.

/// XOR `data` in place with the repeating 4-byte `key`.
#[inline]
pub fn apply_mask(data: &mut [u8], key: [u8; 4]) {
    // Word-at-a-time over the aligned body; offsets stay relative to `data`.
    let (chunks, tail) = data.split_at_mut(data.len() - data.len() % 4);
    let key_word = u32::from_ne_bytes(key);
    for chunk in chunks.chunks_exact_mut(4) {
        let word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) ^ key_word;
        chunk.copy_from_slice(&word.to_ne_bytes());
    }
    for (byte, k) in tail.iter_mut().zip(key) {
        *byte ^= k;
    }
}

/// Draw a fresh masking key.
///
/// Unpredictability matters more than strength here; if the OS source is
/// unavailable the key is derived from the clock instead of failing the send.
#[must_use]
pub fn generate_mask() -> [u8; 4] {
    let mut key = [0u8; 4];
    if let Err(e) = getrandom::getrandom(&mut key) {
        tracing::warn!(error = %e, "OS random source unavailable, masking with a clock-derived key");
        key = clock_mask();
    }
    key
}

fn clock_mask() -> [u8; 4] {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(0x9E37_79B9);
    nanos.wrapping_mul(0x85EB_CA6B).to_le_bytes()
}
