//! The hash function used for script hashes and transaction hashes:
//! blake2b with a 256-bit digest, personalized with `ckb-default-hash`.

pub use blake2b_rs::{Blake2b, Blake2bBuilder};

/// Output length of the hash function, in bytes.
pub const BLAKE2B_LEN: usize = 32;
/// The blake2b personalization of the chain.
pub const CKB_HASH_PERSONALIZATION: &[u8] = b"ckb-default-hash";

/// Creates a new hasher instance.
pub fn new_blake2b() -> Blake2b {
    Blake2bBuilder::new(BLAKE2B_LEN)
        .personal(CKB_HASH_PERSONALIZATION)
        .build()
}

/// Hashes a slice in one shot.
pub fn blake2b_256<T: AsRef<[u8]>>(s: T) -> [u8; 32] {
    let mut result = [0u8; BLAKE2B_LEN];
    let mut blake2b = new_blake2b();
    blake2b.update(s.as_ref());
    blake2b.finalize(&mut result);
    result
}
