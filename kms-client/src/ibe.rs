//! Client-facing IBE convenience wrappers (§4.3), combining
//! [`crate::combiner`] output with `kms_core::ibe`.

use kms_core::{G1, G2};
use rand::{CryptoRng, RngCore};

use crate::error::ClientError;

/// Encrypts `plaintext` to `app_id` under the master public key `mpk`, for
/// an application that has fetched `mpk` from [`crate::pubkey`].
pub fn encrypt(
    app_id: &[u8],
    mpk: &G2,
    plaintext: &[u8],
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<Vec<u8>, ClientError> {
    kms_core::ibe::encrypt(app_id, mpk, plaintext, rng).map_err(ClientError::from)
}

/// Decrypts `ciphertext` using the application private key recovered by
/// [`crate::combiner::combine`].
pub fn decrypt(app_id: &[u8], app_sk: &G1, ciphertext: &[u8]) -> Result<Vec<u8>, ClientError> {
    kms_core::ibe::decrypt(app_id, app_sk, ciphertext).map_err(ClientError::from)
}
