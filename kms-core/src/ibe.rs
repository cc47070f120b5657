//! Boneh–Franklin Identity-Based Encryption codec.
//!
//! Encrypts a payload under an arbitrary application identity string: the
//! identity is hashed to a curve point, paired with the master secret (or,
//! for encryption, the master public key) to derive a shared secret, which
//! is then run through HKDF to key AES-256-GCM. Framing, salt, info string,
//! and AAD are fixed so that any compliant implementation produces and
//! consumes the same ciphertext bytes.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use hkdf::Hkdf;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;

use crate::curve::{pair, Fr, Gt, G1, G2};
use crate::error::CoreError;

const MAGIC: &[u8; 3] = b"IBE";
const VERSION: u8 = 0x01;
const HKDF_SALT: &[u8] = b"eigenx-kms-go-ibe-encryption";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const C1_LEN: usize = 96;
const FRAME_MIN_LEN: usize = 3 + 1 + C1_LEN + NONCE_LEN + TAG_LEN;

fn validate_app_id(app_id: &[u8]) -> Result<(), CoreError> {
    if app_id.len() < 5 {
        return Err(CoreError::IdentityTooShort);
    }
    Ok(())
}

fn derive_key(g_id: &Gt, app_id: &[u8], version: u8) -> [u8; 32] {
    let ikm = g_id.to_bytes();
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), &ikm);
    let mut info = Vec::with_capacity(18 + app_id.len());
    info.extend_from_slice(b"IBE-encryption|v");
    info.extend_from_slice(version.to_string().as_bytes());
    info.push(b'|');
    info.extend_from_slice(app_id);
    let mut okm = [0u8; 32];
    hk.expand(&info, &mut okm)
        .expect("32 is a valid SHA-256 HKDF output length");
    okm
}

fn build_aad(app_id: &[u8], version: u8, c1: &[u8; C1_LEN]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(app_id.len() + 1 + C1_LEN);
    aad.extend_from_slice(app_id);
    aad.push(version);
    aad.extend_from_slice(c1);
    aad
}

/// Encrypts `plaintext` to `app_id` under the master public key `mpk`.
///
/// Emits `"IBE" || 0x01 || C1(96) || nonce(12) || gcm_output` (§4.3).
pub fn encrypt(
    app_id: &[u8],
    mpk: &G2,
    plaintext: &[u8],
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<Vec<u8>, CoreError> {
    validate_app_id(app_id)?;
    if mpk.is_identity() {
        return Err(CoreError::DegenerateMasterKey);
    }
    let q_id = G1::hash_to_curve(app_id);

    let r = Fr::random(rng);
    let c1 = G2::generator().scalar_mul(&r);
    if c1.is_identity() {
        // Cryptographically impossible for r != 0; guarded per §4.3 step 2.
        return Err(CoreError::DegenerateMasterKey);
    }

    let base = pair(&q_id, mpk);
    if base.is_identity() {
        return Err(CoreError::DegenerateMasterKey);
    }
    let g_id = base.pow(&r);

    let key_bytes = derive_key(&g_id, app_id, VERSION);
    let cipher = Aes256Gcm::new_from_slice(&key_bytes).expect("32-byte key");

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let c1_bytes = c1.to_compressed();
    let aad = build_aad(app_id, VERSION, &c1_bytes);
    let gcm_output = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|_| CoreError::DecryptionFailed)?;

    let mut out = Vec::with_capacity(FRAME_MIN_LEN + plaintext.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&c1_bytes);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&gcm_output);
    Ok(out)
}

/// Decrypts a ciphertext previously produced by [`encrypt`], given the
/// per-identity private key `app_sk = s · hashToG1(appID)`.
pub fn decrypt(app_id: &[u8], app_sk: &G1, ciphertext: &[u8]) -> Result<Vec<u8>, CoreError> {
    validate_app_id(app_id)?;
    if ciphertext.len() < FRAME_MIN_LEN {
        return Err(CoreError::InvalidEncoding);
    }
    if &ciphertext[0..3] != MAGIC {
        return Err(CoreError::InvalidEncoding);
    }
    let version = ciphertext[3];
    if version != VERSION {
        return Err(CoreError::InvalidEncoding);
    }

    let mut c1_bytes = [0u8; C1_LEN];
    c1_bytes.copy_from_slice(&ciphertext[4..4 + C1_LEN]);
    let nonce_off = 4 + C1_LEN;
    let nonce_bytes = &ciphertext[nonce_off..nonce_off + NONCE_LEN];
    let gcm_output = &ciphertext[nonce_off + NONCE_LEN..];

    if app_sk.is_identity() {
        return Err(CoreError::DecryptionFailed);
    }
    let c1 = G2::from_compressed(&c1_bytes).map_err(|_| CoreError::DecryptionFailed)?;
    if c1.is_identity() {
        return Err(CoreError::DecryptionFailed);
    }

    let g_id = pair(app_sk, &c1);
    let key_bytes = derive_key(&g_id, app_id, version);
    let cipher = Aes256Gcm::new_from_slice(&key_bytes).expect("32-byte key");
    let nonce = Nonce::from_slice(nonce_bytes);
    let aad = build_aad(app_id, version, &c1_bytes);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: gcm_output,
                aad: &aad,
            },
        )
        .map_err(|_| CoreError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    fn rng() -> ChaChaRng {
        ChaChaRng::seed_from_u64(7)
    }

    fn sample_master_key(r: &mut ChaChaRng) -> (Fr, G2) {
        let s = Fr::random(r);
        (s, G2::generator().scalar_mul(&s))
    }

    #[test]
    fn roundtrip_matches_property_law_7() {
        let mut r = rng();
        let (s, mpk) = sample_master_key(&mut r);
        let app_id = b"test-app-123";
        let sk_id = G1::hash_to_curve(app_id).scalar_mul(&s);

        let ct = encrypt(app_id, &mpk, b"hello world", &mut r).unwrap();
        let pt = decrypt(app_id, &sk_id, &ct).unwrap();
        assert_eq!(pt, b"hello world");
    }

    #[test]
    fn aad_binding_rejects_bit_flip_on_c1() {
        let mut r = rng();
        let (s, mpk) = sample_master_key(&mut r);
        let app_id = b"test-app-123";
        let sk_id = G1::hash_to_curve(app_id).scalar_mul(&s);

        let mut ct = encrypt(app_id, &mpk, b"secret before reshare", &mut r).unwrap();
        ct[4] ^= 0x01; // flip a bit inside C1
        assert_eq!(decrypt(app_id, &sk_id, &ct), Err(CoreError::DecryptionFailed));
    }

    #[test]
    fn rejects_identity_master_key() {
        let mut r = rng();
        assert_eq!(
            encrypt(b"test-app-123", &G2::identity(), b"x", &mut r),
            Err(CoreError::DegenerateMasterKey)
        );
    }

    #[test]
    fn rejects_short_app_id() {
        let mut r = rng();
        let (_, mpk) = sample_master_key(&mut r);
        assert_eq!(
            encrypt(b"abcd", &mpk, b"x", &mut r),
            Err(CoreError::IdentityTooShort)
        );
    }
}
