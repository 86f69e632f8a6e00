//! Crypto facade (C1)
//!
//! Uniform, narrow calls to SHA-1, HMAC-SHA1, AES-128-CBC and RSA-PKCS#1
//! v1.5 signing. `security/crypto/{aes,rsa}.rs` stub these exact primitives
//! out (`Err("AES not implemented")`, `Err("RSA not implemented")`) while
//! the surrounding workspace already depends on the RustCrypto family
//! (`aes`, `sha2`, `hkdf`, `subtle`) for everything else; this module
//! finishes that facade with the sibling RustCrypto crates for the
//! algorithms the sealed-blob format fixes, instead of hand-rolling them.
//!
//! Raw primitive math is an out-of-scope collaborator; this module is the
//! in-scope uniform call surface over it.

use alloc::vec::Vec;

use aes::Aes128;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rsa::signature::Signer;
use rsa::RsaPrivateKey;
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha1 = Hmac<Sha1>;

/// SHA-1 digest of `data`.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    use sha1::Digest;
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// HMAC-SHA1 over `data` under `key` (arbitrary-length key; callers here
/// always pass the 20-byte instance HMAC key).
pub fn hmac_sha1(key: &[u8], data: &[u8]) -> [u8; 20] {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Constant-time equality for MAC and PCR-release comparisons (§4.3, §7).
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// AES-128-CBC encrypt. `plaintext` must already be a multiple of 16 bytes.
pub fn aes128_cbc_encrypt(key: &[u8; 16], iv: &[u8; 16], plaintext: &[u8]) -> Result<Vec<u8>> {
    if plaintext.len() % 16 != 0 {
        return Err(Error::BadParam);
    }
    let mut buf = plaintext.to_vec();
    let enc = Aes128CbcEnc::new(key.into(), iv.into());
    let len = buf.len();
    let ct_len = enc
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .map_err(|_| Error::Internal)?
        .len();
    buf.truncate(ct_len);
    Ok(buf)
}

/// AES-128-CBC decrypt. `ciphertext` must already be a multiple of 16 bytes.
pub fn aes128_cbc_decrypt(key: &[u8; 16], iv: &[u8; 16], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() % 16 != 0 {
        return Err(Error::Malformed);
    }
    let mut buf = ciphertext.to_vec();
    let dec = Aes128CbcDec::new(key.into(), iv.into());
    let pt_len = dec
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| Error::Internal)?
        .len();
    buf.truncate(pt_len);
    Ok(buf)
}

/// RSA-PKCS#1 v1.5 signature over `message`, hashed with SHA-1 internally
/// (the DigestInfo/OID framing required for verifier compatibility).
pub fn rsa_pkcs1v15_sha1_sign(private_key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>> {
    let signing_key = rsa::pkcs1v15::SigningKey::<Sha1>::new(private_key.clone());
    let signature = signing_key.try_sign(message).map_err(|_| Error::Internal)?;
    Ok(signature.into())
}

/// Narrow consumed interface for randomness: the host supplies entropy, the
/// core never owns a hardware RNG. Generalized from `crypto/random.rs::
/// CryptoRng`, minus the hardware-probing concerns that are out of scope
/// for this crate.
pub trait EntropySource {
    /// Fill `buf` with random bytes, or fail with `InsufficientEntropy` if
    /// the source short-returns.
    fn fill(&mut self, buf: &mut [u8]) -> Result<()>;
}

impl<R: rand_core::RngCore> EntropySource for R {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.try_fill_bytes(buf)
            .map_err(|_| Error::InsufficientEntropy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_known_vector() {
        // SHA1("abc")
        let digest = sha1(b"abc");
        assert_eq!(
            digest,
            [
                0xa9, 0x99, 0x3e, 0x36, 0x47, 0x06, 0x81, 0x6a, 0xba, 0x3e, 0x25, 0x71, 0x78, 0x50,
                0xc2, 0x6c, 0x9c, 0xd0, 0xd8, 0x9d,
            ]
        );
    }

    #[test]
    fn hmac_sha1_rfc2202_case1() {
        // RFC 2202 test case 1
        let key = [0x0bu8; 20];
        let data = b"Hi There";
        let expected = [
            0xb6, 0x17, 0x31, 0x86, 0x55, 0x05, 0x72, 0x64, 0xe2, 0x8b, 0xc0, 0xb6, 0xfb, 0x37,
            0x8c, 0x8e, 0xf1, 0x46, 0xbe, 0x00,
        ];
        assert_eq!(hmac_sha1(&key, data), expected);
    }

    #[test]
    fn cbc_round_trip() {
        let key = [0x42u8; 16];
        let iv = [0x24u8; 16];
        let plaintext = [0u8; 32];
        let ct = aes128_cbc_encrypt(&key, &iv, &plaintext).unwrap();
        assert_eq!(ct.len(), 32);
        let pt = aes128_cbc_decrypt(&key, &iv, &ct).unwrap();
        assert_eq!(pt, plaintext);
    }

    #[test]
    fn constant_time_eq_basic() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
