//! Sealed-blob engine (C4)
//!
//! Binds a plaintext to a confidentiality key, an authenticity key and,
//! optionally, a PCR-release policy: encrypt-then-MAC with AES-128-CBC and
//! HMAC-SHA1. Grounded in structure on `tpm/seal.rs::{seal_data,
//! unseal_data}`, whose docstring already lists the exact steps ("read
//! current PCR values", "calculate policy digest", "create data object
//! with policy") as a TODO this module now implements in full rather than
//! returning a placeholder blob.
//!
//! Failure ordering is load-bearing, not incidental: MAC first, structure
//! parsing second, policy check last, so a forged or bit-flipped blob is
//! rejected before its bytes are ever decrypted or interpreted.

use alloc::vec::Vec;
use zeroize::Zeroize;

use crate::codec::{decode_pcr_info, encode_pcr_info, PcrInfo};
use crate::crypto::{
    aes128_cbc_decrypt, aes128_cbc_encrypt, constant_time_eq, hmac_sha1, EntropySource,
};
use crate::error::{Error, Result};
use crate::pcr::PcrBank;
use crate::{codec::PcrSelection, AES_BLOCK, HASH_SIZE};

const IV_LEN: usize = AES_BLOCK;
const MAC_LEN: usize = HASH_SIZE;
const LEN_FIELD: usize = 4;

/// Pads `buf` with zero bytes up to the next 16-byte multiple. If `buf` is
/// already aligned a full zero block is still appended — length recovery at
/// unseal relies solely on the embedded `plaintext_len`, never on where the
/// zero padding starts.
fn zero_pad_to_block(buf: &mut Vec<u8>) {
    let pad = AES_BLOCK - (buf.len() % AES_BLOCK);
    buf.resize(buf.len() + pad, 0);
}

/// Seals `plaintext` under `hmac_key`/`aes_key`, optionally binding release
/// to the PCR composite named by `sel`. `digest_at_release` is required iff
/// `sel` selects at least one PCR.
pub fn seal(
    pcr_bank: &PcrBank,
    sel: &PcrSelection,
    digest_at_release: Option<[u8; HASH_SIZE]>,
    plaintext: &[u8],
    hmac_key: &[u8; HASH_SIZE],
    aes_key: &[u8; 16],
    rng: &mut dyn EntropySource,
) -> Result<Vec<u8>> {
    log::trace!(
        "seal: sizeOfSelect={} plaintext_len={}",
        sel.size_of_select(),
        plaintext.len()
    );

    let info = if sel.is_empty() {
        PcrInfo::unbound()
    } else {
        let digest_at_release = digest_at_release.ok_or(Error::BadParam)?;
        let digest_at_creation = pcr_bank.current_composite_hash(sel)?;
        PcrInfo {
            selection: sel.clone(),
            digest_at_release: Some(digest_at_release),
            digest_at_creation: Some(digest_at_creation),
        }
    };

    let mut iv = [0u8; IV_LEN];
    rng.fill(&mut iv).inspect_err(|_| {
        log::warn!("seal: RNG short-returned IV");
    })?;

    let mut staged = encode_pcr_info(&info);
    staged.extend_from_slice(&(plaintext.len() as u32).to_be_bytes());
    staged.extend_from_slice(plaintext);
    zero_pad_to_block(&mut staged);

    let ciphertext = aes128_cbc_encrypt(aes_key, &iv, &staged);
    staged.zeroize();
    let ciphertext = ciphertext?;

    let mut blob = Vec::with_capacity(IV_LEN + ciphertext.len() + MAC_LEN);
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&ciphertext);
    let mac = hmac_sha1(hmac_key, &blob);
    blob.extend_from_slice(&mac);

    Ok(blob)
}

/// Unseals `blob`. Returns the plaintext and, when the blob was bound to a
/// PCR policy, the `digestAtCreation` captured at seal time.
pub fn unseal(
    pcr_bank: &PcrBank,
    blob: &[u8],
    hmac_key: &[u8; HASH_SIZE],
    aes_key: &[u8; 16],
) -> Result<(Vec<u8>, Option<[u8; HASH_SIZE]>)> {
    if blob.len() < IV_LEN + AES_BLOCK + MAC_LEN || (blob.len() - MAC_LEN) % AES_BLOCK != 0 {
        log::debug!("unseal: malformed blob length {}", blob.len());
        return Err(Error::Malformed);
    }

    let (iv_and_ciphertext, tag) = blob.split_at(blob.len() - MAC_LEN);
    let computed_tag = hmac_sha1(hmac_key, iv_and_ciphertext);
    if !constant_time_eq(&computed_tag, tag) {
        log::warn!("unseal: HMAC mismatch");
        return Err(Error::IntegrityFailure);
    }

    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&iv_and_ciphertext[..IV_LEN]);
    let ciphertext = &iv_and_ciphertext[IV_LEN..];

    let mut staged =
        aes128_cbc_decrypt(aes_key, &iv, ciphertext).map_err(|_| Error::Malformed)?;

    let result = (|| {
        let (info, consumed) = decode_pcr_info(&staged)?;
        if staged.len() < consumed + LEN_FIELD {
            return Err(Error::Malformed);
        }
        let len = u32::from_be_bytes([
            staged[consumed],
            staged[consumed + 1],
            staged[consumed + 2],
            staged[consumed + 3],
        ]) as usize;
        let data_start = consumed + LEN_FIELD;
        if staged.len() < data_start + len {
            return Err(Error::Malformed);
        }

        if !info.selection.is_empty() {
            let current = pcr_bank.current_composite_hash(&info.selection)?;
            let expected = info.digest_at_release.ok_or(Error::Malformed)?;
            if !constant_time_eq(&current, &expected) {
                log::warn!("unseal: PCR composite mismatch");
                return Err(Error::PcrMismatch);
            }
        }

        Ok((
            staged[data_start..data_start + len].to_vec(),
            info.digest_at_creation,
        ))
    })();

    staged.zeroize();
    result
}
