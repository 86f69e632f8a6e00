//! Quote engine (C5)
//!
//! Produces a signed attestation over the current PCR composite plus an
//! external nonce. `tpm/quote.rs::generate_quote` already shapes an
//! `AttestationData { quote, signature, pcr_values }` triple but signs
//! nothing (`Vec::new()` placeholders); this module fills in the real
//! `TPM_QUOTE_INFO` framing and RSA-PKCS#1 v1.5/SHA-1 signature.

use rsa::RsaPrivateKey;

use crate::codec::PcrSelection;
use crate::crypto::{rsa_pkcs1v15_sha1_sign, sha1};
use crate::error::{Error, Result};
use crate::pcr::PcrBank;
use crate::{HASH_SIZE, NONCE_SIZE, RSA_KEY_SIZE};

/// Literal sentinels required for verifier compatibility.
const VERSION: [u8; 4] = [0x01, 0x01, 0x00, 0x00];
const FIXED: [u8; 4] = *b"QUOT";

/// `version(4) || "QUOT"(4) || composite-hash(20) || external-nonce(20)`.
pub const QUOTE_INFO_LEN: usize = 4 + 4 + HASH_SIZE + NONCE_SIZE;

fn build_quote_info(composite_hash: &[u8; HASH_SIZE], external_nonce: &[u8; NONCE_SIZE]) -> [u8; QUOTE_INFO_LEN] {
    let mut buf = [0u8; QUOTE_INFO_LEN];
    let mut pos = 0;
    buf[pos..pos + 4].copy_from_slice(&VERSION);
    pos += 4;
    buf[pos..pos + 4].copy_from_slice(&FIXED);
    pos += 4;
    buf[pos..pos + HASH_SIZE].copy_from_slice(composite_hash);
    pos += HASH_SIZE;
    buf[pos..pos + NONCE_SIZE].copy_from_slice(external_nonce);
    buf
}

/// Writes `composite || u32-be(RSA_KEY_SIZE) || sig` into `output`, returning
/// the number of bytes written. `sel.sizeOfSelect == 0` is `BAD_PARAM` (an
/// empty selection has no composite to attest to). An undersized `output`
/// returns `OUTPUT_TOO_SMALL` carrying the exact required size; `output` is
/// left untouched in that case.
pub fn quote(
    pcr_bank: &PcrBank,
    sel: &PcrSelection,
    external_nonce: &[u8; NONCE_SIZE],
    rsa_private: &RsaPrivateKey,
    output: &mut [u8],
) -> Result<usize> {
    if sel.is_empty() {
        return Err(Error::BadParam);
    }

    let composite = pcr_bank.build_current_composite(sel)?;
    let composite_hash = sha1(&composite);
    let quote_info = build_quote_info(&composite_hash, external_nonce);

    let required = composite.len() + 4 + RSA_KEY_SIZE;
    if output.len() < required {
        log::debug!(
            "quote: output buffer too small ({} < {required})",
            output.len()
        );
        return Err(Error::OutputTooSmall { required });
    }

    let sig = rsa_pkcs1v15_sha1_sign(rsa_private, &quote_info)?;
    if sig.len() != RSA_KEY_SIZE {
        return Err(Error::Internal);
    }

    let mut pos = 0;
    output[pos..pos + composite.len()].copy_from_slice(&composite);
    pos += composite.len();
    output[pos..pos + 4].copy_from_slice(&(RSA_KEY_SIZE as u32).to_be_bytes());
    pos += 4;
    output[pos..pos + RSA_KEY_SIZE].copy_from_slice(&sig);
    pos += RSA_KEY_SIZE;

    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rsa::traits::PublicKeyParts;
    use rsa::{pkcs1v15, RsaPublicKey};
    use sha1::Sha1;

    fn test_key(seed: u64) -> RsaPrivateKey {
        let mut rng = StdRng::seed_from_u64(seed);
        RsaPrivateKey::new(&mut rng, RSA_KEY_SIZE * 8).expect("key generation")
    }

    #[test]
    fn empty_selection_is_bad_param() {
        let bank = PcrBank::new();
        let key = test_key(10);
        let mut out = [0u8; 2048];
        assert_eq!(
            quote(&bank, &PcrSelection::empty(), &[0u8; NONCE_SIZE], &key, &mut out),
            Err(Error::BadParam)
        );
    }

    #[test]
    fn output_too_small_reports_required_size() {
        let bank = PcrBank::new();
        let sel = PcrSelection::from_indices(&[0]).unwrap();
        let key = test_key(11);

        let mut big_enough = [0u8; 2048];
        let required = quote(&bank, &sel, &[0xAAu8; NONCE_SIZE], &key, &mut big_enough).unwrap();

        let mut too_small = alloc::vec![0u8; required - 1];
        assert_eq!(
            quote(&bank, &sel, &[0xAAu8; NONCE_SIZE], &key, &mut too_small),
            Err(Error::OutputTooSmall { required })
        );
    }

    #[test]
    fn quote_shape_and_signature_verifies() {
        let bank = PcrBank::new();
        let sel = PcrSelection::from_indices(&[0]).unwrap();
        let key = test_key(12);
        let public = RsaPublicKey::from(&key);

        let nonce = [0xAAu8; NONCE_SIZE];
        let mut out = [0u8; 2048];
        let written = quote(&bank, &sel, &nonce, &key, &mut out).unwrap();

        let composite = bank.build_current_composite(&sel).unwrap();
        assert_eq!(&out[..composite.len()], &composite[..]);

        let mut pos = composite.len();
        let sig_len = u32::from_be_bytes(out[pos..pos + 4].try_into().unwrap()) as usize;
        assert_eq!(sig_len, RSA_KEY_SIZE);
        pos += 4;
        let sig_bytes = &out[pos..pos + RSA_KEY_SIZE];
        assert_eq!(pos + RSA_KEY_SIZE, written);

        let composite_hash = sha1(&composite);
        let quote_info = build_quote_info(&composite_hash, &nonce);

        let verifying_key = pkcs1v15::VerifyingKey::<Sha1>::new(public.clone());
        use rsa::signature::Verifier;
        let signature = pkcs1v15::Signature::try_from(sig_bytes).unwrap();
        assert!(verifying_key.verify(&quote_info, &signature).is_ok());
        assert_eq!(public.size(), RSA_KEY_SIZE);
    }
}
