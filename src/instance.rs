//! µTPM instance (C6)
//!
//! Owns one PCR bank and one set of keys, dispatching operations to the PCR,
//! seal and quote engines. `tpm/mod.rs` owns a single `TPM_DRIVER:
//! Mutex<Option<TisDriver>>` and dispatches through it; here there is no
//! driver, the instance *is* the TPM, and keys are supplied once at
//! construction by the trusted host (`security/mod.rs::SecurityConfig`'s
//! "construction is configuration" pattern, generalized).
//!
//! Single-threaded cooperative per instance: every method takes `&mut self`
//! (or `&self` for read-only PCR queries), so the host is responsible for
//! ensuring at most one thread touches an instance at a time — the same
//! contract a per-instance `Mutex` would enforce at a driver layer, pushed
//! up to the API boundary here.

use alloc::vec::Vec;
use rsa::RsaPrivateKey;
use zeroize::Zeroize;

use crate::codec::PcrSelection;
use crate::crypto::EntropySource;
use crate::error::Result;
use crate::pcr::PcrBank;
use crate::{seal, quote, AES_KEY_SIZE, HASH_SIZE, NONCE_SIZE};

/// Construction-time configuration for a µTPM instance: the keys a trusted
/// host provisions once and never mutates afterward.
pub struct InstanceConfig {
    pub hmac_key: [u8; HASH_SIZE],
    pub aes_key: [u8; AES_KEY_SIZE],
    pub rsa_private_key: RsaPrivateKey,
}

/// One per-tenant µTPM: a zero-initialized PCR bank plus the keys from
/// `InstanceConfig`. Keys are read-only after `init`; the instance has no
/// `reset_pcr` operation at all — PCR reset after extend is forbidden, so
/// there is nothing to guard against re-arming, and `init` is the
/// constructor, not a re-invocable method.
pub struct MicroTpm {
    pcr_bank: PcrBank,
    hmac_key: [u8; HASH_SIZE],
    aes_key: [u8; AES_KEY_SIZE],
    rsa_private_key: RsaPrivateKey,
}

impl MicroTpm {
    /// `init`: construct a fresh instance with a zeroed PCR bank.
    pub fn init(config: InstanceConfig) -> Self {
        log::info!(
            "utpm: instance initialized (PCR_COUNT={}, HASH_SIZE={})",
            crate::PCR_COUNT,
            HASH_SIZE
        );
        Self {
            pcr_bank: PcrBank::new(),
            hmac_key: config.hmac_key,
            aes_key: config.aes_key,
            rsa_private_key: config.rsa_private_key,
        }
    }

    pub fn pcr_read(&self, index: u32) -> Result<[u8; HASH_SIZE]> {
        self.pcr_bank.pcr_read(index as usize)
    }

    pub fn extend(&mut self, index: u32, measurement: &[u8; HASH_SIZE]) -> Result<()> {
        log::trace!("utpm: extend pcr={index}");
        let result = self.pcr_bank.extend(index as usize, measurement);
        if let Err(e) = result {
            log::debug!("utpm: extend failed: {e}");
        }
        result
    }

    pub fn seal(
        &self,
        sel: &PcrSelection,
        digest_at_release: Option<[u8; HASH_SIZE]>,
        plaintext: &[u8],
        rng: &mut dyn EntropySource,
    ) -> Result<Vec<u8>> {
        seal::seal(
            &self.pcr_bank,
            sel,
            digest_at_release,
            plaintext,
            &self.hmac_key,
            &self.aes_key,
            rng,
        )
    }

    pub fn unseal(&self, blob: &[u8]) -> Result<(Vec<u8>, Option<[u8; HASH_SIZE]>)> {
        let result = seal::unseal(&self.pcr_bank, blob, &self.hmac_key, &self.aes_key);
        if let Err(e) = &result {
            log::debug!("utpm: unseal failed: {e}");
        }
        result
    }

    pub fn quote(
        &self,
        sel: &PcrSelection,
        external_nonce: &[u8; NONCE_SIZE],
        output: &mut [u8],
    ) -> Result<usize> {
        quote::quote(&self.pcr_bank, sel, external_nonce, &self.rsa_private_key, output)
    }

    /// `rand`: delegate to the host-supplied entropy source.
    pub fn rand(&self, rng: &mut dyn EntropySource, n: usize) -> Result<Vec<u8>> {
        let mut buf = alloc::vec![0u8; n];
        rng.fill(&mut buf)?;
        Ok(buf)
    }
}

impl Drop for MicroTpm {
    fn drop(&mut self) {
        self.hmac_key.zeroize();
        self.aes_key.zeroize();
        // RsaPrivateKey implements ZeroizeOnDrop upstream; nothing further
        // to scrub here.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_instance(seed: u64) -> MicroTpm {
        let mut rng = StdRng::seed_from_u64(seed);
        let rsa_private_key =
            RsaPrivateKey::new(&mut rng, crate::RSA_KEY_SIZE * 8).expect("key generation");
        MicroTpm::init(InstanceConfig {
            hmac_key: [0x11u8; HASH_SIZE],
            aes_key: [0x22u8; AES_KEY_SIZE],
            rsa_private_key,
        })
    }

    #[test]
    fn full_lifecycle() {
        let mut tpm = test_instance(100);
        let mut rng = StdRng::seed_from_u64(101);

        tpm.extend(0, &[0x33u8; HASH_SIZE]).unwrap();
        let value = tpm.pcr_read(0).unwrap();
        assert_ne!(value, [0u8; HASH_SIZE]);

        let random = tpm.rand(&mut rng, 16).unwrap();
        assert_eq!(random.len(), 16);

        let blob = tpm
            .seal(&PcrSelection::empty(), None, b"payload", &mut rng)
            .unwrap();
        let (plaintext, digest) = tpm.unseal(&blob).unwrap();
        assert_eq!(plaintext, b"payload");
        assert_eq!(digest, None);

        let sel = PcrSelection::from_indices(&[0]).unwrap();
        let mut quote_out = [0u8; 2048];
        let written = tpm.quote(&sel, &[0x44u8; NONCE_SIZE], &mut quote_out).unwrap();
        assert!(written > 0);
    }
}
