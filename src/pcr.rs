//! PCR engine (C3)
//!
//! Owns the PCR bank and implements read, extend, selection-bitmap queries
//! and composite-hash construction. Generalized from `tpm/pcr.rs::
//! {extend_pcr, read_pcr}`'s single live TPM session into a plain in-memory
//! bank with no driver underneath: the physical TPM / DRTM interaction is an
//! external collaborator, out of scope here.

use crate::codec::{encode_pcr_composite, CompositeBytes, PcrSelection};
use crate::crypto::sha1;
use crate::error::{Error, Result};
use crate::{HASH_SIZE, PCR_COUNT};

/// Ordered bank of `PCR_COUNT` 20-byte PCR values, all zero until extended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcrBank {
    values: [[u8; HASH_SIZE]; PCR_COUNT],
}

impl Default for PcrBank {
    fn default() -> Self {
        Self::new()
    }
}

impl PcrBank {
    pub fn new() -> Self {
        Self {
            values: [[0u8; HASH_SIZE]; PCR_COUNT],
        }
    }

    /// Copies out PCR `index`.
    pub fn pcr_read(&self, index: usize) -> Result<[u8; HASH_SIZE]> {
        self.values.get(index).copied().ok_or(Error::PcrOutOfRange)
    }

    /// `pcr_bank[index] <- SHA1(pcr_bank[index] || measurement)`. Permanent,
    /// no reset operation — this is deliberate: it mirrors hardware PCR
    /// semantics and is what makes sealed-blob release non-forgeable.
    pub fn extend(&mut self, index: usize, measurement: &[u8; HASH_SIZE]) -> Result<()> {
        let slot = self.values.get_mut(index).ok_or(Error::PcrOutOfRange)?;
        let mut buf = [0u8; 2 * HASH_SIZE];
        buf[..HASH_SIZE].copy_from_slice(slot);
        buf[HASH_SIZE..].copy_from_slice(measurement);
        *slot = sha1(&buf);
        Ok(())
    }

    /// `false` if `index/8 >= sel.sizeOfSelect`; else bit `index%8` of
    /// `sel.bitmap[index/8]`.
    pub fn is_selected(sel: &PcrSelection, index: usize) -> bool {
        let byte_idx = index / 8;
        if byte_idx >= sel.bitmap.len() {
            return false;
        }
        (sel.bitmap[byte_idx] >> (index % 8)) & 1 != 0
    }

    /// Walks PCR indices in ascending order — never bitmap-scan order — so
    /// the resulting composite is canonical.
    pub fn build_current_composite(&self, sel: &PcrSelection) -> Result<CompositeBytes> {
        sel.validate()?;
        let mut picked = [[0u8; HASH_SIZE]; PCR_COUNT];
        let mut count = 0;
        for i in 0..PCR_COUNT {
            if Self::is_selected(sel, i) {
                picked[count] = self.values[i];
                count += 1;
            }
        }
        encode_pcr_composite(sel, &picked[..count])
    }

    /// `SHA1(build_current_composite(sel))`. Fails if the selection is empty
    /// — there is no composite to hash.
    pub fn current_composite_hash(&self, sel: &PcrSelection) -> Result<[u8; HASH_SIZE]> {
        if sel.is_empty() {
            return Err(Error::BadParam);
        }
        let composite = self.build_current_composite(sel)?;
        Ok(sha1(&composite))
    }
}
