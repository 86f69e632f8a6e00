//! Software-emulated micro TPM.
//!
//! Owns a PCR bank, a sealed-storage engine and a quote/attestation engine
//! behind one instance type, [`instance::MicroTpm`]. Built `no_std` + `alloc`
//! (`#![cfg_attr(not(test), no_std)]`, following `zerovisor-core`'s
//! `attestation.rs`), since a per-tenant hypervisor guest is exactly the
//! kind of caller that cannot assume a host std runtime.
//!
//! Modules mirror the component breakdown:
//! - [`crypto`] — C1, the uniform call surface over SHA-1/HMAC/AES/RSA.
//! - [`codec`] — C2, the TPM structure encoder/decoder.
//! - [`pcr`] — C3, the PCR bank.
//! - [`seal`] — C4, the sealed-blob engine.
//! - [`quote`] — C5, the quote/attestation engine.
//! - [`instance`] — C6, the instance that ties them together.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod codec;
pub mod crypto;
pub mod error;
pub mod instance;
pub mod pcr;
pub mod seal;
pub mod quote;

/// Number of PCR registers in a bank.
pub const PCR_COUNT: usize = 24;
/// SHA-1 digest size in bytes; also the PCR and HMAC tag width.
pub const HASH_SIZE: usize = 20;
/// AES block size in bytes.
pub const AES_BLOCK: usize = 16;
/// AES-128 key size in bytes.
pub const AES_KEY_SIZE: usize = 16;
/// RSA-2048 modulus size in bytes.
pub const RSA_KEY_SIZE: usize = 256;
/// External nonce size for quotes, matching `HASH_SIZE`.
pub const NONCE_SIZE: usize = 20;

pub use error::{Error, Result};
pub use instance::{InstanceConfig, MicroTpm};
