// ============================================
// File: crates/dhlink-core/src/crypto/dh.rs
// ============================================
//! # Finite-Field Diffie-Hellman
//!
//! ## Creation Reason
//! Holds the agreed group parameters and performs the two modular
//! exponentiations of the exchange.
//!
//! ## Main Functionality
//! - `GroupParams`: Validated modulus `p` and generator `g`
//! - `GroupParams::public_value`: `g^secret mod p`
//! - `GroupParams::shared_secret`: `remote^secret mod p`
//!
//! ## ⚠️ Important Note for Next Developer
//! - No primality or subgroup checks are done; the parameters are
//!   whatever the user typed on one side
//! - `p` must be at least 2, otherwise exponentiation is undefined
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::error::{CoreError, Result};

/// Modulus and generator both peers agreed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupParams {
    p: BigUint,
    g: BigUint,
}

impl GroupParams {
    /// Validates and wraps group parameters.
    ///
    /// # Errors
    /// `InvalidGroup` if `p < 2` or `g == 0`.
    pub fn new(p: BigUint, g: BigUint) -> Result<Self> {
        if p <= BigUint::one() {
            return Err(CoreError::invalid_group("p must be greater than 1"));
        }
        if g.is_zero() {
            return Err(CoreError::invalid_group("g must be greater than 0"));
        }
        Ok(Self { p, g })
    }

    /// Modulus.
    #[must_use]
    pub const fn p(&self) -> &BigUint {
        &self.p
    }

    /// Generator.
    #[must_use]
    pub const fn g(&self) -> &BigUint {
        &self.g
    }

    /// Computes the public value `g^secret mod p`.
    #[must_use]
    pub fn public_value(&self, secret: &BigUint) -> BigUint {
        self.g.modpow(secret, &self.p)
    }

    /// Computes the shared secret `remote_public^secret mod p`.
    #[must_use]
    pub fn shared_secret(&self, remote_public: &BigUint, secret: &BigUint) -> BigUint {
        remote_public.modpow(secret, &self.p)
    }
}

// ============================================
// Tests
// ============================================
