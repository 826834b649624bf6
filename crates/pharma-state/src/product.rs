//! # Product Registration
//!
//! What a batch contains and when it was made. The pair is committed in the
//! batch's Register record, so it is covered by the same digest chain as the
//! custody history.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pharma_core::Timestamp;

/// Why a product descriptor was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// The name is empty or whitespace.
    #[error("product name is empty")]
    EmptyName,

    /// The batch holds no units.
    #[error("product quantity is zero")]
    ZeroQuantity,
}

/// What was manufactured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    /// Product name, e.g. "Amoxicillin 500mg".
    pub name: String,
    /// Dosage form and strength, e.g. "capsule".
    pub formulation: String,
    /// Number of units in the batch.
    pub quantity: u64,
}

impl ProductDescriptor {
    /// Build a descriptor.
    pub fn new(name: impl Into<String>, formulation: impl Into<String>, quantity: u64) -> Self {
        Self {
            name: name.into(),
            formulation: formulation.into(),
            quantity,
        }
    }

    /// Reject descriptors with no name or zero quantity.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyName);
        }
        if self.quantity == 0 {
            return Err(ProductError::ZeroQuantity);
        }
        Ok(())
    }
}

/// The registration details carried by a batch's first record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// What the batch contains.
    pub product: ProductDescriptor,
    /// Client-supplied manufacturing time.
    pub manufactured_at: Timestamp,
}
