//! One-shot operations composed from repositories and signing

mod redemption;

pub use redemption::{CreateRedemptionRequestUseCase, RedemptionRequest};
