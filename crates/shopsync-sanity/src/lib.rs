pub mod client;
pub mod error;
pub mod transaction;

pub use client::{SanityClient, StoreOptions};
pub use error::SanityError;
pub use transaction::{CommitReceipt, Mutation, MutationResult, PatchMutation, Transaction};
