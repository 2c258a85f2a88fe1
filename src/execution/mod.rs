//! Transaction execution: nonce tracking, action encoding, signing and
//! confirmation of single steps.

pub mod action;
pub mod approval;
pub mod executor;
pub mod gas;
pub mod nonce;
pub mod signer;

pub use action::{Action, ActionKind};
pub use approval::ApprovalGate;
pub use executor::{ExecutorSettings, StepExecutor, StepReceipt};
pub use gas::GasPolicy;
pub use nonce::NonceCursor;
pub use signer::Account;
