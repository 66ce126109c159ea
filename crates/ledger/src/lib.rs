pub mod codec;
pub mod download;
pub mod error;
pub mod moderation;
pub mod protocol;
pub mod registry;
pub mod users;

pub use download::{DownloadGate, DownloadGrant};
pub use error::LedgerError;
pub use moderation::ModerationGate;
pub use protocol::{
    ApprovalOutcome, CreditProtocol, DebitOutcome, NewUser, ProtocolConfig, RegistrationOutcome,
};
pub use registry::DocumentRegistry;
pub use users::{AdjustOutcome, BalanceGuard, CoupledWrite, UserLedger};
