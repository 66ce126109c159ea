use std::sync::Arc;

use campusdocs_core::{User, UserId};
use campusdocs_state::{CommitResult, Precondition, RecordStore, WriteOp};

use crate::codec;
use crate::error::LedgerError;

/// Precondition on the freshly-read balance, evaluated inside the atomic
/// unit rather than against any client-cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceGuard {
    /// No balance requirement (grants).
    None,
    /// The balance must be at least this much (debits).
    MinBalance(u64),
}

/// An extra write committed in the same atomic unit as a balance
/// adjustment, carrying its own version precondition.
///
/// Used by Grant-On-Approval to couple the document status flip with the
/// uploader's credit so neither is visible without the other.
#[derive(Debug, Clone)]
pub struct CoupledWrite {
    pub precondition: Precondition,
    pub write: WriteOp,
}

/// Result of a single optimistic balance-adjustment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustOutcome {
    /// The adjustment committed; `balance` is the new value.
    Committed { balance: u64 },
    /// A concurrent writer invalidated the read snapshot; the caller must
    /// re-read everything it staged and try again.
    Conflict,
}

/// Data-access module owning the per-user credit balance.
///
/// [`adjust_balance`](UserLedger::adjust_balance) is the only primitive in
/// the codebase that writes `credits`; registration, approval and download
/// all funnel through it so every contention case hits the same
/// optimistic-commit path.
pub struct UserLedger {
    store: Arc<dyn RecordStore>,
}

impl UserLedger {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Fetch a user's ledger record, or `None` if absent.
    pub async fn try_get(&self, id: &UserId) -> Result<Option<User>, LedgerError> {
        match self.store.get(&codec::user_key(id)).await? {
            Some(record) => Ok(Some(codec::decode(&record.value)?)),
            None => Ok(None),
        }
    }

    /// Fetch a user's ledger record, failing if absent.
    pub async fn get(&self, id: &UserId) -> Result<User, LedgerError> {
        self.try_get(id)
            .await?
            .ok_or_else(|| LedgerError::RecordNotFound(format!("user {id}")))
    }

    /// Create a ledger record only if none exists for this id.
    /// Returns `true` if the record was newly created.
    pub async fn create(&self, user: &User) -> Result<bool, LedgerError> {
        let value = codec::encode(user)?;
        Ok(self
            .store
            .check_and_set(&codec::user_key(&user.id), &value)
            .await?)
    }

    /// Perform one optimistic balance adjustment.
    ///
    /// Reads the user's record fresh, evaluates `guard` against that read,
    /// then commits the new balance with a version precondition — together
    /// with `coupled`, if given, as a single atomic unit.
    ///
    /// Retrying on [`AdjustOutcome::Conflict`] is the caller's job: a
    /// coupled write is staged from records this method never read, so only
    /// the caller can re-derive it.
    pub async fn adjust_balance(
        &self,
        id: &UserId,
        delta: i64,
        guard: BalanceGuard,
        coupled: Option<CoupledWrite>,
    ) -> Result<AdjustOutcome, LedgerError> {
        let key = codec::user_key(id);
        let record = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| LedgerError::RecordNotFound(format!("user {id}")))?;
        let mut user: User = codec::decode(&record.value)?;

        if let BalanceGuard::MinBalance(required) = guard
            && user.credits < required
        {
            return Err(LedgerError::InsufficientBalance {
                available: user.credits,
                required,
            });
        }

        let magnitude = delta.unsigned_abs();
        user.credits = if delta >= 0 {
            user.credits.saturating_add(magnitude)
        } else {
            user.credits
                .checked_sub(magnitude)
                .ok_or(LedgerError::InsufficientBalance {
                    available: user.credits,
                    required: magnitude,
                })?
        };

        let mut preconditions = vec![Precondition::at_version(key.clone(), record.version)];
        let mut writes = vec![WriteOp::Put {
            key,
            value: codec::encode(&user)?,
        }];
        if let Some(coupled) = coupled {
            preconditions.push(coupled.precondition);
            writes.push(coupled.write);
        }

        match self.store.commit(&preconditions, &writes).await? {
            CommitResult::Ok => Ok(AdjustOutcome::Committed {
                balance: user.credits,
            }),
            CommitResult::Conflict { .. } => Ok(AdjustOutcome::Conflict),
        }
    }
}
