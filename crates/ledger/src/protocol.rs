use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use campusdocs_core::{DocumentId, DocumentStatus, Role, User, UserId};
use campusdocs_state::{CommitResult, RecordStore};

use crate::error::LedgerError;
use crate::registry::DocumentRegistry;
use crate::users::{AdjustOutcome, BalanceGuard, UserLedger};

/// Tunable constants of the credit protocol.
///
/// The numeric values are product decisions surfaced through server config;
/// these defaults match the launch offer (3 welcome credits) and the
/// canonical approval reward of 5.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Credits granted when a ledger record is first created.
    pub registration_bonus: u64,
    /// Credits granted to the uploader when a document is approved.
    pub approval_reward: u64,
    /// Per-download cost applied when a submission doesn't name one.
    pub default_document_cost: u64,
    /// Optimistic attempts per operation before giving up with
    /// [`LedgerError::Conflict`].
    pub max_txn_attempts: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            registration_bonus: 3,
            approval_reward: 5,
            default_document_cost: 1,
            max_txn_attempts: 5,
        }
    }
}

/// Profile handed over by the identity provider at registration time.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

/// Result of Grant-On-Registration.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub user: User,
    /// `false` when a record already existed; the bonus is never re-granted.
    pub newly_created: bool,
}

/// Result of Grant-On-Approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The document transitioned to `approved` in this call.
    Approved {
        /// `false` when the uploader's ledger record was missing and the
        /// reward was dropped (tolerated gap).
        reward_granted: bool,
        /// The uploader's balance after the grant, when one was made.
        uploader_balance: Option<u64>,
    },
    /// The document had already left `pending`; nothing was changed. This
    /// is the benign outcome of an at-least-once trigger re-delivery.
    AlreadyProcessed { status: DocumentStatus },
}

/// Result of Debit-On-Download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitOutcome {
    pub cost: u64,
    pub remaining: u64,
}

/// The credit transaction protocol: three entry points that mutate the
/// user ledger, each a single atomic unit with optimistic retry.
///
/// Every balance change goes through [`UserLedger::adjust_balance`]; the
/// retry loops live here because a conflicted attempt must re-read every
/// record it staged (for approval that includes the document) before
/// re-evaluating its preconditions.
pub struct CreditProtocol {
    store: Arc<dyn RecordStore>,
    users: UserLedger,
    registry: DocumentRegistry,
    config: ProtocolConfig,
}

impl CreditProtocol {
    pub fn new(store: Arc<dyn RecordStore>, config: ProtocolConfig) -> Self {
        Self {
            users: UserLedger::new(Arc::clone(&store)),
            registry: DocumentRegistry::new(Arc::clone(&store), config.default_document_cost),
            store,
            config,
        }
    }

    /// The user ledger (reads and the balance-adjustment primitive).
    pub fn users(&self) -> &UserLedger {
        &self.users
    }

    /// The document registry.
    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    /// The active configuration.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Grant-On-Registration: create the ledger record with the welcome
    /// bonus. Safe to re-run: an existing record is returned untouched, so
    /// a duplicate registration trigger never double-grants.
    pub async fn grant_on_registration(
        &self,
        new_user: NewUser,
    ) -> Result<RegistrationOutcome, LedgerError> {
        let user = User {
            id: new_user.id,
            email: new_user.email,
            display_name: new_user.display_name,
            role: new_user.role,
            credits: self.config.registration_bonus,
            created_at: Utc::now(),
        };
        if self.users.create(&user).await? {
            debug!(user = %user.id, bonus = user.credits, "ledger record created");
            return Ok(RegistrationOutcome {
                user,
                newly_created: true,
            });
        }
        let existing = self.users.get(&user.id).await?;
        Ok(RegistrationOutcome {
            user: existing,
            newly_created: false,
        })
    }

    /// Grant-On-Approval: flip the document to `approved` and credit the
    /// uploader's reward in one atomic unit.
    ///
    /// Re-delivery safe: the `pending` check runs against the same read the
    /// commit is conditioned on, so a second firing observes `approved` and
    /// no-ops. A missing uploader record commits the status flip alone and
    /// drops the reward.
    pub async fn grant_on_approval(
        &self,
        document_id: &DocumentId,
    ) -> Result<ApprovalOutcome, LedgerError> {
        let reward = i64::try_from(self.config.approval_reward).unwrap_or(i64::MAX);

        for attempt in 1..=self.config.max_txn_attempts {
            let (doc, version) = self.registry.get_versioned(document_id).await?;
            if doc.status != DocumentStatus::Pending {
                return Ok(ApprovalOutcome::AlreadyProcessed { status: doc.status });
            }

            let (_, coupled) =
                DocumentRegistry::stage_status(&doc, version, DocumentStatus::Approved)?;

            match self
                .users
                .adjust_balance(
                    &doc.uploader_id,
                    reward,
                    BalanceGuard::None,
                    Some(coupled.clone()),
                )
                .await
            {
                Ok(AdjustOutcome::Committed { balance }) => {
                    debug!(
                        document = %document_id,
                        uploader = %doc.uploader_id,
                        balance,
                        "approval reward granted"
                    );
                    return Ok(ApprovalOutcome::Approved {
                        reward_granted: true,
                        uploader_balance: Some(balance),
                    });
                }
                Ok(AdjustOutcome::Conflict) => {
                    debug!(document = %document_id, attempt, "approval commit conflicted, retrying");
                }
                Err(LedgerError::RecordNotFound(_)) => {
                    // Tolerated gap: approve the document anyway, the reward
                    // is silently lost.
                    warn!(
                        document = %document_id,
                        uploader = %doc.uploader_id,
                        "uploader ledger record missing, approving without reward"
                    );
                    match self
                        .store
                        .commit(&[coupled.precondition], &[coupled.write])
                        .await?
                    {
                        CommitResult::Ok => {
                            return Ok(ApprovalOutcome::Approved {
                                reward_granted: false,
                                uploader_balance: None,
                            });
                        }
                        CommitResult::Conflict { .. } => {
                            debug!(document = %document_id, attempt, "status-only commit conflicted, retrying");
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(LedgerError::Conflict {
            attempts: self.config.max_txn_attempts,
        })
    }

    /// Debit-On-Download: subtract `cost` from the user's balance, with the
    /// sufficiency check evaluated against the in-transaction read. Two
    /// racing debits over one remaining credit serialize through the commit
    /// layer: the loser re-reads and fails the check on the post-commit
    /// balance.
    pub async fn debit_on_download(
        &self,
        user_id: &UserId,
        cost: u64,
    ) -> Result<DebitOutcome, LedgerError> {
        let delta = -i64::try_from(cost).unwrap_or(i64::MAX);

        for attempt in 1..=self.config.max_txn_attempts {
            match self
                .users
                .adjust_balance(user_id, delta, BalanceGuard::MinBalance(cost), None)
                .await?
            {
                AdjustOutcome::Committed { balance } => {
                    debug!(user = %user_id, cost, remaining = balance, "download debit committed");
                    return Ok(DebitOutcome {
                        cost,
                        remaining: balance,
                    });
                }
                AdjustOutcome::Conflict => {
                    debug!(user = %user_id, attempt, "debit commit conflicted, retrying");
                }
            }
        }

        Err(LedgerError::Conflict {
            attempts: self.config.max_txn_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use campusdocs_core::NewDocument;
    use campusdocs_state::{
        Collection, CommitResult, Precondition, RecordKey, RecordStore, StateError,
        VersionedRecord, WriteOp,
    };
    use campusdocs_state_memory::MemoryRecordStore;

    use super::*;

    fn protocol() -> CreditProtocol {
        CreditProtocol::new(
            Arc::new(MemoryRecordStore::new()),
            ProtocolConfig::default(),
        )
    }

    fn member(id: &str) -> NewUser {
        NewUser {
            id: UserId::new(id),
            email: format!("{id}@etud.example.edu"),
            display_name: id.to_owned(),
            role: Role::Member,
        }
    }

    fn submission(uploader: &str, locator: &str) -> NewDocument {
        NewDocument {
            title: "Partiel Micro 2023".to_owned(),
            faculty: "Economics".to_owned(),
            subject: "Microeconomics".to_owned(),
            year: 2023,
            kind: "exam".to_owned(),
            uploader_id: UserId::new(uploader),
            credits_cost: None,
            storage_locator: locator.to_owned(),
        }
    }

    #[tokio::test]
    async fn registration_grants_bonus_exactly_once() {
        let protocol = protocol();

        let first = protocol.grant_on_registration(member("alice")).await.unwrap();
        assert!(first.newly_created);
        assert_eq!(first.user.credits, 3);

        // Re-running the registration trigger must not double-grant.
        let second = protocol.grant_on_registration(member("alice")).await.unwrap();
        assert!(!second.newly_created);
        assert_eq!(second.user.credits, 3);
    }

    #[tokio::test]
    async fn approval_flips_status_and_credits_uploader_atomically() {
        let protocol = protocol();
        protocol.grant_on_registration(member("alice")).await.unwrap();
        let doc = protocol
            .registry()
            .create(submission("alice", "blob-1"))
            .await
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Pending);

        let outcome = protocol.grant_on_approval(&doc.id).await.unwrap();
        assert_eq!(
            outcome,
            ApprovalOutcome::Approved {
                reward_granted: true,
                uploader_balance: Some(8),
            }
        );

        let stored = protocol.registry().get(&doc.id).await.unwrap();
        assert_eq!(stored.status, DocumentStatus::Approved);
        let alice = protocol.users().get(&UserId::new("alice")).await.unwrap();
        assert_eq!(alice.credits, 8);
    }

    #[tokio::test]
    async fn approval_redelivery_is_a_noop() {
        let protocol = protocol();
        protocol.grant_on_registration(member("alice")).await.unwrap();
        let doc = protocol
            .registry()
            .create(submission("alice", "blob-1"))
            .await
            .unwrap();

        protocol.grant_on_approval(&doc.id).await.unwrap();
        let redelivered = protocol.grant_on_approval(&doc.id).await.unwrap();
        assert_eq!(
            redelivered,
            ApprovalOutcome::AlreadyProcessed {
                status: DocumentStatus::Approved,
            }
        );

        // Balance unchanged on the second delivery, and the status never
        // reverts.
        let alice = protocol.users().get(&UserId::new("alice")).await.unwrap();
        assert_eq!(alice.credits, 8);
        let stored = protocol.registry().get(&doc.id).await.unwrap();
        assert_eq!(stored.status, DocumentStatus::Approved);
    }

    #[tokio::test]
    async fn approval_of_unknown_document_is_record_not_found() {
        let protocol = protocol();
        let err = protocol
            .grant_on_approval(&DocumentId::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn approval_with_missing_uploader_still_approves() {
        let protocol = protocol();
        let doc = protocol
            .registry()
            .create(submission("never-registered", "blob-1"))
            .await
            .unwrap();

        let outcome = protocol.grant_on_approval(&doc.id).await.unwrap();
        assert_eq!(
            outcome,
            ApprovalOutcome::Approved {
                reward_granted: false,
                uploader_balance: None,
            }
        );
        let stored = protocol.registry().get(&doc.id).await.unwrap();
        assert_eq!(stored.status, DocumentStatus::Approved);
    }

    #[tokio::test]
    async fn debit_requires_in_transaction_balance() {
        let protocol = protocol();
        protocol.grant_on_registration(member("bob")).await.unwrap();

        let outcome = protocol
            .debit_on_download(&UserId::new("bob"), 2)
            .await
            .unwrap();
        assert_eq!(outcome, DebitOutcome { cost: 2, remaining: 1 });

        let err = protocol
            .debit_on_download(&UserId::new("bob"), 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance {
                available: 1,
                required: 2,
            }
        ));

        // The failed debit left no partial effect.
        let bob = protocol.users().get(&UserId::new("bob")).await.unwrap();
        assert_eq!(bob.credits, 1);
    }

    #[tokio::test]
    async fn debit_for_unknown_user_is_fatal() {
        let protocol = protocol();
        let err = protocol
            .debit_on_download(&UserId::new("ghost"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_debits_exhaust_balance_exactly() {
        // Balance 1, two simultaneous downloads costing 1 each: exactly one
        // succeeds, one fails, final balance is 0 and never negative.
        let store = Arc::new(MemoryRecordStore::new());
        let protocol = Arc::new(CreditProtocol::new(
            Arc::clone(&store) as Arc<dyn RecordStore>,
            ProtocolConfig {
                registration_bonus: 1,
                ..ProtocolConfig::default()
            },
        ));
        protocol.grant_on_registration(member("carol")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..2 {
            let protocol = Arc::clone(&protocol);
            handles.push(tokio::spawn(async move {
                protocol.debit_on_download(&UserId::new("carol"), 1).await
            }));
        }

        let mut successes = 0;
        let mut insufficient = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(outcome) => {
                    assert_eq!(outcome.remaining, 0);
                    successes += 1;
                }
                Err(LedgerError::InsufficientBalance { available: 0, required: 1 }) => {
                    insufficient += 1;
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(insufficient, 1);

        let carol = protocol.users().get(&UserId::new("carol")).await.unwrap();
        assert_eq!(carol.credits, 0);
    }

    #[tokio::test]
    async fn end_to_end_contribution_cycle() {
        let protocol = protocol();

        // A registers with the 3-credit welcome bonus.
        let a = protocol.grant_on_registration(member("a")).await.unwrap();
        assert_eq!(a.user.credits, 3);

        // A uploads; the submission defaults to cost 1 and starts pending.
        let doc = protocol
            .registry()
            .create(submission("a", "blob-exam"))
            .await
            .unwrap();
        assert_eq!(doc.credits_cost, 1);
        assert_eq!(doc.status, DocumentStatus::Pending);

        // Moderator approval: A's balance 3 -> 8.
        let outcome = protocol.grant_on_approval(&doc.id).await.unwrap();
        assert_eq!(
            outcome,
            ApprovalOutcome::Approved {
                reward_granted: true,
                uploader_balance: Some(8),
            }
        );

        // B registers and downloads: balance decremented by the cost.
        protocol.grant_on_registration(member("b")).await.unwrap();
        let debit = protocol
            .debit_on_download(&UserId::new("b"), doc.credits_cost)
            .await
            .unwrap();
        assert_eq!(debit.remaining, 2);
    }

    // -- Conflict injection ------------------------------------------------

    /// Delegating store that answers the first `fail_commits` commit calls
    /// with a fabricated conflict, then behaves normally.
    struct ConflictingStore {
        inner: MemoryRecordStore,
        fail_commits: AtomicU32,
    }

    impl ConflictingStore {
        fn new(fail_commits: u32) -> Self {
            Self {
                inner: MemoryRecordStore::new(),
                fail_commits: AtomicU32::new(fail_commits),
            }
        }
    }

    #[async_trait]
    impl RecordStore for ConflictingStore {
        async fn get(&self, key: &RecordKey) -> Result<Option<VersionedRecord>, StateError> {
            self.inner.get(key).await
        }

        async fn check_and_set(&self, key: &RecordKey, value: &str) -> Result<bool, StateError> {
            self.inner.check_and_set(key, value).await
        }

        async fn delete(&self, key: &RecordKey) -> Result<bool, StateError> {
            self.inner.delete(key).await
        }

        async fn scan(
            &self,
            collection: Collection,
        ) -> Result<Vec<(String, VersionedRecord)>, StateError> {
            self.inner.scan(collection).await
        }

        async fn commit(
            &self,
            preconditions: &[Precondition],
            writes: &[WriteOp],
        ) -> Result<CommitResult, StateError> {
            let remaining = self.fail_commits.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_commits.store(remaining - 1, Ordering::SeqCst);
                return Ok(CommitResult::Conflict {
                    key: preconditions[0].key.clone(),
                    found_version: u64::MAX,
                });
            }
            self.inner.commit(preconditions, writes).await
        }
    }

    #[tokio::test]
    async fn debit_retries_through_transient_conflicts() {
        let store = Arc::new(ConflictingStore::new(2));
        let protocol = CreditProtocol::new(store, ProtocolConfig::default());
        protocol.grant_on_registration(member("dave")).await.unwrap();

        // Two conflicted attempts, third one lands.
        let outcome = protocol
            .debit_on_download(&UserId::new("dave"), 1)
            .await
            .unwrap();
        assert_eq!(outcome.remaining, 2);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_transaction_conflict() {
        let store = Arc::new(ConflictingStore::new(u32::MAX));
        let protocol = CreditProtocol::new(store, ProtocolConfig::default());
        protocol.grant_on_registration(member("erin")).await.unwrap();

        let err = protocol
            .debit_on_download(&UserId::new("erin"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict { attempts: 5 }));

        // No partial effect despite five attempts.
        let erin = protocol.users().get(&UserId::new("erin")).await.unwrap();
        assert_eq!(erin.credits, 3);
    }
}
