use std::future::IntoFuture;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use super::{wait_until, GateKind, PollOptions};
use crate::error::Error;
use crate::rpc::StatusSource;

/// Result handed to every waiter of a gate.
pub type GateOutcome = Result<(), Arc<Error>>;

/// A readiness check started once and shared by everyone who asks for it.
///
/// The poll loop runs in its own task from the moment the gate is created,
/// so dropping a waiter never cancels or restarts it.
#[derive(Clone)]
pub struct Gate {
    kind: GateKind,
    attempts: Arc<AtomicU32>,
    outcome: Shared<BoxFuture<'static, GateOutcome>>,
}

impl Gate {
    /// Start polling `source` for `kind`. Must be called from within a tokio runtime.
    pub fn spawn<S: StatusSource>(kind: GateKind, source: Arc<S>, options: PollOptions) -> Self {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let task = tokio::spawn(async move {
            wait_until(kind, &*source, options, |s| {
                counter.fetch_add(1, Ordering::Relaxed);
                kind.check(s)
            })
            .await
            .map_err(Arc::new)
        });

        let outcome = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(Arc::new(Error::Aborted {
                    gate: kind,
                    reason: e.to_string(),
                })),
            }
        }
        .boxed()
        .shared();

        Self {
            kind,
            attempts,
            outcome,
        }
    }

    /// A gate that is already decided and never polls.
    pub fn resolved(kind: GateKind, outcome: GateOutcome) -> Self {
        let outcome = futures::future::ready(outcome).boxed().shared();
        // Drive it once so `peek` sees the result.
        let _ = outcome.clone().now_or_never();
        Self {
            kind,
            attempts: Arc::new(AtomicU32::new(0)),
            outcome,
        }
    }

    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// Number of times the condition has been evaluated so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// The result, if the poll loop has already been observed to finish.
    pub fn peek(&self) -> Option<GateOutcome> {
        self.outcome.peek().cloned()
    }

    /// Whether both handles refer to the same poll loop.
    pub fn same_as(&self, other: &Gate) -> bool {
        Arc::ptr_eq(&self.attempts, &other.attempts)
    }

    pub async fn wait(&self) -> GateOutcome {
        self.outcome.clone().await
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("kind", &self.kind)
            .field("attempts", &self.attempts())
            .field("done", &self.outcome.peek().is_some())
            .finish()
    }
}

impl IntoFuture for Gate {
    type Output = GateOutcome;
    type IntoFuture = Shared<BoxFuture<'static, GateOutcome>>;

    fn into_future(self) -> Self::IntoFuture {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::rpc::{NodeStatus, SyncInfo};
    use std::time::Duration;

    struct Height(u64);

    impl StatusSource for Height {
        async fn status(&self) -> Result<NodeStatus> {
            Ok(NodeStatus {
                sync_info: SyncInfo {
                    catching_up: false,
                    latest_block_height: self.0,
                },
            })
        }
    }

    fn options(timeout_ms: u64) -> PollOptions {
        PollOptions {
            timeout: Some(Duration::from_millis(timeout_ms)),
            interval: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_clones_share_one_loop() {
        let gate = Gate::spawn(GateKind::Synced, Arc::new(Height(3)), options(1_000));
        let again = gate.clone();
        assert!(gate.same_as(&again));

        gate.wait().await.unwrap();
        again.clone().await.unwrap();
        assert_eq!(gate.attempts(), 1);
        assert!(matches!(gate.peek(), Some(Ok(()))));
    }

    #[tokio::test]
    async fn test_timeout_reaches_every_waiter() {
        let gate = Gate::spawn(GateKind::Synced, Arc::new(Height(0)), options(100));
        let (a, b) = tokio::join!(gate.wait(), gate.wait());

        for outcome in [a, b] {
            let err = outcome.unwrap_err();
            assert!(matches!(*err, Error::Timeout { gate: GateKind::Synced, .. }));
        }
        let seen = gate.attempts();
        assert!(seen >= 2);

        // Finished gates do not poll again.
        gate.wait().await.unwrap_err();
        assert_eq!(gate.attempts(), seen);
    }

    #[tokio::test]
    async fn test_resolved_gate_never_polls() {
        let failed = Gate::resolved(
            GateKind::Started,
            Err(Arc::new(Error::Exit { code: Some(2) })),
        );
        match failed.peek() {
            Some(Err(e)) => assert!(matches!(*e, Error::Exit { code: Some(2) })),
            other => panic!("expected a decided failure, got {:?}", other),
        }

        let err = failed.clone().await.unwrap_err();
        assert!(matches!(*err, Error::Exit { code: Some(2) }));
        assert_eq!(failed.attempts(), 0);
        assert!(!failed.same_as(&Gate::resolved(GateKind::Started, Ok(()))));
    }

    #[tokio::test]
    async fn test_distinct_gates_are_not_the_same() {
        let source = Arc::new(Height(1));
        let a = Gate::spawn(GateKind::Started, source.clone(), options(1_000));
        let b = Gate::spawn(GateKind::Started, source, options(1_000));
        assert!(!a.same_as(&b));
        assert_eq!(a.kind(), GateKind::Started);
    }
}
