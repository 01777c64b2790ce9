//! Human-handoff gate: a single-slot rendezvous for manual intervention
//!
//! When the crawl hits a state a machine cannot resolve (a login wall or a
//! CAPTCHA challenge), the driver parks on a gate until an operator either
//! signals completion with freshly captured HTML or cancels the run. One
//! gate instance exists per purpose; registering a second wait while one is
//! pending is a caller error, which keeps two overlapping waits from
//! corrupting each other's resolution.

use crate::GateError;
use std::sync::Mutex;
use tokio::sync::oneshot;

type GateResult = Result<String, GateError>;

/// A blocking rendezvous that suspends a crawl until a human resolves it
///
/// There is no timeout: the wait ends only when `signal` or `cancel` is
/// called. After either resolution the slot resets so the gate can be
/// reused for the next source.
#[derive(Debug)]
pub struct HandoffGate {
    purpose: &'static str,
    slot: Mutex<Option<oneshot::Sender<GateResult>>>,
}

impl HandoffGate {
    /// Creates a gate for one purpose (e.g. "login", "captcha")
    pub fn new(purpose: &'static str) -> Self {
        Self {
            purpose,
            slot: Mutex::new(None),
        }
    }

    /// Returns the purpose label this gate was created with
    pub fn purpose(&self) -> &'static str {
        self.purpose
    }

    /// Returns whether a wait is currently parked on this gate
    pub fn is_pending(&self) -> bool {
        self.slot.lock().expect("gate lock poisoned").is_some()
    }

    /// Suspends until a human resolves the handoff
    ///
    /// Resolves with the freshly captured HTML on `signal`, or with the
    /// cancellation error on `cancel`. Fails immediately with
    /// `GateError::AlreadyPending` if another wait is already parked.
    pub async fn wait_for_human(&self) -> GateResult {
        let (tx, rx) = oneshot::channel();

        {
            let mut slot = self.slot.lock().expect("gate lock poisoned");
            if slot.is_some() {
                return Err(GateError::AlreadyPending(self.purpose));
            }
            *slot = Some(tx);
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(GateError::ChannelClosed),
        }
    }

    /// Resolves the pending wait with operator-captured HTML
    pub fn signal(&self, html: String) -> Result<(), GateError> {
        let sender = self
            .slot
            .lock()
            .expect("gate lock poisoned")
            .take()
            .ok_or(GateError::NothingPending(self.purpose))?;

        // A dropped receiver means the waiter went away; the slot is
        // already cleared either way.
        let _ = sender.send(Ok(html));
        Ok(())
    }

    /// Rejects the pending wait, unblocking the crawl with an error
    ///
    /// Used when an operator stops the whole run while a handoff is parked.
    pub fn cancel(&self, reason: impl Into<String>) -> Result<(), GateError> {
        let sender = self
            .slot
            .lock()
            .expect("gate lock poisoned")
            .take()
            .ok_or(GateError::NothingPending(self.purpose))?;

        let _ = sender.send(Err(GateError::Cancelled(reason.into())));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_resolves_wait() {
        let gate = Arc::new(HandoffGate::new("login"));
        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_for_human().await })
        };

        // Let the waiter park before signalling
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(gate.is_pending());
        gate.signal("<html>solved</html>".to_string()).unwrap();

        let html = waiter.await.unwrap().unwrap();
        assert_eq!(html, "<html>solved</html>");
        assert!(!gate.is_pending());
    }

    #[tokio::test]
    async fn test_cancel_rejects_wait() {
        let gate = Arc::new(HandoffGate::new("captcha"));
        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_for_human().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        gate.cancel("run stopped").unwrap();

        match waiter.await.unwrap() {
            Err(GateError::Cancelled(reason)) => assert_eq!(reason, "run stopped"),
            other => panic!("expected Cancelled, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_wait_rejected_while_pending() {
        let gate = Arc::new(HandoffGate::new("login"));
        let first = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_for_human().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        match gate.wait_for_human().await {
            Err(GateError::AlreadyPending(purpose)) => assert_eq!(purpose, "login"),
            other => panic!("expected AlreadyPending, got {:?}", other),
        }

        // First waiter is unaffected
        gate.signal("ok".to_string()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_signal_without_wait_errors() {
        let gate = HandoffGate::new("login");
        assert!(matches!(
            gate.signal("html".to_string()),
            Err(GateError::NothingPending("login"))
        ));
    }

    #[tokio::test]
    async fn test_cancel_without_wait_errors() {
        let gate = HandoffGate::new("captcha");
        assert!(matches!(
            gate.cancel("nope"),
            Err(GateError::NothingPending("captcha"))
        ));
    }

    #[tokio::test]
    async fn test_gate_reusable_after_resolution() {
        let gate = Arc::new(HandoffGate::new("login"));

        for round in 0..2 {
            let waiter = {
                let gate = gate.clone();
                tokio::spawn(async move { gate.wait_for_human().await })
            };
            tokio::time::sleep(Duration::from_millis(10)).await;
            gate.signal(format!("round {}", round)).unwrap();
            assert_eq!(waiter.await.unwrap().unwrap(), format!("round {}", round));
        }
    }
}
