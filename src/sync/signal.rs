use tokio::sync::mpsc;

use super::error::SyncError;
use super::pending::Contribution;

#[derive(Debug)]
pub struct ChainReport {
    pub chain: &'static str,
    pub contribution: Contribution,
}

/// Handed to exactly one chain; consumed when the chain reaches its terminal step.
#[derive(Debug)]
pub struct CompletionSignal {
    chain: &'static str,
    tx: mpsc::UnboundedSender<ChainReport>,
}

impl CompletionSignal {
    pub fn complete(self, contribution: Contribution) {
        // receiver gone means the run was already abandoned
        let _ = self.tx.send(ChainReport { chain: self.chain, contribution });
    }
}

/// Hands out one [`CompletionSignal`] per chain until sealed.
pub struct CompletionLatch {
    tx: mpsc::UnboundedSender<ChainReport>,
    rx: mpsc::UnboundedReceiver<ChainReport>,
}

impl CompletionLatch {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn signal(&self, chain: &'static str) -> CompletionSignal {
        CompletionSignal { chain, tx: self.tx.clone() }
    }

    /// Stop handing out signals; the channel closes once every signal is gone.
    pub fn seal(self) -> SealedLatch {
        SealedLatch { rx: self.rx, received: 0 }
    }
}

/// Fan-in side: counts completion signals until the expected number arrived.
pub struct SealedLatch {
    rx: mpsc::UnboundedReceiver<ChainReport>,
    received: usize,
}

impl SealedLatch {
    pub fn received(&self) -> usize { self.received }

    /// Wait for `expected` signals, handing each report to `on_report` as it arrives.
    pub async fn wait<F>(&mut self, expected: usize, mut on_report: F) -> Result<(), SyncError>
    where
        F: FnMut(ChainReport),
    {
        while self.received < expected {
            match self.rx.recv().await {
                Some(report) => {
                    self.received += 1;
                    on_report(report);
                }
                None => return Err(SyncError::ChainsIncomplete { expected, received: self.received }),
            }
        }
        Ok(())
    }

    /// Hand over signals delivered beyond what was waited for; returns how many there were.
    pub fn drain_surplus<F>(&mut self, mut on_report: F) -> usize
    where
        F: FnMut(ChainReport),
    {
        let mut surplus = 0;
        while let Ok(report) = self.rx.try_recv() {
            surplus += 1;
            on_report(report);
        }
        surplus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn waits_for_each_signal_once() {
        let latch = CompletionLatch::new();
        let a = latch.signal("a");
        let b = latch.signal("b");
        let mut latch = latch.seal();

        tokio::spawn(async move { a.complete(Contribution::nothing()) });
        tokio::spawn(async move { b.complete(Contribution::nothing()) });

        let mut seen = Vec::new();
        latch.wait(2, |r| seen.push(r.chain)).await.unwrap();
        seen.sort();
        assert_eq!(seen, vec!["a", "b"]);
        assert_eq!(latch.drain_surplus(|_| {}), 0);
    }

    #[tokio::test]
    async fn dropped_signal_closes_instead_of_hanging() {
        let latch = CompletionLatch::new();
        let a = latch.signal("a");
        let b = latch.signal("b");
        let mut latch = latch.seal();

        a.complete(Contribution::nothing());
        drop(b);

        let err = latch.wait(2, |_| {}).await.unwrap_err();
        assert_eq!(err, SyncError::ChainsIncomplete { expected: 2, received: 1 });
    }

    #[tokio::test]
    async fn surplus_signals_are_counted() {
        let latch = CompletionLatch::new();
        for chain in ["a", "b", "c"] {
            latch.signal(chain).complete(Contribution::nothing());
        }
        let mut latch = latch.seal();
        latch.wait(2, |_| {}).await.unwrap();
        let mut late = Vec::new();
        assert_eq!(latch.drain_surplus(|r| late.push(r.chain)), 1);
        assert_eq!(late, vec!["c"]);
    }
}
