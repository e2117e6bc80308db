//! Generic stage driver.
//!
//! A [`StageSequencer`] drives a [`StagedProcess`] through a linear chain of
//! stages: dispatch a stage, wait for it to finish, then advance to the
//! successor or abort. Both synchronous and asynchronous completions re-enter
//! through a single point, [`StageSequencer::stage_finished`], which is the
//! only place that decides whether to continue or to complete.
//!
//! The owner's completion callback fires exactly once per sequencer.

use futures_util::future::LocalBoxFuture;
use jointfab_types::{Outcome, TrustError};
use std::fmt;

/// A closed, linear chain of stages.
pub trait StageChain: Copy + Eq + fmt::Debug + fmt::Display {
    /// The only initial stage.
    const IDLE: Self;
    /// Terminal stage reached when every stage succeeded.
    const COMPLETE: Self;
    /// Pseudo-stage returned by `successor` for anything outside the chain.
    const ERROR: Self;

    /// Total successor function; returns `ERROR` for `COMPLETE` and `ERROR`.
    fn successor(self) -> Self;
}

/// What a stage handler returns when dispatched.
pub enum StageStep<'a> {
    /// The stage finished synchronously with this outcome.
    Ready(Outcome),
    /// The stage started exactly one asynchronous operation; the future
    /// resolves to the stage's terminal outcome.
    Pending(LocalBoxFuture<'a, Outcome>),
}

impl fmt::Debug for StageStep<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(outcome) => f.debug_tuple("Ready").field(outcome).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// A participant driven by a [`StageSequencer`].
pub trait StagedProcess {
    type Stage: StageChain;

    /// Runs the handler for `stage`.
    fn perform_stage(&mut self, stage: Self::Stage) -> StageStep<'_>;
}

/// Owner-supplied completion callback.
pub type CompletionCallback = Box<dyn FnOnce(Result<(), TrustError>)>;

/// Decision taken by [`StageSequencer::stage_finished`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance<S> {
    /// Dispatch this stage next.
    Dispatch(S),
    /// The completion was stale or duplicated and changed nothing.
    Ignored,
    /// The verification is over and the completion callback has fired.
    Done,
}

/// Drives a [`StagedProcess`] from `IDLE` to `COMPLETE` or the first failure.
pub struct StageSequencer<P: StagedProcess> {
    process: P,
    current: P::Stage,
    last_finished: Option<P::Stage>,
    on_completion: Option<CompletionCallback>,
}

impl<P: StagedProcess> StageSequencer<P> {
    pub fn new(process: P, on_completion: CompletionCallback) -> Self {
        Self {
            process,
            current: P::Stage::IDLE,
            last_finished: None,
            on_completion: Some(on_completion),
        }
    }

    /// The stage currently dispatched (or `IDLE` before `start`).
    pub fn current_stage(&self) -> P::Stage {
        self.current
    }

    /// Returns `true` once the completion callback has fired.
    pub fn is_completed(&self) -> bool {
        self.on_completion.is_none()
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    pub fn into_process(self) -> P {
        self.process
    }

    /// Runs the chain to completion.
    ///
    /// Must be called on an idle sequencer. A second call is a programming
    /// error: it is logged and ignored, and no stage runs again.
    pub async fn start(&mut self) {
        if self.current != P::Stage::IDLE || self.is_completed() {
            tracing::error!(
                stage = %self.current,
                "sequencer started twice; ignoring"
            );
            return;
        }

        let mut next = self.current.successor();
        loop {
            let outcome = self.dispatch(next).await;
            match self.stage_finished(next, outcome) {
                Advance::Dispatch(stage) => next = stage,
                Advance::Ignored | Advance::Done => break,
            }
        }

        if !self.is_completed() {
            tracing::error!(stage = %self.current, "sequencer stopped without completing");
            self.complete(Err(TrustError::Internal));
        }
    }

    async fn dispatch(&mut self, stage: P::Stage) -> Outcome {
        self.current = stage;
        if stage == P::Stage::ERROR {
            tracing::error!("stage chain left its defined order");
            return Outcome::InternalError;
        }

        tracing::debug!(%stage, "dispatching stage");
        match self.process.perform_stage(stage) {
            StageStep::Ready(outcome) if !outcome.is_terminal() => {
                tracing::error!(%stage, "stage reported pending without starting an operation");
                Outcome::InternalError
            }
            StageStep::Ready(outcome) => outcome,
            StageStep::Pending(operation) => match operation.await {
                outcome if !outcome.is_terminal() => {
                    tracing::error!(%stage, "asynchronous stage resolved to pending");
                    Outcome::InternalError
                }
                outcome => outcome,
            },
        }
    }

    /// Single re-entry point for synchronous and asynchronous completions.
    ///
    /// A completion for a stage that is not in flight, or a second completion
    /// for the same stage, is ignored.
    pub fn stage_finished(&mut self, stage: P::Stage, outcome: Outcome) -> Advance<P::Stage> {
        if self.is_completed() {
            tracing::error!(%stage, %outcome, "completion after the verification finished; ignoring");
            return Advance::Done;
        }
        if stage != self.current || self.last_finished == Some(stage) {
            tracing::error!(
                %stage,
                current = %self.current,
                %outcome,
                "stale or duplicate stage completion; ignoring"
            );
            return Advance::Ignored;
        }
        self.last_finished = Some(stage);

        if outcome != Outcome::Success {
            tracing::warn!(%stage, %outcome, "stage failed, aborting verification");
            self.complete(outcome.into_result());
            return Advance::Done;
        }

        if stage == P::Stage::COMPLETE {
            self.complete(Ok(()));
            return Advance::Done;
        }

        Advance::Dispatch(stage.successor())
    }

    fn complete(&mut self, result: Result<(), TrustError>) {
        if let Some(on_completion) = self.on_completion.take() {
            on_completion(result);
        }
    }
}
