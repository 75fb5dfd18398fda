//! One live call: transcript intake, turn pacing and generation dispatch.
//!
//! All mutable state sits behind one [`std::sync::Mutex`] that is never held
//! across an `.await`. Timer tasks, generation tasks and inbound calls only
//! touch it through the methods below. The generation gate is acquired and
//! released while that lock is held, so any code that observes a settled
//! state also observes a free gate.
//!
//! Observer callbacks run under the lock to keep notifications in the same
//! order as the transitions they describe. An observer must not call back
//! into its session.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use super::context::AskedQuestions;
use super::filler::is_filler;
use super::gate::{GatePermit, GenerationGate, PendingQueue, append_fragment};
use super::generator::{Exchange, GenerationRequest, Generator};
use super::observer::{Notifier, SessionObserver};
use super::state::{ConversationState, FragmentAction};
use super::transcript::{RollingTranscript, TranscriptEntry};
use super::turn::{Probe, TurnDetector, spawn_silence_timer};
use crate::config::PacingConfig;
use crate::error::{CopilotError, Result};
use crate::llm::error::LlmError;
use crate::models::{CompletionStatus, JobSummary, SuggestedQuestion};

const NO_QUESTION_REPLY: &str = "(no question suggested)";

/// A generation that owns the gate and is ready to run.
struct Dispatch {
    permit: GatePermit,
    request: GenerationRequest,
    epoch: u64,
}

struct Inner {
    state: ConversationState,
    transcript: RollingTranscript,
    asked: AskedQuestions,
    pending: PendingQueue,
    /// The queued speech answers the question on screen.
    pending_answer: bool,
    last_speaker: Option<String>,
    turn: TurnDetector,
    /// Bumped by every reset; results tagged with an older epoch are dropped.
    epoch: u64,
    history: VecDeque<Exchange>,
    last_question: Option<SuggestedQuestion>,
    gate: GenerationGate,
}

/// Orchestrates one conversation.
pub struct Session {
    id: Uuid,
    pacing: PacingConfig,
    generator: Arc<dyn Generator>,
    notifier: Notifier,
    inner: Mutex<Inner>,
    this: Weak<Session>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        pacing: PacingConfig,
        generator: Arc<dyn Generator>,
        observer: Arc<dyn SessionObserver>,
    ) -> Arc<Self> {
        let threshold = pacing.silence_threshold();
        Arc::new_cyclic(|this| Self {
            id: Uuid::new_v4(),
            pacing,
            generator,
            notifier: Notifier::new(observer),
            inner: Mutex::new(Inner {
                state: ConversationState::Listening,
                transcript: RollingTranscript::new(),
                asked: AskedQuestions::new(),
                pending: PendingQueue::new(),
                pending_answer: false,
                last_speaker: None,
                turn: TurnDetector::new(threshold),
                epoch: 0,
                history: VecDeque::new(),
                last_question: None,
                gate: GenerationGate::new(),
            }),
            this: this.clone(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Inbound ───────────────────────────────────────────────

    /// Feed one speech-to-text fragment.
    ///
    /// Final fragments are always recorded. Only non-filler fragments from
    /// the driving party affect pacing; interim ones just push the silence
    /// deadline out.
    pub fn handle_transcript(&self, text: &str, speaker: Option<&str>, is_final: bool) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let driving = self.pacing.is_driving(speaker);
        let mut inner = self.lock();

        if !is_final {
            if driving && !is_filler(text) {
                inner.turn.record_activity(Instant::now());
            }
            return;
        }

        inner.transcript.record(text, speaker);
        inner.last_speaker = speaker.map(str::to_string);

        if !driving {
            tracing::trace!(session = %self.id, ?speaker, "observer speech recorded");
            return;
        }
        if is_filler(text) {
            tracing::debug!(session = %self.id, text, "filler ignored");
            return;
        }

        match inner.state.on_fragment() {
            FragmentAction::QueueAndDebounce => {
                inner.pending.push(text, speaker);
                inner.turn.record_activity(Instant::now());
                let threshold = inner.turn.threshold();
                self.arm_timer(&mut inner, threshold);
            }
            FragmentAction::Queue => {
                inner.pending.push(text, speaker);
                tracing::debug!(
                    session = %self.id,
                    queued = inner.pending.len(),
                    "generation in flight, fragment queued"
                );
            }
            FragmentAction::DispatchAnswer => {
                inner.turn.cancel();
                let mut answer = inner.pending.drain_merged().unwrap_or_default();
                append_fragment(&mut answer, text);
                if let Some(dispatch) = self.dispatch_locked(&mut inner, answer, true) {
                    self.spawn_drive(dispatch);
                }
            }
        }
    }

    /// Generate now, bypassing turn detection but not the gate.
    ///
    /// Uses the queued speech, else the latest driving-party entry. While a
    /// suggestion is generating with nothing queued there is nothing new to
    /// send, so the call is a no-op.
    ///
    /// # Errors
    ///
    /// [`CopilotError::NothingToGenerate`] when neither exists.
    pub fn generate_now(&self) -> Result<()> {
        let mut inner = self.lock();
        inner.turn.cancel();

        let text = match inner.pending.drain_merged() {
            Some(text) => text,
            None if inner.state.is_busy() => {
                tracing::debug!(
                    session = %self.id,
                    state = %inner.state,
                    "manual generation skipped, already in flight"
                );
                return Ok(());
            }
            None => inner
                .transcript
                .last_matching(|s| self.pacing.is_driving(s))
                .map(|e| e.text.clone())
                .ok_or(CopilotError::NothingToGenerate)?,
        };

        tracing::info!(session = %self.id, state = %inner.state, "manual generation requested");
        let is_answer = inner.state == ConversationState::QuestionShown;
        if let Some(dispatch) = self.dispatch_locked(&mut inner, text, is_answer) {
            self.spawn_drive(dispatch);
        }
        Ok(())
    }

    /// Client confirmation that the last suggestion is on screen.
    ///
    /// Only corrects a session that settled back to listening without
    /// anything new to process.
    pub fn notify_question_shown(&self) {
        let mut inner = self.lock();
        if inner.state == ConversationState::Listening
            && inner.last_question.is_some()
            && inner.pending.is_empty()
        {
            self.transition(&mut inner, ConversationState::QuestionShown);
        } else {
            tracing::debug!(session = %self.id, state = %inner.state, "question_shown ignored");
        }
    }

    /// Summarize the whole call.
    ///
    /// Waits for any in-flight suggestion, then sends the full transcript.
    /// The wait and the call together are bounded by the summary timeout.
    ///
    /// # Errors
    ///
    /// [`CopilotError::SummaryUnavailable`] on timeout, upstream failure, a
    /// missing summary, or a reset during the call.
    pub async fn generate_summary(&self) -> Result<JobSummary> {
        let timeout = self.pacing.summary_timeout();
        let work = async {
            let (permit, epoch) = loop {
                let (gate, epoch) = {
                    let inner = self.lock();
                    (inner.gate.clone(), inner.epoch)
                };
                if let Some(permit) = gate.enter().await {
                    break (permit, epoch);
                }
            };
            let transcript = self.lock().transcript.render_full();
            tracing::info!(session = %self.id, chars = transcript.len(), "generating summary");
            let result = self.generator.summarize(&transcript).await;
            (permit, epoch, result)
        };

        let outcome = if timeout.is_zero() {
            None
        } else {
            tokio::time::timeout(timeout, work).await.ok()
        };

        let mut inner = self.lock();
        let result = match outcome {
            None => Err(CopilotError::SummaryUnavailable(format!(
                "timed out after {}ms",
                timeout.as_millis()
            ))),
            Some((permit, epoch, result)) => {
                drop(permit);
                if epoch != inner.epoch {
                    Err(CopilotError::SummaryUnavailable("session was reset".into()))
                } else {
                    match result {
                        Ok(Some(summary)) => {
                            self.notifier.summary(&summary);
                            Ok(summary)
                        }
                        Ok(None) => Err(CopilotError::SummaryUnavailable(
                            "model returned no summary".into(),
                        )),
                        Err(e) => Err(CopilotError::SummaryUnavailable(e.to_string())),
                    }
                }
            }
        };
        if let Err(e) = &result {
            tracing::warn!(session = %self.id, error = %e, "summary failed");
        }

        if let Some(dispatch) = self.resume_locked(&mut inner) {
            self.spawn_drive(dispatch);
        }
        result
    }

    /// Reset every field, cancel the timer and orphan any in-flight call.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.turn.reset();
        inner.gate.retire();
        inner.gate = GenerationGate::new();
        inner.epoch += 1;
        inner.transcript.clear();
        inner.asked.clear();
        let dropped = inner.pending.clear();
        inner.pending_answer = false;
        inner.history.clear();
        inner.last_question = None;
        inner.last_speaker = None;
        tracing::info!(session = %self.id, epoch = inner.epoch, dropped, "session cleared");
        self.transition(&mut inner, ConversationState::Listening);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ConversationState {
        self.lock().state
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.lock().transcript.entries().to_vec()
    }

    pub fn asked_questions(&self) -> Vec<String> {
        self.lock().asked.texts().to_vec()
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn last_speaker(&self) -> Option<String> {
        self.lock().last_speaker.clone()
    }

    pub fn last_question(&self) -> Option<SuggestedQuestion> {
        self.lock().last_question.clone()
    }

    pub fn completion_status(&self) -> CompletionStatus {
        let inner = self.lock();
        CompletionStatus::from_categories(
            inner.asked.categories(),
            inner.transcript.len(),
            inner.state,
        )
    }

    // ── Internals ─────────────────────────────────────────────

    fn transition(&self, inner: &mut Inner, next: ConversationState) {
        if inner.state == next {
            return;
        }
        tracing::debug!(session = %self.id, from = %inner.state, to = %next, "state change");
        inner.state = next;
        self.notifier.state(next);
    }

    fn arm_timer(&self, inner: &mut Inner, after: Duration) {
        let epoch = inner.epoch;
        let probe_session = self.this.clone();
        let fire_session = self.this.clone();
        let timer = spawn_silence_timer(
            after,
            move || match probe_session.upgrade() {
                Some(session) => session.probe_silence(epoch),
                None => Probe::Abandon,
            },
            move || {
                if let Some(session) = fire_session.upgrade() {
                    session.on_silence(epoch);
                }
            },
        );
        inner.turn.arm(timer);
    }

    fn probe_silence(&self, epoch: u64) -> Probe {
        let inner = self.lock();
        if inner.epoch != epoch || inner.state != ConversationState::Listening {
            return Probe::Abandon;
        }
        inner.turn.probe(Instant::now())
    }

    fn on_silence(&self, epoch: u64) {
        let mut inner = self.lock();
        if inner.epoch != epoch || inner.state != ConversationState::Listening {
            return;
        }
        // Speech may have landed after the timer's probe released the lock.
        match inner.turn.probe(Instant::now()) {
            Probe::Fire => {}
            Probe::Wait(remaining) => {
                tracing::trace!(session = %self.id, ?remaining, "speech resumed before firing");
                self.arm_timer(&mut inner, remaining);
                return;
            }
            Probe::Abandon => return,
        }
        let Some(text) = inner.pending.drain_merged() else {
            return;
        };
        if is_filler(&text) {
            tracing::debug!(session = %self.id, "turn was filler only, dropped");
            return;
        }
        tracing::info!(session = %self.id, chars = text.len(), "turn complete");
        if let Some(dispatch) = self.dispatch_locked(&mut inner, text, false) {
            self.spawn_drive(dispatch);
        }
    }

    /// Take the gate for `text`, or queue it when the gate is taken.
    fn dispatch_locked(&self, inner: &mut Inner, text: String, is_answer: bool) -> Option<Dispatch> {
        let Some(permit) = inner.gate.try_enter() else {
            tracing::debug!(session = %self.id, is_answer, "gate busy, text queued");
            inner.pending.push(&text, None);
            inner.pending_answer |= is_answer;
            return None;
        };
        inner.pending_answer = false;

        if is_answer {
            self.transition(inner, ConversationState::ProcessingAnswer);
        }
        self.transition(inner, ConversationState::Generating);

        let request = GenerationRequest {
            transcript_window: inner.transcript.window(self.pacing.transcript_window),
            asked: inner.asked.texts().to_vec(),
            new_text: text,
            is_answer,
            history: inner.history.iter().cloned().collect(),
            driving_label: self.pacing.driving_label.clone(),
        };
        Some(Dispatch {
            permit,
            request,
            epoch: inner.epoch,
        })
    }

    /// After the gate is released: merge and dispatch anything queued.
    ///
    /// Speech queued as an answer while a summary held the gate is still
    /// sent as an answer.
    fn resume_locked(&self, inner: &mut Inner) -> Option<Dispatch> {
        let is_answer = match inner.state {
            ConversationState::Listening => false,
            ConversationState::QuestionShown if inner.pending_answer => true,
            _ => return None,
        };
        let text = inner.pending.drain_merged()?;
        if is_filler(&text) {
            inner.pending_answer = false;
            return None;
        }
        tracing::debug!(session = %self.id, chars = text.len(), is_answer, "dispatching queued speech");
        self.dispatch_locked(inner, text, is_answer)
    }

    fn spawn_drive(&self, dispatch: Dispatch) {
        match self.this.upgrade() {
            Some(session) => {
                tokio::spawn(session.drive(dispatch));
            }
            None => tracing::warn!(session = %self.id, "session dropped before dispatch"),
        }
    }

    /// Run generations until nothing is left queued.
    async fn drive(self: Arc<Self>, mut dispatch: Dispatch) {
        loop {
            let result = self.call_generator(&dispatch.request).await;
            let next = {
                let mut inner = self.lock();
                let Dispatch {
                    permit,
                    request,
                    epoch,
                } = dispatch;
                if epoch != inner.epoch {
                    tracing::debug!(session = %self.id, epoch, "discarding result from before reset");
                    return;
                }
                self.apply_result(&mut inner, &request, result);
                drop(permit);
                self.resume_locked(&mut inner)
            };
            match next {
                Some(more) => dispatch = more,
                None => return,
            }
        }
    }

    async fn call_generator(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<Option<SuggestedQuestion>, LlmError> {
        let timeout = self.pacing.generation_timeout();
        if timeout.is_zero() {
            return Err(timeout_error(timeout));
        }
        tracing::debug!(
            session = %self.id,
            is_answer = request.is_answer,
            asked = request.asked.len(),
            "calling generator"
        );
        match tokio::time::timeout(timeout, self.generator.suggest_question(request)).await {
            Ok(result) => result,
            Err(_) => Err(timeout_error(timeout)),
        }
    }

    fn apply_result(
        &self,
        inner: &mut Inner,
        request: &GenerationRequest,
        result: std::result::Result<Option<SuggestedQuestion>, LlmError>,
    ) {
        let question = match result {
            Ok(question) => {
                let question = question.filter(|q| {
                    let duplicate = inner.asked.contains(&q.question);
                    if duplicate {
                        tracing::info!(session = %self.id, question = %q.question, "duplicate question suppressed");
                    }
                    !duplicate
                });
                self.remember_exchange(inner, request, question.as_ref());
                question
            }
            Err(e) => {
                tracing::warn!(
                    session = %self.id,
                    error = %e,
                    retryable = e.is_retryable(),
                    "generation failed"
                );
                let err = CopilotError::from(e);
                let message = match &err {
                    CopilotError::Llm(llm) => llm.message().to_string(),
                    other => other.to_string(),
                };
                self.notifier.error(err.code(), &message);
                None
            }
        };

        let produced = question.is_some();
        if let Some(question) = question {
            tracing::info!(
                session = %self.id,
                category = %question.category,
                "question suggested"
            );
            inner.asked.remember(&question);
            self.notifier.suggestion(&question);
            inner.last_question = Some(question);
        }
        self.transition(inner, ConversationState::after_generation(produced));
    }

    fn remember_exchange(
        &self,
        inner: &mut Inner,
        request: &GenerationRequest,
        question: Option<&SuggestedQuestion>,
    ) {
        if self.pacing.max_history_exchanges == 0 {
            return;
        }
        inner.history.push_back(Exchange {
            prompt: request.context_message(),
            reply: question.map_or_else(|| NO_QUESTION_REPLY.to_string(), |q| q.question.clone()),
        });
        while inner.history.len() > self.pacing.max_history_exchanges {
            inner.history.pop_front();
        }
    }
}

fn timeout_error(timeout: Duration) -> LlmError {
    LlmError::TimeoutError(format!(
        "generation exceeded {}ms",
        timeout.as_millis()
    ))
}
