//! Digest runner - one stateless snapshot-and-report run.
//!
//! Sequences probing, request building, summarization, and delivery. Every
//! failure ends up here: it is written to the audit trail, reported to the
//! chat as a best-effort notice, and turned into a non-zero exit code. No
//! retries; the next scheduled run is the retry.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::audit::AuditLog;
use crate::config::Config;
use crate::delivery::{Delivery, DeliveryReport, escape_html};
use crate::error::{DigestError, Result};
use crate::llm::Summarizer;
use crate::probe::{CommandExecutor, Probe, ProbeRunner, standard_probes};
use crate::report::{ReportRequestBuilder, format_report_time};
use crate::snapshot::Snapshot;

/// Stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Collecting,
    RequestingSummary,
    Delivering,
    Done,
    CredentialError,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::CredentialError | RunState::Failed)
    }
}

/// What happened during a run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Every state entered, in order; the last one is terminal
    pub states: Vec<RunState>,
    /// Message of the error that ended the run, if any
    pub error: Option<String>,
    /// Delivery of the report itself, when it was attempted
    pub delivery: Option<DeliveryReport>,
    /// Whether the error notice got through, when one was sent
    pub notice_delivered: Option<bool>,
}

impl RunOutcome {
    fn new() -> Self {
        Self {
            states: vec![RunState::Init],
            error: None,
            delivery: None,
            notice_delivered: None,
        }
    }

    fn enter(&mut self, state: RunState) {
        log::debug!("Run state: {:?} -> {:?}", self.state(), state);
        self.states.push(state);
    }

    pub fn state(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::Init)
    }

    pub fn reached(&self, state: RunState) -> bool {
        self.states.contains(&state)
    }

    pub fn succeeded(&self) -> bool {
        self.state() == RunState::Done
    }

    /// Process exit code: 0 on success, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.succeeded() { 0 } else { 1 }
    }
}

/// Runs one digest
pub struct DigestRunner<E, D>
where
    E: CommandExecutor,
    D: Delivery,
{
    config: Config,
    executor: Arc<E>,
    delivery: Arc<D>,
    audit: AuditLog,
    probes: Vec<Probe>,
}

impl<E, D> DigestRunner<E, D>
where
    E: CommandExecutor,
    D: Delivery,
{
    pub fn new(config: &Config, executor: Arc<E>, delivery: Arc<D>) -> Self {
        Self {
            config: config.clone(),
            executor,
            delivery,
            audit: AuditLog::new(&config.audit.path),
            probes: standard_probes(&config.probes),
        }
    }

    /// Replace the audit log
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// Replace the probe battery
    pub fn with_probes(mut self, probes: Vec<Probe>) -> Self {
        self.probes = probes;
        self
    }

    /// Run now; `connect` builds the summarizer from the loaded API key
    pub async fn run<S, F>(&self, connect: F) -> RunOutcome
    where
        S: Summarizer,
        F: FnOnce(String) -> Result<S>,
    {
        self.run_at(Utc::now(), connect).await
    }

    /// Run with an explicit report time
    pub async fn run_at<S, F>(&self, now: DateTime<Utc>, connect: F) -> RunOutcome
    where
        S: Summarizer,
        F: FnOnce(String) -> Result<S>,
    {
        let mut outcome = RunOutcome::new();
        self.audit.record("digest started");

        let api_key = match self.config.summarizer.load_api_key() {
            Ok(key) => key,
            Err(e) => {
                self.audit.record(&format!("ERROR loading API key: {}", e));
                outcome.enter(RunState::CredentialError);
                outcome.error = Some(e.to_string());
                let notice = format!("🔴 <b>digest error</b>: {}", escape_html(&e.to_string()));
                outcome.notice_delivered = Some(self.delivery.notify(&notice).await);
                return outcome;
            }
        };

        let result = match connect(api_key) {
            Ok(summarizer) => self.execute(&summarizer, now, &mut outcome).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => outcome.enter(RunState::Done),
            Err(e) => {
                self.audit.record(&format!("ERROR: {}", e));
                outcome.enter(RunState::Failed);
                outcome.error = Some(e.to_string());
                let notice = format!(
                    "🔴 <b>digest script error</b>: <code>{}</code>",
                    escape_html(&e.to_string())
                );
                outcome.notice_delivered = Some(self.delivery.notify(&notice).await);
            }
        }
        outcome
    }

    async fn execute<S>(&self, summarizer: &S, now: DateTime<Utc>, outcome: &mut RunOutcome) -> Result<()>
    where
        S: Summarizer,
    {
        outcome.enter(RunState::Collecting);
        let snapshot = self.collect().await;
        let builder = ReportRequestBuilder::new(&self.config.report, &self.config.probes.service_container)?;
        let request = builder.build(&snapshot, now)?;
        log::debug!(
            "Report request: {} chars, template {}",
            request.chars().count(),
            builder.version()
        );
        self.audit
            .record(&format!("data collected, calling {}", summarizer.model()));

        outcome.enter(RunState::RequestingSummary);
        let report = summarizer.summarize(&request).await?;
        self.audit.record("response received, sending to Telegram");

        outcome.enter(RunState::Delivering);
        let text = format!(
            "📊 <b>Hourly digest</b> — {} UTC\n\n{}",
            format_report_time(now),
            report
        );
        let delivery = self.delivery.send_text(&text).await;
        for reason in &delivery.rejected {
            self.audit.record(&format!("TG error: {}", reason));
        }
        outcome.delivery = Some(delivery.clone());

        if delivery.nothing_delivered() {
            return Err(DigestError::Delivery(format!(
                "none of {} chunks delivered",
                delivery.chunks
            )));
        }
        if delivery.is_complete() {
            self.audit.record("digest sent OK");
        } else {
            self.audit.record(&format!(
                "digest sent with {} of {} chunks rejected",
                delivery.rejected.len(),
                delivery.chunks
            ));
        }
        Ok(())
    }

    /// Run the probe battery and assemble the snapshot
    pub async fn collect(&self) -> Snapshot {
        let runner = ProbeRunner::new(self.executor.clone(), self.config.probes.timeout())
            .concurrent(self.config.probes.concurrent);
        log::debug!(
            "Collecting {} probes, ceiling {}s",
            self.probes.len(),
            runner.ceiling(&self.probes).as_secs()
        );
        Snapshot::assemble(runner.run_all(&self.probes).await)
    }
}
