//! Test doubles shared by worker, refresh, and driver tests

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use elective_client::{
    Credential, ElectiveApi, OccupancyReport, ProbeError, SubmitError, SubmitReceipt, Target,
};

use crate::credential::{CredentialProvider, ProviderError};
use crate::events::{Event, EventSink};

pub(crate) fn target(course: &str) -> Target {
    Target {
        course_code: course.into(),
        teacher_code: "1001".into(),
        class_type: "XGKC".into(),
    }
}

pub(crate) fn report(capacity: u32, selected: u32, id: &str) -> OccupancyReport {
    OccupancyReport {
        capacity,
        selected,
        class_instance_id: id.into(),
        secret_token: format!("sv-{id}"),
    }
}

pub(crate) fn receipt() -> SubmitReceipt {
    SubmitReceipt {
        status: 200,
        body: r#"{"code":200,"msg":"OK"}"#.into(),
    }
}

/// Scripted `ElectiveApi`: per-target queues of canned probe and submit
/// results, consumed in order. A target with an exhausted probe queue
/// resolves to an empty listing; an unscripted submit is rejected, so a
/// policy violation (submitting a full report) surfaces as a test failure
/// rather than a silent success.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    probes: Mutex<HashMap<String, VecDeque<Result<Vec<OccupancyReport>, ProbeError>>>>,
    submits: Mutex<HashMap<String, VecDeque<Result<SubmitReceipt, SubmitError>>>>,
    probe_calls: AtomicUsize,
    submit_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_probe(&self, target: &Target, result: Result<Vec<OccupancyReport>, ProbeError>) {
        self.probes
            .lock()
            .unwrap()
            .entry(target.label())
            .or_default()
            .push_back(result);
    }

    pub fn script_submit(&self, target: &Target, result: Result<SubmitReceipt, SubmitError>) {
        self.submits
            .lock()
            .unwrap()
            .entry(target.label())
            .or_default()
            .push_back(result);
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }
}

impl ElectiveApi for ScriptedApi {
    fn probe<'a>(
        &'a self,
        target: &'a Target,
        _credential: &'a Credential,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<OccupancyReport>, ProbeError>> + Send + 'a>> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .probes
            .lock()
            .unwrap()
            .get_mut(&target.label())
            .and_then(|queue| queue.pop_front());
        Box::pin(async move { next.unwrap_or_else(|| Ok(Vec::new())) })
    }

    fn submit<'a>(
        &'a self,
        target: &'a Target,
        _report: &'a OccupancyReport,
        _credential: &'a Credential,
    ) -> Pin<Box<dyn Future<Output = Result<SubmitReceipt, SubmitError>> + Send + 'a>> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .submits
            .lock()
            .unwrap()
            .get_mut(&target.label())
            .and_then(|queue| queue.pop_front());
        Box::pin(async move {
            next.unwrap_or_else(|| {
                Err(SubmitError::Rejected {
                    status: 409,
                    body: "unscripted submit".into(),
                })
            })
        })
    }
}

/// Counting `CredentialProvider` with scriptable failure behavior. Minted
/// tokens are `tok-<call-number>` so tests can tell refreshes apart.
pub(crate) struct CountingProvider {
    calls: AtomicUsize,
    fail_first: usize,
    fail_forever: bool,
}

impl CountingProvider {
    pub fn succeeding() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_first: 0,
            fail_forever: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_first: 0,
            fail_forever: true,
        }
    }

    pub fn failing_then_succeeding(failures: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_first: failures,
            fail_forever: false,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialProvider for CountingProvider {
    fn obtain(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Credential, ProviderError>> + Send + '_>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = self.fail_forever || call <= self.fail_first;
        Box::pin(async move {
            if fail {
                Err(ProviderError::LoginFailed(format!(
                    "scripted failure on call {call}"
                )))
            } else {
                Ok(Credential::new(format!("tok-{call}")))
            }
        })
    }
}

/// Sink that records every emitted event for later assertions.
#[derive(Default)]
pub(crate) struct CollectingSink {
    events: Mutex<Vec<Event>>,
}

impl EventSink for CollectingSink {
    fn emit(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl CollectingSink {
    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}
