//! Crawl orchestration
//!
//! The [`Orchestrator`] drives one session's crawl loop: it dequeues frontier
//! entries, keeps up to `concurrency` pages in flight, folds finished pages
//! back into the session and frontier, and stops at the page budget.
//!
//! The [`SessionRunner`] wraps a crawl with admission, the crawl log, usage
//! finalization, the terminal event and the optional performance audit.

use crate::audit::PageSpeedClient;
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::processor::{PageProcessor, PageResult};
use crate::quota::{HeldAdmission, QuotaGuard};
use crate::state::CrawlSession;
use crate::storage::{with_store, CrawlLogRecord, SharedStore};
use crate::stream::{Event, EventSender};
use crate::url::{ensure_valid_url, normalize_url, url_root_domain};
use crate::CrawlerError;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs the crawl loop for one session
pub struct Orchestrator {
    processor: PageProcessor,
    concurrency: usize,
    events: EventSender,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `processor` - Page processor shared by all in-flight pages
    /// * `concurrency` - Maximum pages in flight (at least 1)
    /// * `events` - Subscriber stream
    /// * `cancel` - External cancellation (disconnect, shutdown)
    pub fn new(
        processor: PageProcessor,
        concurrency: usize,
        events: EventSender,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            processor,
            concurrency: concurrency.max(1),
            events,
            cancel,
        }
    }

    /// Crawls until the frontier is empty, the budget is spent or the
    /// session is cancelled
    ///
    /// Page faults are reported as `error` events and never end the crawl.
    /// Cancellation stops new dispatches; pages already in flight finish.
    pub async fn crawl(&self, session: &mut CrawlSession) -> Result<(), CrawlerError> {
        session.start();

        let mut frontier = Frontier::new(session.scope_domain.clone(), session.depth_budget);
        if !frontier.seed(&session.root_url).is_queued() {
            return Err(CrawlerError::Session(format!(
                "Root URL {} cannot be crawled",
                session.root_url
            )));
        }
        session.queued = 1;

        // Budget exhaustion cancels only this child; external cancellation
        // reaches it through the parent
        let admitting = self.cancel.child_token();
        let mut in_flight = FuturesUnordered::new();
        let mut dispatched: u32 = 0;

        tracing::info!(
            "Starting crawl {} of {} (budget {} pages, width {})",
            session.id,
            session.root_url,
            session.page_budget,
            self.concurrency
        );

        loop {
            while !admitting.is_cancelled()
                && in_flight.len() < self.concurrency
                && Frontier::has_capacity(dispatched, session.page_budget)
            {
                let Some(entry) = frontier.dequeue() else {
                    break;
                };
                dispatched += 1;
                tracing::debug!("Dispatching {} (depth {})", entry.url, entry.depth);

                let processor = self.processor.clone();
                in_flight.push(async move {
                    let outcome = processor.process(&entry).await;
                    (entry, outcome)
                });
            }

            let Some((entry, outcome)) = in_flight.next().await else {
                break;
            };

            let result = match outcome {
                Ok(result) => result,
                Err(fault) => {
                    tracing::warn!("Failed to crawl {}: {}", entry.url, fault);
                    self.events.send(Event::page_error(&entry.url, fault.to_string()));
                    PageResult::empty(&entry.url)
                }
            };

            self.absorb(session, &mut frontier, &entry, result);

            if session.budget_reached() && !admitting.is_cancelled() {
                admitting.cancel();
                if !frontier.is_empty() {
                    tracing::info!(
                        "Limit of {} pages reached with {} URLs pending",
                        session.page_budget,
                        frontier.len()
                    );
                    self.events
                        .send(Event::limit_reached(session.page_budget, session.visited));
                }
            }
        }

        if self.cancel.is_cancelled() {
            tracing::info!(
                "Crawl {} cancelled after {} pages",
                session.id,
                session.visited
            );
        }

        Ok(())
    }

    /// Folds one finished page into the session and frontier
    fn absorb(
        &self,
        session: &mut CrawlSession,
        frontier: &mut Frontier,
        entry: &FrontierEntry,
        result: PageResult,
    ) {
        let PageResult {
            url,
            features,
            check_results,
            findings,
            links,
        } = result;

        session.record_page(&url, findings.clone());

        if !findings.is_empty() {
            self.events
                .send(Event::issue(&url, findings, features.clone()));
        }
        if !check_results.is_empty() {
            self.events.send(Event::progress(features, check_results));
        }

        for link in &links {
            if frontier
                .enqueue(link, entry.depth + 1, Some(&entry.url))
                .is_queued()
            {
                session.queued += 1;
            }
        }
    }
}

/// Everything a session needs besides its own request
pub struct SessionRunner {
    guard: Arc<QuotaGuard>,
    store: SharedStore,
    processor: PageProcessor,
    concurrency: usize,
    default_max_depth: Option<u32>,
    audit: Option<PageSpeedClient>,
}

impl SessionRunner {
    pub fn new(
        guard: Arc<QuotaGuard>,
        store: SharedStore,
        processor: PageProcessor,
        concurrency: usize,
    ) -> Self {
        Self {
            guard,
            store,
            processor,
            concurrency,
            default_max_depth: None,
            audit: None,
        }
    }

    /// Depth bound for plans that do not set one
    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.default_max_depth = max_depth;
        self
    }

    pub fn with_audit(mut self, audit: Option<PageSpeedClient>) -> Self {
        self.audit = audit;
        self
    }

    /// Runs one crawl request end to end
    ///
    /// Exactly one terminal event is emitted: `done` when the crawl
    /// completes, otherwise a session-level `error`. Returns the finished
    /// session, or `None` when the request was rejected before admission
    /// completed.
    pub async fn run(
        &self,
        user_id: &str,
        start_url: &str,
        events: EventSender,
        cancel: CancellationToken,
    ) -> Option<CrawlSession> {
        let (root_url, scope_domain) = match resolve_root(start_url) {
            Ok(root) => root,
            Err(e) => {
                tracing::debug!("Rejected start URL {}: {}", start_url, e);
                events.send(Event::session_error(e.to_string()));
                return None;
            }
        };

        let admission = match self.guard.admit(user_id, Utc::now()).await {
            Ok(admission) => admission,
            Err(e) => {
                tracing::info!("Crawl for user {} not admitted: {}", user_id, e);
                events.send(Event::session_error(e.to_string()));
                return None;
            }
        };

        let mut session = CrawlSession::new(
            user_id,
            root_url,
            scope_domain,
            admission.limits.per_website_page_limit,
            admission.limits.max_depth.or(self.default_max_depth),
        );
        let held = HeldAdmission::new(&self.guard, admission);

        let orchestrator = Orchestrator::new(
            self.processor.clone(),
            self.concurrency,
            events.clone(),
            cancel,
        );

        let crawl = AssertUnwindSafe(orchestrator.crawl(&mut session))
            .catch_unwind()
            .await;
        let fault = match crawl {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some("Crawl task panicked".to_string()),
        };

        let fault = self.finish(&mut session, held, fault);

        match fault {
            None => {
                tracing::info!(
                    "Crawl {} completed: {} pages, {} with issues",
                    session.id,
                    session.visited,
                    session.issues_found()
                );
                events.send(Event::done(session.visited, session.page_issues.clone()));
            }
            Some(message) => {
                tracing::error!("Crawl {} failed: {}", session.id, message);
                events.send(Event::session_error(message));
            }
        }

        if let Some(audit) = &self.audit {
            if let Err(e) = audit.record(&self.store, user_id, &session.root_url).await {
                tracing::warn!("Failed to fetch performance audit: {}", e);
            }
        }

        Some(session)
    }

    /// Persists the crawl log and finalizes usage; returns the first fault
    fn finish(
        &self,
        session: &mut CrawlSession,
        held: HeldAdmission<'_>,
        crawl_fault: Option<String>,
    ) -> Option<String> {
        let log = CrawlLogRecord {
            user_id: session.user_id.clone(),
            start_url: session.root_url.clone(),
            crawled_at: Utc::now(),
            pages_crawled: session.visited,
            issues_found: session.issues_found(),
            urls: session.crawled_urls.clone(),
        };
        let logged = with_store(&self.store, |s| s.append_crawl_log(&log));
        let finalized = held.finalize(session.visited);

        let fault = crawl_fault
            .or_else(|| logged.err().map(|e| format!("Failed to save crawl log: {}", e)))
            .or_else(|| finalized.err().map(|e| format!("Failed to update crawl usage: {}", e)));

        if fault.is_some() {
            session.fail();
        } else {
            session.complete();
        }
        fault
    }
}

/// Normalizes a requested start URL and derives its scope domain
fn resolve_root(start_url: &str) -> Result<(String, String), CrawlerError> {
    let parsed = ensure_valid_url(start_url)?;
    let scope = url_root_domain(&parsed).ok_or(crate::UrlError::MissingDomain)?;
    let root = normalize_url(parsed.as_str())?;
    Ok((root, scope))
}
