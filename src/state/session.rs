/// Session state for a single crawl
///
/// A `CrawlSession` is owned by the orchestrator for its whole lifetime and
/// is the only place per-session counters live.
use crate::rules::Finding;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Lifecycle of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// Admitted but not yet crawling
    Pending,

    /// Pages are being dispatched
    Running,

    /// Frontier drained or budget reached; results are final
    Completed,

    /// Finalization hit a session fault
    Failed,
}

impl SessionStatus {
    /// Returns true once no further transitions are allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Findings recorded for one crawled page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageIssues {
    pub url: String,
    pub issues: Vec<Finding>,
}

/// One crawl of one site for one account
#[derive(Debug, Clone)]
pub struct CrawlSession {
    pub id: Uuid,
    pub user_id: String,
    /// Normalized root URL
    pub root_url: String,
    /// Apex domain every crawled URL must share
    pub scope_domain: String,
    pub status: SessionStatus,
    pub page_budget: u32,
    pub depth_budget: Option<u32>,
    pub visited: u32,
    pub queued: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Crawled URLs in completion order
    pub crawled_urls: Vec<String>,
    /// Pages with at least one failing or indeterminate finding
    pub page_issues: Vec<PageIssues>,
}

impl CrawlSession {
    pub fn new(
        user_id: impl Into<String>,
        root_url: impl Into<String>,
        scope_domain: impl Into<String>,
        page_budget: u32,
        depth_budget: Option<u32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            root_url: root_url.into(),
            scope_domain: scope_domain.into(),
            status: SessionStatus::Pending,
            page_budget,
            depth_budget,
            visited: 0,
            queued: 0,
            started_at: None,
            completed_at: None,
            crawled_urls: Vec::new(),
            page_issues: Vec::new(),
        }
    }

    /// Moves the session to `Running` and stamps the start time
    pub fn start(&mut self) {
        if self.transition(SessionStatus::Running) {
            self.started_at = Some(Utc::now());
        }
    }

    /// Records a finished page, successful or not
    pub fn record_page(&mut self, url: &str, issues: Vec<Finding>) {
        self.visited += 1;
        self.crawled_urls.push(url.to_string());
        if !issues.is_empty() {
            self.page_issues.push(PageIssues {
                url: url.to_string(),
                issues,
            });
        }
    }

    /// Number of pages that produced at least one issue
    pub fn issues_found(&self) -> u32 {
        self.page_issues.len() as u32
    }

    pub fn budget_reached(&self) -> bool {
        self.visited >= self.page_budget
    }

    pub fn complete(&mut self) {
        if self.transition(SessionStatus::Completed) {
            self.completed_at = Some(Utc::now());
        }
    }

    pub fn fail(&mut self) {
        if self.transition(SessionStatus::Failed) {
            self.completed_at = Some(Utc::now());
        }
    }

    fn transition(&mut self, next: SessionStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            tracing::debug!(
                "Ignoring session transition {} -> {} for {}",
                self.status,
                next,
                self.id
            );
            false
        }
    }
}
