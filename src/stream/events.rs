//! Outbound event schema
//!
//! Every event serializes to one JSON text frame tagged by `type`.

use crate::crawler::PageFeatures;
use crate::rules::{CheckResults, Finding};
use crate::state::PageIssues;
use serde::Serialize;

/// Message sent to the subscriber
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Progress {
        data: Box<PageFeatures>,
        #[serde(rename = "seoCheckResults")]
        seo_check_results: CheckResults,
    },
    Issue {
        data: IssueData,
    },
    LimitReached {
        message: String,
        #[serde(rename = "totalPages")]
        total_pages: u32,
    },
    /// Page-level errors carry `data`, session-level errors carry `message`
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<PageError>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Done {
        data: DoneData,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueData {
    pub url: String,
    pub issues: Vec<Finding>,
    pub final_data: Box<PageFeatures>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageError {
    pub url: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoneData {
    pub message: String,
    pub total_pages: u32,
    pub issues: Vec<PageIssues>,
}

impl Event {
    pub fn progress(features: PageFeatures, results: CheckResults) -> Self {
        Self::Progress {
            data: Box::new(features),
            seo_check_results: results,
        }
    }

    pub fn issue(url: &str, issues: Vec<Finding>, features: PageFeatures) -> Self {
        Self::Issue {
            data: IssueData {
                url: url.to_string(),
                issues,
                final_data: Box::new(features),
            },
        }
    }

    pub fn limit_reached(page_budget: u32, total_pages: u32) -> Self {
        Self::LimitReached {
            message: format!("Crawl limit of {} pages reached.", page_budget),
            total_pages,
        }
    }

    /// Error scoped to one page; the session continues
    pub fn page_error(url: &str, message: impl Into<String>) -> Self {
        Self::Error {
            data: Some(PageError {
                url: url.to_string(),
                message: message.into(),
            }),
            message: None,
        }
    }

    /// Error that ends or rejects a session
    pub fn session_error(message: impl Into<String>) -> Self {
        Self::Error {
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn done(total_pages: u32, issues: Vec<PageIssues>) -> Self {
        Self::Done {
            data: DoneData {
                message: "Crawl completed.".to_string(),
                total_pages,
                issues,
            },
        }
    }

    /// Progress events are coalesced, everything else is sent at once
    pub fn is_progress(&self) -> bool {
        matches!(self, Self::Progress { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Issue { .. } => "issue",
            Self::LimitReached { .. } => "limit_reached",
            Self::Error { .. } => "error",
            Self::Done { .. } => "done",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_limit_reached_shape() {
        let value = serde_json::to_value(Event::limit_reached(2, 2)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "limit_reached",
                "message": "Crawl limit of 2 pages reached.",
                "totalPages": 2
            })
        );
    }

    #[test]
    fn test_error_shapes() {
        let page = serde_json::to_value(Event::page_error("https://site.test/a", "boom")).unwrap();
        assert_eq!(
            page,
            json!({"type": "error", "data": {"url": "https://site.test/a", "message": "boom"}})
        );

        let session = serde_json::to_value(Event::session_error("User not found")).unwrap();
        assert_eq!(session, json!({"type": "error", "message": "User not found"}));
    }

    #[test]
    fn test_done_shape() {
        let issues = vec![PageIssues {
            url: "https://site.test".to_string(),
            issues: vec![Finding::new("Title Tag", "On-Page SEO Results", Some(false), "Add a title")],
        }];
        let value = serde_json::to_value(Event::done(2, issues)).unwrap();

        assert_eq!(value["type"], "done");
        assert_eq!(value["data"]["message"], "Crawl completed.");
        assert_eq!(value["data"]["totalPages"], 2);
        assert_eq!(value["data"]["issues"][0]["url"], "https://site.test");
        assert_eq!(value["data"]["issues"][0]["issues"][0]["pass"], false);
    }

    #[test]
    fn test_progress_and_issue_shapes() {
        let features = PageFeatures {
            url: "https://site.test".to_string(),
            ..Default::default()
        };
        let progress = serde_json::to_value(Event::progress(features.clone(), CheckResults::new())).unwrap();
        assert_eq!(progress["type"], "progress");
        assert_eq!(progress["data"]["url"], "https://site.test");
        assert!(progress["seoCheckResults"].is_object());

        let issue = serde_json::to_value(Event::issue("https://site.test", Vec::new(), features)).unwrap();
        assert_eq!(issue["type"], "issue");
        assert_eq!(issue["data"]["url"], "https://site.test");
        assert_eq!(issue["data"]["finalData"]["url"], "https://site.test");
    }

    #[test]
    fn test_kinds() {
        assert!(Event::progress(PageFeatures::default(), CheckResults::new()).is_progress());
        assert!(!Event::done(0, Vec::new()).is_progress());
        assert_eq!(Event::session_error("x").kind(), "error");
    }
}
