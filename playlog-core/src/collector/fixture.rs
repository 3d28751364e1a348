use std::path::Path;

use async_trait::async_trait;
use playlog_model::Credentials;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    Collector, CollectorError, PageCursor, ProgressSink, SessionPage,
};
use crate::error::{EngineError, Result};
use crate::table::{ColumnLayout, decode_row};

/// One account served by a [`FixtureCollector`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureAccount {
    pub email: String,
    pub password: String,
    /// Listing pages, each a list of rows of raw cells.
    #[serde(default)]
    pub pages: Vec<Vec<Vec<String>>>,
    /// Page index whose fetch fails. Rows already decoded on that page are
    /// returned as a partial result.
    #[serde(default)]
    pub fail_page: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureData {
    #[serde(default)]
    pub layout: ColumnLayout,
    #[serde(default)]
    pub accounts: Vec<FixtureAccount>,
}

/// Collector serving session listings from local JSON data.
#[derive(Debug, Clone, Default)]
pub struct FixtureCollector {
    data: FixtureData,
}

#[derive(Debug, Clone)]
pub struct FixtureSession {
    account: usize,
}

impl FixtureCollector {
    pub fn new(data: FixtureData) -> Self {
        Self { data }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            EngineError::Internal(format!(
                "failed to read fixture {}: {err}",
                path.display()
            ))
        })?;
        let data: FixtureData = serde_json::from_slice(&bytes)?;
        info!(
            "Loaded {} fixture accounts from {}",
            data.accounts.len(),
            path.display()
        );
        Ok(Self::new(data))
    }

    pub fn account_count(&self) -> usize {
        self.data.accounts.len()
    }

    fn account(&self, session: &FixtureSession) -> Option<&FixtureAccount> {
        self.data.accounts.get(session.account)
    }
}

#[async_trait]
impl Collector for FixtureCollector {
    type Session = FixtureSession;

    async fn login(
        &self,
        credentials: &Credentials,
    ) -> std::result::Result<FixtureSession, CollectorError> {
        let account = self
            .data
            .accounts
            .iter()
            .position(|account| {
                account.email.eq_ignore_ascii_case(credentials.email())
            })
            .ok_or_else(|| CollectorError::Login("unknown account".into()))?;

        if self.data.accounts[account].password != credentials.password() {
            return Err(CollectorError::Login("invalid password".into()));
        }
        Ok(FixtureSession { account })
    }

    async fn list_sessions(
        &self,
        session: &FixtureSession,
        cursor: Option<&PageCursor>,
        progress: &ProgressSink,
    ) -> std::result::Result<SessionPage, CollectorError> {
        let account = self
            .account(session)
            .ok_or_else(|| CollectorError::fetch("session expired"))?;

        let index = match cursor {
            Some(PageCursor(raw)) => raw.parse::<usize>().map_err(|_| {
                CollectorError::fetch(format!("bad page cursor {raw:?}"))
            })?,
            None => 0,
        };

        let total: usize = account.pages.iter().map(Vec::len).sum();
        let mut seen: usize =
            account.pages.iter().take(index).map(Vec::len).sum();
        progress.report(seen, total);

        let mut page = SessionPage::default();
        let rows = account.pages.get(index).map(Vec::as_slice).unwrap_or(&[]);
        let failing = account.fail_page == Some(index);

        for (row_index, cells) in rows.iter().enumerate() {
            // A failing page breaks halfway through.
            if failing && row_index * 2 >= rows.len() {
                break;
            }
            seen += 1;
            if let Some(decoded) = decode_row(&self.data.layout, cells) {
                page.records.push(decoded.record);
                page.issues.extend(decoded.issues);
            }
            progress.report(seen, total);
        }

        if failing {
            debug!(
                "Fixture page {} fails after {} rows",
                index,
                page.records.len()
            );
            let message = format!("failed to load sessions page {}", index + 1);
            return Err(if page.is_empty() {
                CollectorError::fetch(message)
            } else {
                CollectorError::partial(message, page)
            });
        }

        if index + 1 < account.pages.len() {
            page.next = Some(PageCursor((index + 1).to_string()));
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Progress;

    fn row(name: &str) -> Vec<String> {
        let mut cells = vec![String::new(); 11];
        cells[0] = "2020-05-01".into();
        cells[2] = name.into();
        cells[4] = "77".into();
        cells[7] = "1-2".into();
        cells
    }

    fn collector(fail_page: Option<usize>) -> FixtureCollector {
        FixtureCollector::new(FixtureData {
            layout: ColumnLayout::default(),
            accounts: vec![FixtureAccount {
                email: "gm@example.com".into(),
                password: "hunter2".into(),
                pages: vec![
                    vec![row("#1: A"), row("#2: B")],
                    vec![row("#3: C"), row("#4: D")],
                ],
                fail_page,
            }],
        })
    }

    #[tokio::test]
    async fn test_login_checks_credentials() {
        let collector = collector(None);
        assert!(
            collector
                .login(&Credentials::new("GM@example.com", "hunter2"))
                .await
                .is_ok()
        );
        assert!(matches!(
            collector
                .login(&Credentials::new("gm@example.com", "nope"))
                .await,
            Err(CollectorError::Login(_))
        ));
        assert!(matches!(
            collector
                .login(&Credentials::new("who@example.com", "hunter2"))
                .await,
            Err(CollectorError::Login(_))
        ));
    }

    #[tokio::test]
    async fn test_pages_and_progress() {
        let collector = collector(None);
        let session = collector
            .login(&Credentials::new("gm@example.com", "hunter2"))
            .await
            .unwrap();
        let (sink, mut rx) = ProgressSink::channel();

        let first =
            collector.list_sessions(&session, None, &sink).await.unwrap();
        assert_eq!(first.records.len(), 2);
        let cursor = first.next.clone().unwrap();

        let second = collector
            .list_sessions(&session, Some(&cursor), &sink)
            .await
            .unwrap();
        assert_eq!(second.records.len(), 2);
        assert!(second.next.is_none());

        drop(sink);
        let mut last = None;
        while let Some(update) = rx.recv().await {
            last = Some(update);
        }
        assert_eq!(last, Some(Progress { current: 4, total: 4 }));
    }

    #[tokio::test]
    async fn test_failing_page_returns_partial() {
        let collector = collector(Some(1));
        let session = collector
            .login(&Credentials::new("gm@example.com", "hunter2"))
            .await
            .unwrap();
        let (sink, _rx) = ProgressSink::channel();
        let cursor = PageCursor("1".into());

        match collector.list_sessions(&session, Some(&cursor), &sink).await {
            Err(CollectorError::Fetch {
                partial: Some(page),
                ..
            }) => assert_eq!(page.records.len(), 1),
            other => panic!("expected partial failure, got {other:?}"),
        }
    }
}
