//! Handles opened during a single scenario run
//!
//! Handles are pushed as soon as they are opened and released last-opened
//! first. After [`ExecutionContext::release`] the context is always empty,
//! whether or not each close succeeded.

use std::time::Duration;

use serde::Serialize;

use crate::automation::{Handle, UiDriver};

/// A handle that could not be closed during cleanup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeakWarning {
    pub handle: Handle,
    /// Position of the handle in creation order
    pub target: usize,
    pub reason: String,
}

/// Stack of open handles owned by one run
#[derive(Debug, Default)]
pub struct ExecutionContext {
    handles: Vec<Handle>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: Handle) {
        self.handles.push(handle);
    }

    /// Most recently opened handle
    pub fn last(&self) -> Option<Handle> {
        self.handles.last().copied()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Close every handle in reverse creation order
    ///
    /// Each close is bounded by `limit`. Failures and timeouts become
    /// warnings; they never stop the remaining closes.
    pub async fn release<D: UiDriver + ?Sized>(
        &mut self,
        driver: &mut D,
        limit: Duration,
    ) -> Vec<LeakWarning> {
        let mut warnings = Vec::new();

        while let Some(handle) = self.handles.pop() {
            let target = self.handles.len();
            let reason = match tokio::time::timeout(limit, driver.close(handle)).await {
                Ok(Ok(())) => {
                    tracing::debug!(%handle, target, "Closed handle");
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("close timed out after {}ms", limit.as_millis()),
            };

            tracing::warn!(%handle, target, %reason, "Failed to close handle");
            warnings.push(LeakWarning {
                handle,
                target,
                reason,
            });
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::{Faults, SimBrowser, Stage};

    #[tokio::test]
    async fn test_release_closes_in_reverse_order() {
        let mut browser = SimBrowser::new();
        let mut context = ExecutionContext::new();
        for location in ["about:newtab", "about:home", "about:welcome"] {
            context.push(browser.open(location).await.unwrap());
        }
        assert_eq!(context.last(), Some(Handle(3)));

        let warnings = context.release(&mut browser, Duration::from_secs(1)).await;

        assert!(warnings.is_empty());
        assert!(context.is_empty());
        assert_eq!(browser.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_release_reports_failed_closes() {
        let mut browser = SimBrowser::with_faults(Faults {
            fail_close: true,
            ..Faults::default()
        });
        let mut context = ExecutionContext::new();
        context.push(browser.open("about:newtab").await.unwrap());
        context.push(browser.open("about:home").await.unwrap());

        let warnings = context.release(&mut browser, Duration::from_secs(1)).await;

        assert!(context.is_empty());
        assert_eq!(warnings.len(), 2);
        // Last opened is released first
        assert_eq!(warnings[0].handle, Handle(2));
        assert_eq!(warnings[0].target, 1);
        assert_eq!(warnings[1].target, 0);
    }

    #[tokio::test]
    async fn test_release_bounds_stalled_close() {
        let mut browser = SimBrowser::with_faults(Faults {
            stall: Some((Stage::Close, 0)),
            ..Faults::default()
        });
        let mut context = ExecutionContext::new();
        context.push(browser.open("about:newtab").await.unwrap());
        context.push(browser.open("about:home").await.unwrap());

        let warnings = context
            .release(&mut browser, Duration::from_millis(50))
            .await;

        assert!(context.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].reason.contains("timed out"));
        assert_eq!(browser.open_handles(), 1);
    }
}
