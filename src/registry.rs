//! The cached, filterable view of reports and its reconciliation rules.
//!
//! The cache is a disposable projection of server state: refreshes replace
//! it wholesale in server order, and a status change touches exactly one
//! entry, only after the server has acknowledged it.

use serde::{Deserialize, Serialize};

use crate::api::{Report, ReportId};
use crate::{AppError, ReportStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// Server-side narrowing to unresolved reports.
    Open,
    /// Exact-status view, narrowed further client-side.
    Only(ReportStatus),
}

impl StatusFilter {
    /// Whether the fetch should ask the server for open reports only. An
    /// exact view of a terminal status has to fetch everything, otherwise
    /// the server-side narrowing would hide the very reports it wants.
    #[must_use]
    pub const fn only_open(self) -> bool {
        match self {
            Self::All => false,
            Self::Open => true,
            Self::Only(status) => !status.is_terminal(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportsRegistry {
    reports: Vec<Report>,
    pub filter: StatusFilter,
    loading: bool,
    error: Option<AppError>,
    alert: Option<String>,
    epoch: u64,
}

impl ReportsRegistry {
    #[must_use]
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn load_error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Start a refresh. Returns the epoch the eventual completion must
    /// carry; completions from earlier epochs are discarded, so rapid
    /// triggers cannot interleave stale data.
    pub fn begin_refresh(&mut self) -> u64 {
        self.epoch += 1;
        self.loading = true;
        self.epoch
    }

    /// Replace the cache with a refresh result, preserving server order.
    pub fn apply_refresh(&mut self, epoch: u64, result: Result<Vec<Report>, AppError>) {
        if epoch != self.epoch {
            tracing::debug!(epoch, current = self.epoch, "stale refresh dropped");
            return;
        }
        self.loading = false;
        match result {
            Ok(mut reports) => {
                if let StatusFilter::Only(status) = self.filter {
                    reports.retain(|r| r.status == status);
                }
                self.reports = reports;
                self.error = None;
            }
            Err(error) => {
                self.reports.clear();
                self.error = Some(error);
            }
        }
    }

    /// Returns true when the filter actually changed and a refetch is due.
    pub fn set_filter(&mut self, filter: StatusFilter) -> bool {
        if self.filter == filter {
            return false;
        }
        self.filter = filter;
        true
    }

    /// Check a requested transition against the cached entry before any
    /// network call goes out; the client never invents transitions.
    pub fn validate_transition(
        &self,
        id: ReportId,
        to: ReportStatus,
    ) -> Result<(), AppError> {
        let report = self
            .reports
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::new(crate::ErrorKind::StatusUpdate, "Report not found"))?;
        report.status.validate_transition(to)?;
        Ok(())
    }

    /// Server-confirmed status change: mutate the one matching entry in
    /// place. Positions never move on an in-place change.
    pub fn apply_status_update(&mut self, id: ReportId, status: ReportStatus) {
        if let Some(report) = self.reports.iter_mut().find(|r| r.id == id) {
            report.status = status;
        } else {
            tracing::warn!(%id, "status update for a report no longer in the cache");
        }
    }

    pub fn raise_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(message.into());
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }
}
