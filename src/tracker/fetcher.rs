use crate::error::{Error, Result};
use crate::model::{ReportFilter, ReportFormat};
use crate::tracker::Session;

/// Unparsed tracker response together with the format it was requested in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReport {
    pub status: u16,
    pub body: String,
    pub format: ReportFormat,
}

pub trait ReportFetcher {
    async fn fetch(&self, filter: &ReportFilter) -> Result<RawReport>;
}

impl ReportFetcher for Session {
    async fn fetch(&self, filter: &ReportFilter) -> Result<RawReport> {
        let url = self.endpoint(filter.endpoint);
        let response = self
            .client()
            .get(&url)
            .query(&filter.query_pairs())
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::info!(url = %url, status, bytes = body.len(), "fetched tracker report");

        if status != 200 {
            return Err(Error::Fetch { status, body });
        }
        Ok(RawReport {
            status,
            body,
            format: filter.format,
        })
    }
}
