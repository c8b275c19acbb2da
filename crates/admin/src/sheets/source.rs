//! Reader for the published CSV export.

use std::future::Future;

use pkl_monitor_core::VendorRecord;
use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use tracing::{debug, instrument};
use url::Url;

use super::error::SourceError;
use super::normalize::parse_sheet;

/// Anything that can produce the full record set on demand.
///
/// The sync cache is generic over this so tests can substitute a scripted
/// source for the network.
pub trait RecordSource: Send + Sync + 'static {
    /// Fetch every record currently published, in source order.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<VendorRecord>, SourceError>> + Send;
}

/// HTTP reader for a published Google Sheets CSV.
#[derive(Debug, Clone)]
pub struct SheetSource {
    client: Client,
    csv_url: Url,
}

impl SheetSource {
    /// Create a reader for `csv_url`.
    #[must_use]
    pub fn new(client: Client, csv_url: Url) -> Self {
        Self { client, csv_url }
    }
}

impl RecordSource for SheetSource {
    #[instrument(skip(self), fields(url = %self.csv_url))]
    async fn fetch_all(&self) -> Result<Vec<VendorRecord>, SourceError> {
        let response = self
            .client
            .get(self.csv_url.clone())
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| SourceError::Body(e.to_string()))?;

        let parsed = parse_sheet(&text);
        for line in &parsed.malformed_lines {
            debug!(line, "Dropped row with too few fields");
        }
        debug!(
            records = parsed.records.len(),
            dropped = parsed.malformed_lines.len(),
            "Fetched sheet"
        );

        Ok(parsed.records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use pkl_monitor_core::RelocationStatus;

    const SHEET: &str = "ID,Tanggal,Nama,Kelurahan,Alamat,Jenis,Status\r\n\
                         1,01/02/2026,Dg. Naba,Losari,Jl. Penghibur,Pisang Epe,Sudah Relokasi\r\n\
                         2,01/02/2026,Ibu Sari,Baru,Jl. Ahmad Yani,Kopi,Belum Relokasi\r\n\
                         bad,row\r\n";

    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/pub?output=csv")).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_all_parses_rows() {
        let url = serve(Router::new().route("/pub", get(|| async { SHEET }))).await;
        let source = SheetSource::new(Client::new(), url);

        let records = source.fetch_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].vendor_name, "Dg. Naba");
        assert_eq!(records[0].status, RelocationStatus::Relocated);
        assert_eq!(records[1].district, "Baru");
    }

    #[tokio::test]
    async fn test_fetch_all_disables_caching() {
        let url = serve(Router::new().route(
            "/pub",
            get(|headers: HeaderMap| async move {
                let no_cache = headers
                    .get(CACHE_CONTROL)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|v| v.contains("no-cache"));
                if no_cache {
                    (StatusCode::OK, SHEET)
                } else {
                    (StatusCode::BAD_REQUEST, "")
                }
            }),
        ))
        .await;
        let source = SheetSource::new(Client::new(), url);

        assert!(source.fetch_all().await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_all_non_success_status() {
        let url = serve(Router::new().route(
            "/pub",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        ))
        .await;
        let source = SheetSource::new(Client::new(), url);

        let err = source.fetch_all().await.unwrap_err();
        assert!(matches!(err, SourceError::Status(503)));
    }

    #[tokio::test]
    async fn test_fetch_all_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let source = SheetSource::new(
            Client::new(),
            Url::parse(&format!("http://{addr}/pub")).unwrap(),
        );

        let err = source.fetch_all().await.unwrap_err();
        assert!(matches!(err, SourceError::Http(_)));
    }
}
