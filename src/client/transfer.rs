use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;
use tracing::{info, instrument};

use super::{Access, ApiClient};
use crate::errors::ServiceError;
use crate::models::ImportReport;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ExportQuery {
    pub format: ExportFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Bulk export and CSV import.
pub struct TransferApi<'a> {
    client: &'a ApiClient,
}

impl<'a> TransferApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn export_wines(&self, format: ExportFormat) -> Result<Bytes, ServiceError> {
        let query = ExportQuery {
            format,
            ..Default::default()
        };
        self.client.get_bytes("export/wines", &query).await
    }

    #[instrument(skip(self))]
    pub async fn export_transactions(&self, query: &ExportQuery) -> Result<Bytes, ServiceError> {
        self.client.get_bytes("export/transactions", query).await
    }

    /// Uploads a CSV file; the backend only accepts `.csv` file names.
    #[instrument(skip(self, contents), fields(bytes = contents.len()))]
    pub async fn import_wines(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<ImportReport, ServiceError> {
        if !file_name.to_ascii_lowercase().ends_with(".csv") {
            return Err(ServiceError::InvalidOperation(
                "only CSV files can be imported".to_string(),
            ));
        }
        let part = Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let builder = self
            .client
            .request(Method::POST, "import/wines", Access::Bearer)
            .await?
            .multipart(form);
        let response = self.client.execute(builder, Access::Bearer).await?;
        let report: ImportReport = response.json().await?;
        info!(imported = report.imported, errors = report.errors.len(), "import finished");
        Ok(report)
    }
}
