//! Blocking HTTP client for the table detector.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};

use crate::config::DetectorConfig;
use crate::error::Result;
use crate::session::{DetectionOutcome, Session, TableId};
use crate::wire::{DetectionRequest, DetectorResponse};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends images to `<endpoint>/table_split` and parses the answer.
#[derive(Debug, Clone)]
pub struct DetectorClient {
    client: Client,
    config: DetectorConfig,
}

impl DetectorClient {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout))
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Post `image` with `request` as the `data` field.
    pub fn detect(
        &self,
        image: Vec<u8>,
        file_name: &str,
        request: &DetectionRequest,
    ) -> Result<DetectorResponse> {
        let url = self.config.split_url();
        let form = Form::new()
            .part("image", Part::bytes(image).file_name(file_name.to_string()))
            .text("data", request.to_json()?);

        #[cfg(feature = "tracing")]
        tracing::debug!(%url, crops = request.crops.len(), "posting image to detector");

        let body = self
            .client
            .post(&url)
            .multipart(form)
            .send()?
            .error_for_status()?
            .text()?;
        DetectorResponse::parse(&body)
    }

    /// Read an image file and post it.
    pub fn detect_file(&self, path: &Path, request: &DetectionRequest) -> Result<DetectorResponse> {
        let image = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        self.detect(image, &file_name, request)
    }

    /// Run one full round trip for `table`: ticket, request, response, apply.
    ///
    /// A failed request releases the ticket so the table can be retried.
    pub fn detect_into(
        &self,
        session: &mut Session,
        table: TableId,
        image: Vec<u8>,
        file_name: &str,
        crops: &[tablegrid_core::Crop],
    ) -> Result<DetectionOutcome> {
        let ticket = session.begin_detection(table)?;
        let request = if crops.is_empty() {
            session.request(&self.config)
        } else {
            session.crop_request(&self.config, crops)
        };
        match self.detect(image, file_name, &request) {
            Ok(response) => session.apply_detection(ticket, &response),
            Err(e) => {
                session.cancel_detection(table)?;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_default_config() {
        let client = DetectorClient::new(DetectorConfig::default()).unwrap();
        assert!(client.config().split_url().ends_with("/table_split"));
    }

    #[test]
    fn connection_failure_releases_ticket() {
        let config = DetectorConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(2),
            ..DetectorConfig::default()
        };
        let client = DetectorClient::new(config).unwrap();
        let mut session = Session::default();
        let id = session.create_table(tablegrid_core::Table::default());
        let result = client.detect_into(&mut session, id, vec![0u8; 4], "page.png", &[]);
        assert!(result.is_err());
        assert_eq!(session.pending(id), None);
    }
}
