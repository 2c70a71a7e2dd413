//! Captured traffic, one JSON object per line:
//! `{"call": {"method": "sendMessage", "params": {...}}, "result": ...}`.
//! A missing or `null` result stands for a failed call.

use bot_api_types::{ApiCall, ApiResponse};
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::LogError;
use crate::middleware::MiddlewarePipeline;

#[derive(Debug, Deserialize)]
pub struct ReplayRecord {
    pub call: ApiCall,
    #[serde(default)]
    pub result: Option<Value>,
}

impl ReplayRecord {
    pub fn parse(line: &str) -> Result<Self, LogError> {
        Ok(serde_json::from_str(line)?)
    }

    /// Decode the raw result against the call it answers
    pub fn response(&self) -> Result<Option<ApiResponse>, LogError> {
        match &self.result {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => self.call.parse_response(raw.clone()).map(Some).map_err(|e| {
                LogError::Serialization {
                    type_name: self.call.method().to_string(),
                    reason: format!("bad result: {}", e),
                }
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub records: usize,
    /// Lines that could not be parsed
    pub rejected: usize,
    pub written: usize,
    pub failures: usize,
}

/// Feed every record from `reader` through the pipeline.
pub async fn replay<R>(reader: R, pipeline: &MiddlewarePipeline) -> Result<ReplaySummary, LogError>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = ReplaySummary::default();
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let parsed = ReplayRecord::parse(&line).and_then(|record| {
            let response = record.response()?;
            Ok((record.call, response))
        });
        let (call, response) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("[REPLAY] Line {} rejected: {}", line_no, e);
                summary.rejected += 1;
                continue;
            }
        };

        let report = pipeline.on_request_result(&call, response.as_ref()).await;
        summary.records += 1;
        summary.written += report.written();
        summary.failures += report.failures() + report.panicked.len();
    }

    Ok(summary)
}
