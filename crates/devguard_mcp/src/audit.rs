//! Append-only JSON-lines audit log of every request/response.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use devguard_protocol::{JsonRpcRequest, JsonRpcResponse};
use serde::Serialize;

pub struct AuditLog {
    writer: Mutex<BufWriter<File>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AuditEntry<'a> {
    Request {
        ts: DateTime<Utc>,
        method: &'a str,
    },
    Response {
        ts: DateTime<Utc>,
        success: bool,
    },
}

impl AuditLog {
    pub fn new(path: PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn write_line(&self, value: &impl Serialize) {
        let Ok(mut line) = serde_json::to_string(value) else {
            return;
        };
        line.push('\n');
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.write_all(line.as_bytes());
            let _ = writer.flush();
        }
    }

    pub fn log_request(&self, request: &JsonRpcRequest) {
        self.write_line(&AuditEntry::Request {
            ts: Utc::now(),
            method: &request.method,
        });
    }

    pub fn log_response(&self, response: &JsonRpcResponse) {
        self.write_line(&AuditEntry::Response {
            ts: Utc::now(),
            success: response.error.is_none(),
        });
    }
}
