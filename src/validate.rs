// src/validate.rs

//! Structural validation of `config.yaml`.

use serde::Serialize;
use std::net::SocketAddr;

use crate::config::{Config, SinkKind};

#[derive(Debug, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Serialize)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn push_error(&mut self, code: &'static str, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            code,
            message: message.into(),
        });
    }

    pub fn is_valid(&self) -> bool {
        self.valid && self.errors.is_empty()
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.code).collect()
    }
}

pub fn validate_config(cfg: &Config) -> ValidationResult {
    let mut result = ValidationResult::ok();

    validate_server(cfg, &mut result);
    validate_sinks(cfg, &mut result);

    result
}

/* ---------------- server ---------------- */

fn validate_server(cfg: &Config, result: &mut ValidationResult) {
    if cfg.server.addr.parse::<SocketAddr>().is_err() {
        result.push_error(
            "SERVER_ADDR_INVALID",
            format!("server.addr is not a socket address: {}", cfg.server.addr),
        );
    }
}

/* ---------------- sinks ---------------- */

fn validate_sinks(cfg: &Config, result: &mut ValidationResult) {
    if cfg.sinks.is_empty() {
        result.push_error("SINKS_EMPTY", "At least one sink must be configured");
        return;
    }

    for (i, sink) in cfg.sinks.iter().enumerate() {
        match sink.kind {
            SinkKind::File => {
                let missing = sink.path.as_deref().map(str::trim).unwrap_or("").is_empty();
                if missing {
                    result.push_error(
                        "SINK_FILE_PATH_MISSING",
                        format!("sinks[{}]: path is required for kind = file", i),
                    );
                }
            }
            SinkKind::Http => {
                match sink.url.as_deref() {
                    None | Some("") => result.push_error(
                        "SINK_HTTP_URL_MISSING",
                        format!("sinks[{}]: url is required for kind = http", i),
                    ),
                    Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                        result.push_error(
                            "SINK_HTTP_URL_INVALID",
                            format!("sinks[{}]: url must be http(s): {}", i, url),
                        )
                    }
                    Some(_) => {}
                }

                if sink.timeout_ms == 0 {
                    result.push_error(
                        "SINK_HTTP_TIMEOUT_INVALID",
                        format!("sinks[{}]: timeout_ms must be greater than zero", i),
                    );
                }

                if sink.queue_capacity == 0 {
                    result.push_error(
                        "SINK_HTTP_QUEUE_INVALID",
                        format!("sinks[{}]: queue_capacity must be greater than zero", i),
                    );
                }
            }
            SinkKind::Log | SinkKind::Stdout => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&Config::default()).is_valid());
    }

    #[test]
    fn reports_every_problem() {
        let cfg = Config::parse(
            r#"
server:
  addr: not-an-addr
sinks:
  - kind: file
  - kind: http
    url: ftp://collector
    timeout_ms: 0
    queue_capacity: 0
  - kind: http
"#,
        )
        .unwrap();

        let result = validate_config(&cfg);

        assert!(!result.is_valid());
        assert_eq!(
            result.codes(),
            vec![
                "SERVER_ADDR_INVALID",
                "SINK_FILE_PATH_MISSING",
                "SINK_HTTP_URL_INVALID",
                "SINK_HTTP_TIMEOUT_INVALID",
                "SINK_HTTP_QUEUE_INVALID",
                "SINK_HTTP_URL_MISSING",
            ]
        );
    }

    #[test]
    fn empty_sink_list_is_invalid() {
        let cfg = Config::parse("sinks: []").unwrap();

        assert_eq!(validate_config(&cfg).codes(), vec!["SINKS_EMPTY"]);
    }
}
