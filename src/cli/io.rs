//! JSON output for CLI
//!
//! Each command prints exactly one envelope line on stdout:
//! `{"status":"ok","data":...}` or `{"status":"error","code":...,"message":...}`.

use std::io::{self, Write};

use serde_json::{json, Value};

use super::errors::CliResult;

fn emit(envelope: &Value) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, envelope)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

pub fn ok_envelope(data: Value) -> Value {
    json!({ "status": "ok", "data": data })
}

pub fn error_envelope(code: &str, message: &str) -> Value {
    json!({ "status": "error", "code": code, "message": message })
}

pub fn write_response(data: Value) -> CliResult<()> {
    emit(&ok_envelope(data))
}

pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    emit(&error_envelope(code, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes() {
        assert_eq!(ok_envelope(json!(1))["status"], "ok");
        let err = error_envelope("ROUTER_CLI_CONFIG_ERROR", "bad");
        assert_eq!(err["status"], "error");
        assert_eq!(err["code"], "ROUTER_CLI_CONFIG_ERROR");
        assert_eq!(err["message"], "bad");
    }
}
