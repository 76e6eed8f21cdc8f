//! run command - Execute JSON-lines tool requests
//!
//! Every request in one run goes to the same in-process catalog, so a
//! script can build a forest and query it. Envelopes are written to stdout
//! one per line, in request order.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::catalog::{Catalog, ErrorKind};
use crate::core::tree::MAX_INPUT_LEVELS;
use crate::cli::Context;
use crate::store::MemoryStore;
use crate::tools::{dispatch, Envelope};
use crate::ui::output;

/// Stack for the request thread. Trees read back are serialized
/// recursively, and stored trees can be far deeper than any one request.
const REQUEST_STACK_BYTES: usize = 256 * 1024 * 1024;

/// One line of input.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Execute the requests in `script`, or on stdin.
pub fn run(ctx: &Context, script: Option<&Path>, verify: bool, fail_fast: bool) -> Result<()> {
    let input = match script {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read script {}", path.display()))?,
        ),
        None => None,
    };

    std::thread::scope(|scope| {
        std::thread::Builder::new()
            .name("msm-run".into())
            .stack_size(REQUEST_STACK_BYTES)
            .spawn_scoped(scope, || {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .context("Failed to start async runtime")?;
                rt.block_on(run_impl(ctx, input, verify, fail_fast))
            })
            .context("Failed to start request thread")?
            .join()
            .map_err(|_| anyhow!("Request thread panicked"))?
    })
}

async fn run_impl(ctx: &Context, input: Option<String>, verify: bool, fail_fast: bool) -> Result<()> {
    let input = match input {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read requests from stdin")?;
            buf
        }
    };

    let catalog = Catalog::open(Arc::new(MemoryStore::new()), &ctx.config)
        .await
        .context("Failed to open catalog")?;

    let mut stdout = tokio::io::stdout();
    let mut failed = 0usize;
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = index + 1;

        let envelope = match serde_json::from_str::<Request>(line) {
            Ok(request) => dispatch(&catalog, &request.tool, request.arguments).await,
            Err(e) => Envelope::failure(ErrorKind::Validation, invalid_request(line_no, &e)),
        };
        write_envelope(&mut stdout, &envelope).await?;

        if !envelope.success {
            failed += 1;
            if fail_fast {
                bail!("Request on line {} failed", line_no);
            }
        }
    }

    if failed > 0 {
        output::warn(format!("{} request(s) failed", failed), ctx.verbosity);
    }

    if verify {
        let report = catalog
            .verify_forest()
            .await
            .context("Failed to verify forest")?;
        if !report.ok {
            output::error(format!(
                "forest is inconsistent:\n{}",
                output::format_list(&report.errors, "  - ")
            ));
            bail!("Forest verification failed with {} error(s)", report.errors.len());
        }
        output::status("Forest verified", ctx.verbosity);
    }

    Ok(())
}

fn invalid_request(line_no: usize, error: &serde_json::Error) -> String {
    if error.to_string().contains("recursion limit exceeded") {
        format!(
            "line {line_no}: invalid request: nested too deeply; tree input takes at most \
             {MAX_INPUT_LEVELS} levels per request"
        )
    } else {
        format!("line {line_no}: invalid request: {error}")
    }
}

async fn write_envelope(stdout: &mut tokio::io::Stdout, envelope: &Envelope) -> Result<()> {
    let mut bytes = serde_json::to_vec(envelope).context("Failed to encode envelope")?;
    bytes.push(b'\n');
    stdout.write_all(&bytes).await.context("Failed to write to stdout")?;
    stdout.flush().await.context("Failed to flush stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_arguments() {
        let request: Request = serde_json::from_str(r#"{"tool": "ping"}"#).unwrap();
        assert_eq!(request.tool, "ping");
        assert!(request.arguments.is_null());
    }

    #[test]
    fn deeply_nested_request_names_the_bound() {
        let mut root = String::from(r#"{"name": "n0"}"#);
        for i in 1..100 {
            root = format!(r#"{{"name": "n{i}", "children": [{root}]}}"#);
        }
        let line = format!(
            r#"{{"tool": "create_metadata_tree", "arguments": {{"category": "concept", "root": {root}}}}}"#
        );
        let error = serde_json::from_str::<Request>(&line).unwrap_err();
        let message = invalid_request(3, &error);
        assert!(message.starts_with("line 3:"));
        assert!(message.contains(&MAX_INPUT_LEVELS.to_string()));

        let shallow = serde_json::from_str::<Request>("{").unwrap_err();
        assert!(!invalid_request(1, &shallow).contains("nested"));
    }

    #[test]
    fn request_rejects_unknown_keys() {
        let result = serde_json::from_str::<Request>(r#"{"tool": "ping", "args": {}}"#);
        assert!(result.is_err());
    }
}
