// Rendering of analysis and execution results. Kept apart from the prompt
// loop so the wording can be checked without a terminal.

use crate::request::{AnalysisResult, ExecutionResult};
use serde_json::Value;
use std::io::{self, Write};

pub fn write_analysis<W: Write>(out: &mut W, analysis: &AnalysisResult) -> io::Result<()> {
    writeln!(out, "\nLLM analysis:")?;
    if analysis.analysis_text.trim().is_empty() {
        writeln!(out, "No analysis available")
    } else {
        writeln!(out, "{}", analysis.analysis_text)
    }
}

pub fn write_execution<W: Write>(out: &mut W, result: &ExecutionResult) -> io::Result<()> {
    writeln!(out, "\nResult:")?;
    if let Some(command) = &result.command {
        writeln!(out, "\nCommand executed:\n{}\n", command)?;
    }
    if !result.stderr.is_empty() {
        writeln!(out, "\nHTTP exchange details:")?;
        writeln!(out, "{}", result.stderr)?;
    }

    if result.success {
        writeln!(out, "\n✅ Request succeeded!")?;
        if !result.stdout.is_empty() {
            writeln!(out, "\nResponse body:")?;
            writeln!(out, "{}", pretty_body(&result.stdout))?;
        }
    } else {
        writeln!(out, "\n❌ Error:")?;
        writeln!(out, "{}", result.error.as_deref().unwrap_or("Unknown error"))?;
    }
    Ok(())
}

/// Pretty-print JSON response bodies; anything else is shown as-is.
fn pretty_body(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or_else(|| body.to_string())
}
