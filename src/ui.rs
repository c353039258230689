// UI layer: line prompts using `dialoguer`, a spinner from `indicatif`
// while the slow calls run, and the prompt loop itself. Every step returns
// a tagged `AssistantError` and `settle` decides whether to carry on.

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::error::{AssistantError, Result};
use crate::executor::Executor;
use crate::report;
use crate::request::{RequestSpec, JSON_CONTENT_TYPE};
use anyhow::Context;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub const FAREWELL: &str = "Goodbye!";

/// What the loop should do after one pass.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Quit,
}

/// Source of answers to the line prompts.
pub trait Ask {
    /// Ask one question. `default` is only a hint shown to the user; the
    /// caller decides what a blank answer means.
    fn ask(&mut self, prompt: &str, default: Option<&str>) -> Result<String>;
}

/// Answers typed at the terminal.
pub struct Terminal;

impl Ask for Terminal {
    fn ask(&mut self, prompt: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::new();
        input.with_prompt(prompt).allow_empty(true);
        if let Some(default) = default {
            input.default(default.to_string());
        }
        input.interact_text().map_err(AssistantError::from_prompt)
    }
}

/// Ask for the inference endpoint once, then prompt for requests until the
/// user types `q`, leaves the URL empty, or presses Ctrl-C.
pub fn interactive_mode(config: Config) -> anyhow::Result<()> {
    install_interrupt_handler().context("Failed to install the Ctrl-C handler")?;
    let mut terminal = Terminal;

    println!("\n=== curl request builder with LLM assistance ===\n");
    println!("Inference service configuration:");

    let config = match configure_endpoint(&mut terminal, config) {
        Ok(config) => config,
        Err(AssistantError::Interrupted) => {
            println!("\n{}", FAREWELL);
            return Ok(());
        }
        Err(err) => return Err(err).context("Failed to read the inference endpoint"),
    };
    config.validate().context("Invalid inference endpoint")?;

    let analyzer = Analyzer::new(&config).context("Failed to set up the analyzer")?;
    let executor = Executor::new(&config);

    loop {
        let mut stdout = io::stdout();
        let outcome = run_once(&mut terminal, &mut stdout, &analyzer, &executor);
        if settle(&mut stdout, outcome, analyzer.endpoint())? == Step::Quit {
            break;
        }
    }
    Ok(())
}

/// Ctrl-C at a prompt reaches `dialoguer` as a key press and comes back as
/// `AssistantError::Interrupted`. While the model or the HTTP client is
/// running it arrives as SIGINT instead, handled here with the same
/// farewell. Installing twice is a no-op.
pub fn install_interrupt_handler() -> Result<()> {
    static INSTALLED: AtomicBool = AtomicBool::new(false);
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    ctrlc::set_handler(|| {
        println!("\n{}", FAREWELL);
        std::process::exit(0);
    })?;
    Ok(())
}

/// Blank (or whitespace-only) answers take the default.
fn answer_or(answer: &str, default: &str) -> String {
    let answer = answer.trim();
    let chosen = if answer.is_empty() { default } else { answer };
    chosen.to_string()
}

/// Prompt for host and model; blank answers keep the configured values.
fn configure_endpoint(ask: &mut impl Ask, config: Config) -> Result<Config> {
    let host = answer_or(&ask.ask("Inference server URL", Some(config.host.as_str()))?, &config.host);
    let model = answer_or(&ask.ask("Model to use", Some(config.model.as_str()))?, &config.model);
    Ok(config.with_endpoint(host, model))
}

/// One iteration: read a request, analyze it, run it, print both results.
fn run_once<W: Write>(
    ask: &mut impl Ask,
    out: &mut W,
    analyzer: &Analyzer,
    executor: &Executor,
) -> Result<Step> {
    writeln!(out, "\n{}\n", "=".repeat(50))?;
    let Some(spec) = read_request(ask)? else {
        return Ok(Step::Quit);
    };

    let spinner = start_spinner("Analysing the request via LLM...");
    let analysis = analyzer.analyze(&spec);
    spinner.finish_and_clear();
    report::write_analysis(&mut *out, &analysis?)?;

    let spinner = start_spinner("Executing the request...");
    let result = executor.execute(&spec);
    spinner.finish_and_clear();
    report::write_execution(&mut *out, &result?)?;

    Ok(Step::Continue)
}

/// Collect URL, method and, for POST/PUT, content type and body. `None`
/// means the user asked to quit.
fn read_request(ask: &mut impl Ask) -> Result<Option<RequestSpec>> {
    let url = ask.ask("URL (or 'q' to quit)", None)?;
    let url = url.trim();
    if url.is_empty() || url.eq_ignore_ascii_case("q") {
        return Ok(None);
    }

    let method = answer_or(&ask.ask("HTTP method", Some("GET"))?, "GET");
    let mut spec = RequestSpec::new(url, method);

    if RequestSpec::method_takes_body(&spec.method) {
        let content_type = answer_or(
            &ask.ask("Content-Type", Some(JSON_CONTENT_TYPE))?,
            JSON_CONTENT_TYPE,
        );
        let body = ask.ask("Data", None)?;
        spec = spec.with_content_type(content_type).with_body(body.trim());
    }
    Ok(Some(spec))
}

/// Report the outcome of one iteration and decide whether to go on.
fn settle<W: Write>(out: &mut W, outcome: Result<Step>, endpoint: &str) -> io::Result<Step> {
    match outcome {
        Ok(step) => Ok(step),
        Err(AssistantError::Interrupted) => {
            writeln!(out, "\n{}", FAREWELL)?;
            Ok(Step::Quit)
        }
        // The terminal is gone; prompting again would spin forever.
        Err(err @ AssistantError::Prompt(_)) => {
            writeln!(out, "\n{}", err)?;
            Ok(Step::Quit)
        }
        Err(err) if err.is_service_error() => {
            writeln!(out, "\nInference service error: {}", err)?;
            writeln!(out, "Is the model server running at {}?", endpoint)?;
            Ok(Step::Continue)
        }
        Err(err) => {
            writeln!(out, "\nUnexpected error: {}", err)?;
            Ok(Step::Continue)
        }
    }
}

fn start_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned answers and records which prompts were shown.
    struct Scripted {
        answers: VecDeque<&'static str>,
        asked: Vec<String>,
    }

    impl Scripted {
        fn new(answers: &[&'static str]) -> Self {
            Scripted {
                answers: answers.iter().copied().collect(),
                asked: Vec::new(),
            }
        }
    }

    impl Ask for Scripted {
        fn ask(&mut self, prompt: &str, _default: Option<&str>) -> Result<String> {
            self.asked.push(prompt.to_string());
            self.answers
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| AssistantError::Prompt(io::Error::new(io::ErrorKind::UnexpectedEof, "no more answers")))
        }
    }

    fn settled(outcome: Result<Step>) -> (Step, String) {
        let mut out = Vec::new();
        let step = settle(&mut out, outcome, "http://localhost:11434/api/generate").unwrap();
        (step, String::from_utf8(out).unwrap())
    }

    #[test]
    fn blank_answers_take_the_default() {
        assert_eq!(answer_or("", "GET"), "GET");
        assert_eq!(answer_or("   ", "GET"), "GET");
        assert_eq!(answer_or(" put ", "GET"), "put");
    }

    #[test]
    fn blank_endpoint_answers_keep_configured_values() {
        let mut ask = Scripted::new(&["   ", ""]);
        let config = configure_endpoint(&mut ask, Config::default()).unwrap();
        assert_eq!(config.host, crate::config::DEFAULT_HOST);
        assert_eq!(config.model, crate::config::DEFAULT_MODEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn endpoint_answers_override_configuration() {
        let mut ask = Scripted::new(&[" http://gpu-box:11434 ", "llama3"]);
        let config = configure_endpoint(&mut ask, Config::default()).unwrap();
        assert_eq!(config.host, "http://gpu-box:11434");
        assert_eq!(config.model, "llama3");
    }

    #[test]
    fn empty_url_or_q_quits() {
        for answer in ["", "  ", "q", "Q"] {
            let mut ask = Scripted::new(&[answer]);
            assert_eq!(read_request(&mut ask).unwrap(), None);
            assert_eq!(ask.asked.len(), 1);
        }
    }

    #[test]
    fn method_defaults_to_get_and_asks_nothing_else() {
        let mut ask = Scripted::new(&["http://example.com", "  "]);
        let spec = read_request(&mut ask).unwrap().unwrap();
        assert_eq!(spec, RequestSpec::new("http://example.com", "GET"));
        assert_eq!(ask.asked.len(), 2);
    }

    #[test]
    fn delete_does_not_ask_for_a_body() {
        let mut ask = Scripted::new(&["http://example.com/items/1", "delete"]);
        let spec = read_request(&mut ask).unwrap().unwrap();
        assert_eq!(spec.method, "DELETE");
        assert_eq!(spec.content_type, None);
        assert_eq!(spec.body, None);
    }

    #[test]
    fn post_asks_for_content_type_and_body() {
        let mut ask = Scripted::new(&["http://example.com/api", "post", " ", r#" {"a":1} "#]);
        let spec = read_request(&mut ask).unwrap().unwrap();
        assert_eq!(
            spec,
            RequestSpec::new("http://example.com/api", "POST")
                .with_content_type(JSON_CONTENT_TYPE)
                .with_body(r#"{"a":1}"#)
        );
        assert_eq!(ask.asked, ["URL (or 'q' to quit)", "HTTP method", "Content-Type", "Data"]);
    }

    #[test]
    fn put_keeps_custom_content_type() {
        let mut ask = Scripted::new(&["http://example.com/doc", "PUT", "text/plain", "hello"]);
        let spec = read_request(&mut ask).unwrap().unwrap();
        assert_eq!(spec.content_type.as_deref(), Some("text/plain"));
        assert_eq!(spec.body.as_deref(), Some("hello"));
    }

    #[test]
    fn service_errors_are_reported_and_the_loop_continues() {
        let (step, text) = settled(Err(AssistantError::ServiceStatus {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".into(),
        }));
        assert_eq!(step, Step::Continue);
        assert!(text.contains("Inference service error"));
        assert!(text.contains("http://localhost:11434/api/generate"));
    }

    #[test]
    fn malformed_body_is_reported_and_the_loop_continues() {
        let err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let (step, text) = settled(Err(AssistantError::MalformedJsonBody(err)));
        assert_eq!(step, Step::Continue);
        assert!(text.contains("Unexpected error: Request body is not valid JSON"));
    }

    #[test]
    fn interrupt_says_goodbye() {
        let (step, text) = settled(Err(AssistantError::Interrupted));
        assert_eq!(step, Step::Quit);
        assert!(text.contains(FAREWELL));
    }

    #[test]
    fn terminal_failure_stops_the_loop() {
        let err = AssistantError::Prompt(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        let (step, text) = settled(Err(err));
        assert_eq!(step, Step::Quit);
        assert!(text.contains("stdin closed"));
    }

    #[test]
    fn successful_pass_continues() {
        assert_eq!(settled(Ok(Step::Continue)), (Step::Continue, String::new()));
    }

    #[test]
    fn installing_interrupt_handler_twice_is_harmless() {
        install_interrupt_handler().unwrap();
        install_interrupt_handler().unwrap();
    }

    fn analyzer_replying(server: &mut mockito::Server, reply: &str) -> (Analyzer, mockito::Mock) {
        let mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(serde_json::json!({ "response": reply }).to_string())
            .create();
        let config = Config::default().with_endpoint(server.url(), "mistral");
        (Analyzer::new(&config).unwrap(), mock)
    }

    #[test]
    fn malformed_body_surfaces_after_analysis() {
        let mut server = mockito::Server::new();
        let (analyzer, mock) = analyzer_replying(&mut server, "The body looks broken.");
        let executor = Executor::new(&Config::default());
        let mut ask = Scripted::new(&["http://example.com/api", "POST", "", "{bad"]);
        let mut out = Vec::new();

        let outcome = run_once(&mut ask, &mut out, &analyzer, &executor);

        mock.assert();
        assert!(matches!(outcome, Err(AssistantError::MalformedJsonBody(_))));
        assert!(String::from_utf8(out).unwrap().contains("The body looks broken."));
    }

    #[cfg(unix)]
    #[test]
    fn full_pass_prints_analysis_then_result() {
        let mut server = mockito::Server::new();
        let (analyzer, _mock) = analyzer_replying(&mut server, "Simple GET.");
        let config = Config {
            http_client: vec!["sh".into(), "-c".into(), "printf 'pong'".into(), "sh".into()],
            ..Config::default()
        };
        let executor = Executor::new(&config);
        let mut ask = Scripted::new(&["http://example.com/ping", ""]);
        let mut out = Vec::new();

        let step = run_once(&mut ask, &mut out, &analyzer, &executor).unwrap();

        assert_eq!(step, Step::Continue);
        let text = String::from_utf8(out).unwrap();
        let analysis_at = text.find("Simple GET.").unwrap();
        let result_at = text.find("✅ Request succeeded!").unwrap();
        assert!(analysis_at < result_at);
        assert!(text.contains("pong"));
    }
}
