// Library root
// -----------
// The binary (`main.rs`) wires these modules into an interactive prompt
// loop; the analyzer and executor are usable on their own.
//
// Module responsibilities:
// - `config`: startup configuration (endpoint, model, executor settings).
// - `request`: the per-iteration data types.
// - `analyzer`: asks the local inference service to comment on a request.
// - `executor`: runs the request through the external HTTP client.
// - `report`: renders analysis and execution results.
// - `ui`: terminal prompts and the loop that drives everything.
// - `error`, `logging`: shared error type and tracing setup.
pub mod analyzer;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod report;
pub mod request;
pub mod ui;
