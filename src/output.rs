//! Rendering of command results.
//!
//! Every command produces a serializable payload plus an optional
//! [`HumanOutput`]. With `--json` the payload is wrapped in a versioned
//! envelope on stdout; otherwise the human view is printed unless `--quiet`.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, ErrorReport, Result};

pub const SCHEMA_VERSION: &str = "tasker.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Success,
    Error,
}

#[derive(Serialize)]
struct Envelope<'a, B: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Status,
    #[serde(flatten)]
    body: B,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    next_steps: &'a [String],
}

#[derive(Serialize)]
struct DataBody<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorReport,
}

fn print_envelope<B: Serialize>(envelope: &Envelope<'_, B>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}

/// Human-readable view of a command result.
///
/// Renders as a header line followed by the non-empty sections, each
/// introduced by a blank line and its title.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    /// Adds a `key: value` line. An empty value renders the key alone.
    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

fn write_section<I, D>(f: &mut fmt::Formatter<'_>, title: &str, items: I) -> fmt::Result
where
    I: IntoIterator<Item = D>,
    D: fmt::Display,
{
    let mut items = items.into_iter().peekable();
    if items.peek().is_none() {
        return Ok(());
    }
    write!(f, "\n\n{title}:")?;
    for item in items {
        write!(f, "\n- {item}")?;
    }
    Ok(())
}

struct SummaryLine<'a>(&'a str, &'a str);

impl fmt::Display for SummaryLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            "" => f.write_str(self.0),
            value => write!(f, "{}: {value}", self.0),
        }
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header)?;
        let summary = self
            .summary
            .iter()
            .map(|(key, value)| SummaryLine(key, value));
        write_section(f, "Summary", summary)?;
        write_section(f, "Details", &self.details)?;
        write_section(f, "Warnings", &self.warnings)?;
        write_section(f, "Next steps", &self.next_steps)
    }
}

pub fn format_human(output: &HumanOutput) -> String {
    output.to_string()
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let none: &[String] = &[];
        let (warnings, next_steps) = match human {
            Some(human) => (human.warnings.as_slice(), human.next_steps.as_slice()),
            None => (none, none),
        };
        return print_envelope(&Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Success,
            body: DataBody { data },
            warnings,
            next_steps,
        });
    }

    if let Some(human) = human.filter(|_| !options.quiet) {
        println!("{human}");
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let hint = error_hint(err);
    if json {
        let next_steps: Vec<String> = hint.into_iter().collect();
        return print_envelope(&Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Error,
            body: ErrorBody {
                error: ErrorReport::from(err),
            },
            warnings: &[],
            next_steps: &next_steps,
        });
    }

    eprintln!("error: {err}");
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// Name of the subcommand in the process arguments, for error envelopes
/// emitted before (or instead of) a successful parse.
pub fn infer_command_name_from_args() -> String {
    command_name_from(std::env::args().skip(1))
}

fn command_name_from(args: impl IntoIterator<Item = String>) -> String {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--dir" {
            args.next();
        } else if !arg.starts_with('-') {
            return arg;
        }
    }
    "tasker".to_string()
}

/// Follow-up command suggested alongside an error.
fn error_hint(err: &Error) -> Option<String> {
    match err {
        Error::RecordNotFound(_) => Some("tasker list".to_string()),
        Error::StorageCorrupt { path, .. } => {
            Some(format!("fix or move {} then retry", path.display()))
        }
        Error::InvalidConfig(_) => Some("fix tasker.toml then retry".to_string()),
        Error::IdsExhausted { .. } => Some("start a fresh data directory with --dir".to_string()),
        _ => None,
    }
}
