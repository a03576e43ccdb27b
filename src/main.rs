//! Purpose: `cast` CLI entry point.
//! Role: Binary crate root; parses args, sets up logging, runs one cast transaction, reports errors.
//! Invariants: Exactly one mutation (delete wins over add) per invocation, then save, then display.
//! Invariants: Errors are human text on a terminal stderr and a single JSON object otherwise.
//! Invariants: Process exit code is derived from `core::to_exit_code`.
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod cast_paths;
mod command_dispatch;

use clicast::core::{CastStore, Error, ErrorKind, to_exit_code};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                return Ok(RunOutcome::ok());
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `cast --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    init_tracing(color_mode);

    command_dispatch::dispatch_command(cli)
        .map_err(add_missing_file_hint)
        .map_err(add_parse_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "cast",
    version,
    about = "Create or edit cast files",
    long_about = None,
    after_help = r#"EXAMPLES
  View current cast              $ cast
  Add a new message to new file  $ cast "New Message" -f new.cast
  Delete the oldest message      $ cast -d
  Delete the 3 oldest messages   $ cast -d 3
  Set an alert message           $ cast "New Alert" -a
  Set an alert that exits        $ cast "Shutting down" -e
  Unset an alert                 $ cast -d -a

Set RUST_LOG=debug for load/save details."#
)]
struct Cli {
    #[arg(value_name = "MSG", help = "The message to cast")]
    msg: Option<String>,
    #[arg(short = 'a', long, help = "Indicates this is an alert message")]
    alert: bool,
    #[arg(
        short = 'e',
        long = "alert-exit",
        help = "Indicates this is an alert message with exit = true"
    )]
    alert_exit: bool,
    #[arg(
        short = 'd',
        long,
        value_name = "NUM",
        num_args = 0..=1,
        default_missing_value = "1",
        help = "Delete the oldest message (default) or NUM messages, oldest first. Use with --alert to remove the alert message"
    )]
    delete: Option<usize>,
    #[arg(
        short = 'f',
        long,
        value_name = "FILE",
        value_hint = ValueHint::FilePath,
        help = "New or existing cast file to update. Defaults to the only cast file in --dir"
    )]
    file: Option<PathBuf>,
    #[arg(
        long,
        value_name = "DIR",
        value_hint = ValueHint::DirPath,
        help = "Directory searched for *.cast files when --file is absent (default: current directory)"
    )]
    dir: Option<PathBuf>,
    #[arg(long, help = "Print the cast as JSON instead of the framed text view")]
    json: bool,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,
    #[arg(long, value_name = "SHELL", value_enum, help = "Print shell completions and exit")]
    completions: Option<Shell>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

fn init_tracing(color_mode: ColorMode) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .with_ansi(color_mode.use_color(io::stderr().is_terminal()))
        .with_writer(io::stderr)
        .try_init();
}

fn emit_banner(name: &str, store: &CastStore) {
    let rule = "=".repeat(30);
    println!("{rule} {name} {rule}");
    println!("{}", store.render().trim());
    println!("{}", "=".repeat(62 + name.chars().count()));
}

fn emit_json(name: &str, store: &CastStore) {
    let messages = store.messages().iter().collect::<Vec<_>>();
    let value = json!({
        "file": name,
        "messages": messages,
        "alert": store.alert(),
    });
    let json = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    println!("{json}");
}

fn add_missing_file_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::NotFound || err.hint().is_some() {
        return err;
    }
    let hint = match err.path() {
        Some(path) => format!(
            "Create it by adding a message: cast \"New Message\" --file {}",
            path.display()
        ),
        None => "Check the path passed to --file.".to_string(),
    };
    err.with_hint(hint)
}

fn add_parse_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Parse || err.hint().is_some() {
        return err;
    }
    err.with_hint("Cast file is malformed. Fix the reported line or recreate the file.")
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Permission => err.with_hint(
            "Permission denied. Check file and directory permissions or pass a writable --file.",
        ),
        ErrorKind::Io => err.with_hint("I/O error. Check the path, filesystem, and disk space."),
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share the command if it persists.",
    )
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

// Optional context in display order: (label, json key, value).
fn error_context(err: &Error) -> Vec<(&'static str, &'static str, Value)> {
    let mut fields = Vec::new();
    if let Some(hint) = err.hint() {
        fields.push(("hint:", "hint", json!(hint)));
    }
    if let Some(path) = err.path() {
        fields.push(("path:", "path", json!(path.display().to_string())));
    }
    if let Some(line) = err.line() {
        fields.push(("line:", "line", json!(line)));
    }
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    if !causes.is_empty() {
        fields.push(("caused by:", "causes", json!(causes)));
    }
    fields
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert(
        "message".to_string(),
        json!(err.message().unwrap_or(err.kind().describe())),
    );
    for (_, key, value) in error_context(err) {
        inner.insert(key.to_string(), value);
    }
    json!({ "error": inner })
}

fn error_text(err: &Error, use_color: bool) -> String {
    let paint = |label: &str, code: &str| {
        if use_color {
            format!("\u{1b}[{code}m{label}\u{1b}[0m")
        } else {
            label.to_string()
        }
    };
    let mut lines = vec![format!(
        "{} {}",
        paint("error:", "31"),
        err.message().unwrap_or(err.kind().describe())
    )];
    for (label, _, value) in error_context(err) {
        // Only the first cause is shown on a terminal.
        let shown = match value {
            Value::String(text) => text,
            Value::Array(items) => items
                .first()
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            other => other.to_string(),
        };
        lines.push(format!("{} {shown}", paint(label, "33")));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

#[cfg(test)]
mod tests {
    use super::{Cli, error_json, error_text};
    use clap::{CommandFactory, Parser};
    use clicast::core::{Error, ErrorKind};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_delete_defaults_to_one() {
        let cli = Cli::try_parse_from(["cast", "-d"]).expect("parse");
        assert_eq!(cli.delete, Some(1));

        let cli = Cli::try_parse_from(["cast", "-d", "3", "-a"]).expect("parse");
        assert_eq!(cli.delete, Some(3));
        assert!(cli.alert);
    }

    #[test]
    fn message_and_flags_parse() {
        let cli = Cli::try_parse_from(["cast", "Going down", "-e", "-f", "ops.cast"]).expect("parse");
        assert_eq!(cli.msg.as_deref(), Some("Going down"));
        assert!(cli.alert_exit);
        assert!(!cli.alert);
        assert_eq!(cli.file.as_deref(), Some(std::path::Path::new("ops.cast")));
        assert_eq!(cli.delete, None);
    }

    #[test]
    fn error_json_carries_context() {
        let err = Error::new(ErrorKind::Parse)
            .with_message("unknown section [Bogus]")
            .with_hint("fix it")
            .with_path("demo.cast")
            .with_line(3);
        let value = error_json(&err);
        let inner = &value["error"];
        assert_eq!(inner["kind"], "Parse");
        assert_eq!(inner["message"], "unknown section [Bogus]");
        assert_eq!(inner["hint"], "fix it");
        assert_eq!(inner["path"], "demo.cast");
        assert_eq!(inner["line"], 3);
        assert!(inner.get("causes").is_none());
    }

    #[test]
    fn error_text_without_color_is_plain() {
        let err = Error::new(ErrorKind::NoTarget).with_hint("Use --file.");
        assert_eq!(
            error_text(&err, false),
            "error: no cast file found\nhint: Use --file."
        );
    }

    #[test]
    fn error_text_shows_path_and_first_cause() {
        let err = Error::io(
            std::path::Path::new("ops.cast"),
            std::io::Error::other("disk full"),
        );
        assert_eq!(
            error_text(&err, false),
            "error: i/o error\npath: ops.cast\ncaused by: disk full"
        );

        let value = error_json(&err);
        assert_eq!(value["error"]["message"], "i/o error");
        assert_eq!(value["error"]["causes"][0], "disk full");
    }
}
