//! Interactive REPL.
//!
//! Launch with `phishguard repl`. Type a URL to analyse it, `/help` for
//! commands, Tab for completion.

use std::path::PathBuf;

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};

use phishguard::{extract_features, Detector};

use crate::config::{resolve_model_path, resolve_scaler_path};
use crate::render;

/// Available REPL commands.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/features", "Toggle the extracted feature table"),
    ("/load", "Load artifacts: /load <model> <scaler>"),
    ("/status", "Show loaded artifacts"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// REPL helper for tab completion.
#[derive(Default)]
struct PhishHelper;

impl Completer for PhishHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if input.starts_with('/') && !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<16} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        // artifact file completion for /load
        if let Some(args) = input.strip_prefix("/load ") {
            let current = args.rsplit(' ').next().unwrap_or("");
            let files = artifact_files_in_cwd();
            let prefix_start = input.len() - current.len();
            let matches: Vec<Pair> = files
                .iter()
                .filter(|f| f.starts_with(current))
                .map(|f| Pair {
                    display: f.clone(),
                    replacement: format!("{f} "),
                })
                .collect();
            return Ok((prefix_start, matches));
        }

        Ok((pos, Vec::new()))
    }
}

fn artifact_files_in_cwd() -> Vec<String> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(".") {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "onnx" || e == "json") {
                if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                    files.push(name.to_string());
                }
            }
        }
    }
    files.sort();
    files
}

impl Hinter for PhishHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() {
            return None;
        }
        if line.starts_with('/') && !line.contains(' ') {
            for (cmd, _) in COMMANDS {
                if cmd.starts_with(line) && *cmd != line {
                    return Some(cmd[line.len()..].to_string());
                }
            }
        }
        None
    }
}

impl Highlighter for PhishHelper {}
impl Validator for PhishHelper {}
impl Helper for PhishHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// Session state.
struct ReplState {
    detector: Option<Detector>,
    model_path: PathBuf,
    scaler_path: PathBuf,
    show_features: bool,
}

/// Run the interactive REPL.
pub fn run(model: Option<&str>, scaler: Option<&str>) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mphishguard v{}\x1b[0m \x1b[90m- Phishing URL detection\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "    Paste a URL to analyse it. \x1b[36m/help\x1b[0m for commands, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<PhishHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(PhishHelper));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".phishguard_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let mut state = ReplState {
        detector: None,
        model_path: resolve_model_path(model),
        scaler_path: resolve_scaler_path(scaler),
        show_features: false,
    };
    load_detector(&mut state);

    let prompt = " \x1b[36murl>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let Some(input) = line.strip_prefix('/') else {
                    analyse(line, &state);
                    continue;
                };

                let mut parts = input.splitn(2, ' ');
                let cmd = parts.next().unwrap_or("");
                let args = parts.next().unwrap_or("").trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  Goodbye!");
                        break;
                    }
                    "" | "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "features" => {
                        state.show_features = !state.show_features;
                        eprintln!(
                            "  Feature table {}",
                            if state.show_features { "on" } else { "off" }
                        );
                    }
                    "load" => cmd_load(args, &mut state),
                    "status" => cmd_status(&state),
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = std::fs::create_dir_all(hist_path.parent().unwrap_or(std::path::Path::new(".")));
    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn load_detector(state: &mut ReplState) {
    match Detector::load(&state.model_path, &state.scaler_path) {
        Ok(detector) => {
            eprintln!(
                "  Loaded model {} ({})",
                state.model_path.display(),
                detector.classifier().describe()
            );
            state.detector = Some(detector);
        }
        Err(e) => {
            eprintln!("  No model loaded: {e}");
            eprintln!("  Use /load <model> <scaler>. URLs will show features only.");
            state.detector = None;
        }
    }
}

fn analyse(url: &str, state: &ReplState) {
    eprintln!();
    match &state.detector {
        Some(detector) => match detector.classify_url(url) {
            Ok(report) => eprint!("{}", indent(&render::report_text(&report, state.show_features))),
            Err(e) => eprintln!("  Error: {e}"),
        },
        None => {
            eprintln!("  (no model loaded, showing features)");
            eprint!("{}", render::feature_table(&extract_features(url)));
        }
    }
    eprintln!();
}

fn indent(text: &str) -> String {
    text.lines().map(|l| format!("  {l}\n")).collect()
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!("  Anything not starting with '/' is analysed as a URL.");
    eprintln!();
}

fn cmd_load(args: &str, state: &mut ReplState) {
    let mut paths = args.split_whitespace();
    match (paths.next(), paths.next()) {
        (Some(model), Some(scaler)) => {
            state.model_path = PathBuf::from(model);
            state.scaler_path = PathBuf::from(scaler);
            load_detector(state);
        }
        _ => eprintln!("  Usage: /load <model.onnx|model.json> <scaler.json>"),
    }
}

fn cmd_status(state: &ReplState) {
    eprintln!();
    eprintln!("  Model:    {}", state.model_path.display());
    eprintln!("  Scaler:   {}", state.scaler_path.display());
    eprintln!(
        "  Loaded:   {}",
        state
            .detector
            .as_ref()
            .map_or("no".to_string(), |d| d.classifier().describe())
    );
    eprintln!(
        "  Features: {}",
        if state.show_features { "shown" } else { "hidden" }
    );
    eprintln!();
}
