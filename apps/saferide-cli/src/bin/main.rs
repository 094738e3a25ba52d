use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use saferide_chat::{handle_json_line, ChatPipeline};
use saferide_core::config::{Config, Settings};

const EXIT_WORDS: [&str; 3] = ["salir", "exit", "quit"];

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <chat|ask|serve-stdin|batch> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn flag_value(args: &[String], name: &str) -> anyhow::Result<Option<usize>> {
    match args.iter().position(|a| a == name) {
        Some(i) => {
            let raw = args.get(i + 1).ok_or_else(|| anyhow::anyhow!("{name} requires a number"))?;
            Ok(Some(raw.parse::<usize>().map_err(|_| anyhow::anyhow!("{name} requires a number, got {raw:?}"))?))
        }
        None => Ok(None),
    }
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<&String> {
    let mut i = 0;
    while i < args.len() {
        if args[i].starts_with("--") { i += 2; continue; }
        return args.get(i);
    }
    None
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn load_pipeline(settings: &Settings) -> anyhow::Result<ChatPipeline> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("loading artifacts from {}", settings.artifacts.base().display()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let pipeline = ChatPipeline::from_settings(settings);
    spinner.finish_and_clear();
    pipeline
}

fn print_typed(text: &str, typing: Duration) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if typing.is_zero() {
        writeln!(out, "{text}")?;
        return out.flush();
    }
    for c in text.chars() {
        write!(out, "{c}")?;
        out.flush()?;
        thread::sleep(typing);
    }
    writeln!(out)
}

fn chat(pipeline: &ChatPipeline, typing: Duration) -> anyhow::Result<()> {
    println!("SafeRide asistente virtual. Escribe 'salir' para terminar.");
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("Tú: ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let utterance = line.trim_end_matches(['\r', '\n']);
        if EXIT_WORDS.iter().any(|w| utterance.trim().eq_ignore_ascii_case(w)) {
            print_typed(&format!("Bot: {}", pipeline.messages().farewell), typing)?;
            return Ok(());
        }
        let text = match pipeline.reply(utterance) {
            Ok(reply) => reply.text,
            Err(e) => {
                tracing::error!(error = %e, "reply failed");
                pipeline.messages().service_failure.clone()
            }
        };
        print_typed(&format!("Bot: {text}"), typing)?;
    }
    Ok(())
}

fn serve_stdin(pipeline: &ChatPipeline) -> anyhow::Result<()> {
    let stdout = io::stdout();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut out = stdout.lock();
        writeln!(out, "{}", handle_json_line(pipeline, &line))?;
        out.flush()?;
    }
    Ok(())
}

/// Resolves every non-empty line of `path` on blocking workers; output keeps input order.
fn batch(pipeline: ChatPipeline, path: PathBuf, concurrency: usize) -> anyhow::Result<()> {
    let raw = fs::read_to_string(&path).map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
    let lines: Vec<String> = raw.lines().filter(|l| !l.trim().is_empty()).map(str::to_string).collect();
    let pipeline = Arc::new(pipeline);

    let pb = ProgressBar::new(lines.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} utterances ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );

    let rows = tokio::runtime::Runtime::new()?.block_on(async {
        futures::stream::iter(lines)
            .map(|utterance| {
                let pipeline = Arc::clone(&pipeline);
                let pb = pb.clone();
                async move {
                    let worker = Arc::clone(&pipeline);
                    let input = utterance.clone();
                    let result = tokio::task::spawn_blocking(move || worker.reply(&input)).await;
                    pb.inc(1);
                    match result {
                        Ok(Ok(reply)) => serde_json::json!({
                            "utterance": utterance,
                            "outcome": reply.outcome,
                            "response": reply.text,
                        }),
                        Ok(Err(e)) => {
                            tracing::error!(error = %e, utterance, "reply failed");
                            serde_json::json!({
                                "utterance": utterance,
                                "outcome": { "kind": "error" },
                                "response": pipeline.messages().service_failure,
                            })
                        }
                        Err(e) => {
                            tracing::error!(error = %e, utterance, "worker panicked");
                            serde_json::json!({
                                "utterance": utterance,
                                "outcome": { "kind": "error" },
                                "response": pipeline.messages().service_failure,
                            })
                        }
                    }
                }
            })
            .buffered(concurrency.max(1))
            .collect::<Vec<_>>()
            .await
    });
    pb.finish_with_message("done");

    let mut out = io::stdout().lock();
    for row in &rows {
        writeln!(out, "{row}")?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "chat" => {
            let typing = Duration::from_millis(flag_value(&args, "--typing-ms")?.unwrap_or(30) as u64);
            let pipeline = load_pipeline(&settings)?;
            chat(&pipeline, typing)?;
        }
        "ask" => {
            let utterance = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: saferide-cli ask \"<mensaje>\""); std::process::exit(1)
            });
            let pipeline = load_pipeline(&settings)?;
            let reply = pipeline.reply(&utterance)?;
            tracing::info!(outcome = reply.outcome.label(), "answered");
            println!("{}", reply.text);
        }
        "serve-stdin" => {
            let pipeline = load_pipeline(&settings)?;
            serve_stdin(&pipeline)?;
        }
        "batch" => {
            let path = positional(&args).map(PathBuf::from).unwrap_or_else(|| {
                eprintln!("Usage: saferide-cli batch <file> [--concurrency N]"); std::process::exit(1)
            });
            let concurrency = flag_value(&args, "--concurrency")?.unwrap_or(4);
            let pipeline = load_pipeline(&settings)?;
            batch(pipeline, path, concurrency)?;
        }
        _ => { eprintln!("Unknown command: {}", cmd); std::process::exit(1); }
    }
    Ok(())
}
