use std::fs;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use refcache_sdk::{Cache, CacheConfig, OpResult, ThreadState};
use tracing::debug;

use crate::cli::*;
use crate::script::{self, Op, Outcome};

/// Dispatch a parsed command line.
pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Run(args) => cmd_run(args, config, &cli.format),
        Command::Config => cmd_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CacheConfig> {
    let Some(path) = path else {
        return Ok(CacheConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    CacheConfig::from_toml_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn cmd_config(config: &CacheConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn cmd_run(args: RunArgs, config: CacheConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.script)
        .with_context(|| format!("reading script {}", args.script.display()))?;
    let ops = script::parse_script(&text)
        .with_context(|| format!("parsing script {}", args.script.display()))?;
    debug!(ops = ops.len(), script = %args.script.display(), "loaded script");

    let cache = Cache::with_config(config)?;
    let mut failures = 0usize;
    for (step, op) in ops.iter().enumerate() {
        match op.apply(&cache) {
            Ok(outcome) => print_outcome(step, op, &outcome, format)?,
            Err(err) if args.keep_going => {
                failures += 1;
                print_failure(step, op, &err.to_string(), format)?;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("step {step} ({}) failed", op.name()));
            }
        }
    }

    if args.dump {
        let dump = cache.dump()?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::json!({ "dump": dump })),
            OutputFormat::Text => println!("{}", serde_json::to_string_pretty(&dump)?),
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} of {} operations failed", ops.len());
    }
    Ok(())
}

fn print_outcome(step: usize, op: &Op, outcome: &Outcome, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let line = serde_json::json!({ "step": step, "op": op.name(), "result": outcome });
            println!("{}", serde_json::to_string(&line)?);
        }
        OutputFormat::Text => println!("{} {}", prefix(step, op), render(outcome)?),
    }
    Ok(())
}

fn print_failure(step: usize, op: &Op, message: &str, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let line = serde_json::json!({ "step": step, "op": op.name(), "error": message });
            println!("{}", serde_json::to_string(&line)?);
        }
        OutputFormat::Text => println!("{} {} {}", prefix(step, op), "✗".red().bold(), message.red()),
    }
    Ok(())
}

fn prefix(step: usize, op: &Op) -> String {
    format!("{:>3} {:<6}", step.to_string().dimmed(), op.name().bold())
}

fn render(outcome: &Outcome) -> anyhow::Result<String> {
    Ok(match outcome {
        Outcome::Write(result) => render_write(result),
        Outcome::Value(value) if value.is_null() => "not found".dimmed().to_string(),
        Outcome::Value(value) => value.to_string(),
        Outcome::Count(n) => n.to_string().cyan().to_string(),
        Outcome::State(Some(state)) => render_state(state),
        Outcome::State(None) => "no such thread".dimmed().to_string(),
        Outcome::Dump(dump) => serde_json::to_string_pretty(dump)?,
        Outcome::Reset => format!("{} cache reset", "✓".green()),
    })
}

fn render_write(result: &OpResult) -> String {
    let mut out = match (result.success, result.node) {
        (true, Some(node)) => format!("{} node {}", "✓".green().bold(), node.to_string().yellow()),
        (true, None) => format!("{}", "✓".green().bold()),
        (false, _) => format!("{} no change", "–".yellow()),
    };
    for (id, state) in &result.threads {
        out.push_str(&format!("  {} {}", id.to_string().green(), render_state(state)));
    }
    out
}

fn render_state(state: &ThreadState) -> String {
    let flag = |on: bool, label: &str| {
        if on {
            label.normal().to_string()
        } else {
            label.dimmed().to_string()
        }
    };
    format!(
        "{}/{} [{} {}]",
        state.current + 1,
        state.length,
        flag(state.has_prev, "undo"),
        flag(state.has_next, "redo"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_noop_write() {
        colored::control::set_override(false);
        assert_eq!(render_write(&OpResult::noop()), "– no change");
    }

    #[test]
    fn render_thread_state() {
        colored::control::set_override(false);
        let state = ThreadState {
            length: 3,
            current: 1,
            has_prev: true,
            has_next: true,
        };
        assert_eq!(render_state(&state), "2/3 [undo redo]");
    }

    #[test]
    fn default_config_without_file() {
        assert_eq!(load_config(None).unwrap(), CacheConfig::default());
        assert!(load_config(Some(Path::new("/nonexistent/refcache.toml"))).is_err());
    }
}
