mod config;
mod engine;
mod omnibox;
mod resolve;
mod services;
mod stats;
mod utils;
mod watcher;

use anyhow::Result;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{PrefsLoader, SettingsUpdate};
use engine::{Disposition, Engine};
use omnibox::Suggestion;
use services::builtin_registry;
use stats::StatsStore;
use watcher::SettingsWatcher;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };

    let registry = builtin_registry();
    let prefs = PrefsLoader::load().unwrap_or_else(|e| {
        error!("Failed to load preferences: {}, using defaults", e);
        PrefsLoader::new()
    });
    let stats = StatsStore::load();
    let mut engine = Engine::new(registry, prefs, stats);

    match command.as_str() {
        "suggest" => {
            let text = args[1..].join(" ");
            for suggestion in engine.suggest(&text) {
                println!("{}", render_suggestion(&suggestion));
            }
        }
        "open" => {
            let print_only = args.iter().any(|a| a == "--print");
            let disposition = if args.iter().any(|a| a == "--here") {
                Disposition::CurrentTab
            } else {
                Disposition::NewForegroundTab
            };
            let text: String = args[1..]
                .iter()
                .filter(|a| !a.starts_with("--"))
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");

            if text.trim().is_empty() {
                warn!("Nothing to open; give some text");
                return Ok(());
            }

            if print_only {
                println!("{}", engine.preview_url(&text)?);
            } else {
                engine.submit(&text, disposition)?;
            }
        }
        "selection" => {
            let text = args[1..].join(" ");
            if text.trim().is_empty() {
                warn!("No selection text given");
                return Ok(());
            }
            info!("{}", engine.selection_menu_title().replace("%s", &text));
            engine.search_selection(&text)?;
        }
        "launch" => {
            engine.open_default()?;
        }
        "stats" => {
            print_stats(&engine);
        }
        "set-default" => {
            let Some(id) = args.get(1) else {
                warn!("Usage: ai-omnibar set-default <service-id>");
                return Ok(());
            };
            let update = SettingsUpdate {
                default_service: Some(id.clone()),
                enabled: None,
            };
            engine.apply_settings_update(&update)?;
            println!("Default service is now {}", id);
        }
        "enable" | "disable" => {
            let Some(id) = args.get(1) else {
                warn!("Usage: ai-omnibar {} <service-id>", command);
                return Ok(());
            };
            let update = SettingsUpdate {
                default_service: None,
                enabled: Some(HashMap::from([(id.clone(), command == "enable")])),
            };
            engine.apply_settings_update(&update)?;
            println!("{} {}d", id, command);
        }
        "interactive" => {
            run_interactive(&mut engine)?;
        }
        "--help" | "-h" | "help" => {
            print_usage();
        }
        other => {
            warn!("Unknown command '{}'", other);
            print_usage();
        }
    }

    Ok(())
}

/// Read lines from stdin, showing suggestions per line; a `!` prefix
/// submits the rest of the line. Settings saved by another process are
/// picked up between lines.
fn run_interactive(engine: &mut Engine) -> Result<()> {
    let settings_path = PrefsLoader::load()
        .map(|l| l.path().clone())
        .unwrap_or_default();
    let watcher = match SettingsWatcher::new(settings_path) {
        Ok(mut w) => match w.start() {
            Ok(()) => Some(w),
            Err(e) => {
                warn!("Settings watch unavailable: {}", e);
                None
            }
        },
        Err(e) => {
            warn!("Settings watch unavailable: {}", e);
            None
        }
    };

    println!("Type to see suggestions, '!<text>' to search, empty line to quit.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches('\n');
        if line.trim().is_empty() {
            break;
        }

        if let Some(w) = &watcher {
            if w.settings_changed() {
                if let Err(e) = engine.reload_settings() {
                    warn!("Failed to reload settings: {}", e);
                }
            }
        }

        if let Some(query) = line.strip_prefix('!') {
            match engine.submit(query, Disposition::NewForegroundTab) {
                Ok(url) => println!("→ {}", url),
                Err(e) => error!("Search failed: {}", e),
            }
            continue;
        }

        let suggestions = engine.suggest(line);
        if suggestions.is_empty() {
            println!("  (no suggestions)");
        }
        for suggestion in suggestions {
            println!("  {}", render_suggestion(&suggestion));
        }
    }

    Ok(())
}

/// Render a suggestion for the terminal: matched span bold, note dimmed
fn render_suggestion(suggestion: &Suggestion) -> String {
    let mut out = suggestion.label.text.clone();
    if let Some(matched) = &suggestion.label.matched {
        out.push_str(&format!("\x1b[1m{}\x1b[0m", matched));
    }
    if let Some(note) = &suggestion.label.note {
        out.push_str(&format!(" \x1b[2m({})\x1b[0m", note));
    }
    out.push_str(&format!("  \x1b[2m[{}]\x1b[0m", suggestion.fill_text));
    out
}

fn print_stats(engine: &Engine) {
    let stats = engine.stats().stats();
    println!("Total searches: {}", stats.total_searches);

    println!("\nBy service:");
    for service in engine.registry().iter() {
        println!(
            "  {} {:<14} {}",
            service.icon,
            service.name,
            stats.usage(&service.id)
        );
    }

    if !stats.favorite_services.is_empty() {
        println!("\nFavorites: {}", stats.favorite_services.join(", "));
    }

    if !stats.recent_searches.is_empty() {
        println!("\nRecent searches:");
        for recent in &stats.recent_searches {
            println!("  [{}] {}", recent.service, recent.query);
        }
    }
}

fn print_usage() {
    println!(
        "ai-omnibar - address-bar style launcher for AI services

Usage:
  ai-omnibar suggest <text>         show ranked suggestions
  ai-omnibar open <text> [--print] [--here]
                                    search (print URL / reuse current tab)
  ai-omnibar selection <text>       search selected text with the default service
  ai-omnibar launch                 open the default service's home page
  ai-omnibar stats                  show usage statistics
  ai-omnibar set-default <id>       choose the default service
  ai-omnibar enable <id>            enable a service
  ai-omnibar disable <id>           disable a service
  ai-omnibar interactive            suggestion prompt ('!text' searches)"
    );
}
