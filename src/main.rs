use chat_sentinel::config::loader::load_config;
use chat_sentinel::phone_lookup::RiskLevel;
use chat_sentinel::Config;
use clap::{Arg, Command};
use log::LevelFilter;
use std::io::Read;
use std::process;

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("/etc/chat-sentinel.yaml");

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        test_config(&config);
        return;
    }

    let classifier = match config.classifier() {
        Ok(classifier) => classifier,
        Err(e) => {
            eprintln!("Invalid rule configuration: {e:#}");
            process::exit(1);
        }
    };

    if matches.get_flag("list-rules") {
        println!("📋 Active moderation rules (tie break: {:?})", classifier.tie_break());
        println!("═══════════════════════════════════════");
        for (i, rule) in classifier.rules().rules().iter().enumerate() {
            println!(
                "  Rule {}: [{}] {:?} - {}",
                i + 1,
                rule.category,
                rule.severity,
                rule.description
            );
            println!("    Keywords: {}", rule.keywords.join(", "));
        }
        return;
    }

    if let Some(number) = matches.get_one::<String>("phone") {
        lookup_phone(&config, number).await;
        return;
    }

    let raw = if let Some(text) = matches.get_one::<String>("message") {
        text.clone()
    } else if let Some(file) = matches.get_one::<String>("file") {
        match read_input(file) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("❌ Error reading message: {e:#}");
                process::exit(1);
            }
        }
    } else {
        eprintln!("Nothing to do: pass --message, --file, --phone or --list-rules");
        process::exit(2);
    };

    let Some(text) = message_text(&raw) else {
        eprintln!("❌ Message is empty");
        process::exit(1);
    };

    let verdict = classifier.classify(text);
    log::info!(
        "Classified message ({} chars): {} / {}",
        text.chars().count(),
        verdict.classification,
        verdict.action
    );

    if matches.get_flag("json") {
        match serde_json::to_string_pretty(&verdict) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("❌ Failed to encode verdict: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("{}", verdict.report());
    }
}

fn cli() -> Command {
    Command::new("chat-sentinel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Heuristic moderation verdicts for group chat messages")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/chat-sentinel.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("message")
                .short('m')
                .long("message")
                .value_name("TEXT")
                .help("Message text to classify")
                .conflicts_with("file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Read the message to classify from a file ('-' for stdin)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("phone")
                .long("phone")
                .value_name("NUMBER")
                .help("Look up a phone number with the configured lookup service")
                .conflicts_with_all(["message", "file"])
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("list-rules")
                .long("list-rules")
                .help("List the active moderation rules")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the message verdict as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging with per-rule matches")
                .action(clap::ArgAction::SetTrue),
        )
}

/// Trimmed message text, or `None` when nothing is left to classify.
fn message_text(raw: &str) -> Option<&str> {
    let text = raw.trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn read_input(file: &str) -> anyhow::Result<String> {
    use anyhow::Context;

    if file == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {file}"))
    }
}

fn test_config(config: &Config) {
    println!("🔍 Testing configuration...");
    println!();

    match config.validate() {
        Ok(()) => {
            match config.rule_set() {
                Ok(rules) => {
                    println!("Number of rules: {}", rules.len());
                    println!("Number of keywords: {}", rules.all_keywords().len());
                }
                Err(e) => println!("Rule set error: {e:#}"),
            }
            match &config.phone_lookup {
                Some(lookup) => println!("Phone lookup endpoint: {}", lookup.endpoint),
                None => println!("Phone lookup: not configured"),
            }
            println!("✅ Configuration validated");
        }
        Err(e) => {
            println!("❌ Configuration validation failed:");
            println!("Error: {e:#}");
            process::exit(1);
        }
    }
}

async fn lookup_phone(config: &Config, number: &str) {
    let number = number.trim();
    if number.is_empty() {
        eprintln!("❌ Phone number is empty");
        process::exit(1);
    }

    let client = match config.phone_client() {
        Ok(Some(client)) => client,
        Ok(None) => {
            eprintln!("❌ Phone lookup is not configured. Set phone_lookup.endpoint in configuration.");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    };

    let report = client.lookup(number).await;
    println!("Risk level: {}", report.risk_level);
    println!("{}", report.report);

    if report.risk_level == RiskLevel::Error {
        process::exit(1);
    }
}

fn generate_default_config(path: &str) {
    match Config::default().to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}
