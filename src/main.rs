//! cfn-hook-guard CLI
//!
//! Usage:
//!   cfn-hook-guard [OPTIONS] check [FILE]
//!   cfn-hook-guard [OPTIONS] hook [REQUEST]
//!   cfn-hook-guard [OPTIONS] resources [--json] [FILE]
//!
//! Options:
//!   -r, --rules <FILE>     Rule set file (TOML format)
//!   --preset <NAME>        Built-in rule set (default, event-bus-policy, lambda-multi-az)
//!   --timeout <SECS>       Payload fetch timeout for `hook`
//!   -v, --verbose          Debug logging
//!   --log-json             Emit logs as JSON lines
//!   -h, --help             Print help

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cfn_hook_guard::{
    aggregate, FetchConfig, HookHandler, HookRequest, HttpFetcher, RuleSet, Template,
};

#[derive(Parser)]
#[command(name = "cfn-hook-guard")]
#[command(about = "Compliance checks for infrastructure templates")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Rule set file (TOML format)
    #[arg(short, long, global = true)]
    rules: Option<PathBuf>,

    /// Built-in rule set, used when no rules file is given
    #[arg(long, global = true, default_value = "default")]
    preset: String,

    /// Payload fetch timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    timeout: u64,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a template file (reads from stdin if not provided)
    Check { input: Option<PathBuf> },

    /// Handle a hook request JSON (reads from stdin if not provided)
    Hook { request: Option<PathBuf> },

    /// List the resources recovered from a template
    Resources {
        input: Option<PathBuf>,

        /// Print resources as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let rules = load_rules(&cli);
    debug!(rule_set = rules.name.as_deref().unwrap_or("-"), rules = rules.len(), "rule set loaded");

    match &cli.command {
        Command::Check { input } => run_check(input.as_deref(), &rules),
        Command::Hook { request } => run_hook(request.as_deref(), rules, cli.timeout),
        Command::Resources { input, json } => run_resources(input.as_deref(), *json),
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn load_rules(cli: &Cli) -> RuleSet {
    let loaded = match &cli.rules {
        Some(path) => RuleSet::from_file(path).map_err(|e| {
            format!("Error loading rule set '{}': {}", path.display(), e)
        }),
        None => RuleSet::preset(&cli.preset).map_err(|e| format!("Error: {}", e)),
    };
    loaded.unwrap_or_else(|message| {
        eprintln!("{}", message);
        process::exit(2);
    })
}

fn read_input(path: Option<&Path>) -> String {
    match path {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                process::exit(2);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    process::exit(2);
                }
            }
        }
    }
}

fn display_name(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string())
}

fn report_diagnostics(template: &Template, filename: &str) {
    let Some(source) = template.source() else {
        return;
    };
    for diagnostic in template.diagnostics() {
        eprint!("{}", diagnostic.format(source, filename));
    }
}

fn run_check(input: Option<&Path>, rules: &RuleSet) {
    let source = read_input(input);
    let template = Template::parse(&source);
    report_diagnostics(&template, &display_name(input));

    let verdicts = cfn_hook_guard::rules::evaluate(template.resources(), rules);
    let verdict = aggregate(&verdicts);

    if verdict.compliant {
        println!("PASS: {}", verdict.message);
        return;
    }

    println!("FAIL: {}", verdict.message);
    for failed in verdicts.iter().filter(|v| !v.compliant) {
        match &failed.resource {
            Some(name) => println!("  - [{}] {}", name, failed.message),
            None => println!("  - {}", failed.message),
        }
    }
    process::exit(1);
}

fn run_hook(request: Option<&Path>, rules: RuleSet, timeout: u64) {
    let raw = read_input(request);
    let request: HookRequest = match serde_json::from_str(&raw) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error parsing hook request: {}", e);
            process::exit(2);
        }
    };

    let config = FetchConfig::new().with_timeout(Duration::from_secs(timeout));
    let fetcher = match HttpFetcher::new(&config) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    let response = HookHandler::new(fetcher, rules).handle(&request);
    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing response: {}", e);
            process::exit(2);
        }
    }
    if !response.is_success() {
        process::exit(1);
    }
}

fn run_resources(input: Option<&Path>, json: bool) {
    let source = read_input(input);
    let template = Template::parse(&source);
    report_diagnostics(&template, &display_name(input));

    if json {
        match serde_json::to_string_pretty(template.resources()) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error serializing resources: {}", e);
                process::exit(2);
            }
        }
        return;
    }

    for resource in template.resources() {
        if resource.properties.is_empty() {
            println!("{}  {}", resource.name, resource.resource_type);
        } else {
            println!(
                "{}  {}  {}",
                resource.name, resource.resource_type, resource.properties
            );
        }
    }
}
