use std::process;
use std::time::Instant;

use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use termula::{parse, Env, Formula, Scope};

#[derive(Parser, Debug)]
#[command(name = "tm")]
#[command(about = "Rewrite a model formula into its term tree")]
struct Cli {
    /// Formula such as "y ~ a + b * log(c)"
    formula: String,

    /// Bind a variable for evaluating captured calls, e.g. --set c=2.5
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_binding)]
    bindings: Vec<(String, f64)>,

    /// Print the formula as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Start from an empty scope instead of the built-in functions
    #[arg(long)]
    no_builtins: bool,
}

fn parse_binding(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", s))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad value for `{}`: {}", name, e))?;
    Ok((name.trim().to_string(), value))
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "termula=info,tm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let scope = if cli.no_builtins {
        Scope::new()
    } else {
        Scope::with_builtins()
    };

    let now = Instant::now();
    info!("Parsing the formula {}", cli.formula);
    let node = match parse(&cli.formula) {
        Ok(node) => node,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    debug!(?node, "parsed");

    let formula = match Formula::from_node(&node, &scope) {
        Ok(formula) => formula,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    info!("Rewritten in {} us", now.elapsed().as_micros());

    if cli.json {
        match serde_json::to_string_pretty(&formula) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize formula: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("{}", formula);
    }

    if cli.bindings.is_empty() {
        return;
    }
    let env: Env = cli.bindings.into_iter().collect();
    let mut failed = false;
    let lhs = formula.lhs().captured_calls();
    let rhs = formula.rhs().captured_calls();
    for call in lhs.into_iter().chain(rhs) {
        match call.evaluate(&env) {
            Ok(value) => println!("{} = {}", call.original(), value),
            Err(e) => {
                error!("Evaluating {}: {}", call.original(), e);
                failed = true;
            }
        }
    }
    if failed {
        process::exit(1);
    }
}
