use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use arith_script::{Env, FunctionRegistry, Value, Vm, VmConfig};
use clap::Parser;

/// Evaluates a single integer expression and prints the result.
///
/// Variables can be bound individually with `--var name=value` or all at once from a JSON object
/// with `--env`. Individual bindings win over the JSON object.
#[derive(Debug, Parser)]
#[command(name = "arith-eval", version)]
struct Args {
    /// Bind a variable, e.g. `--var a=2`. Values that parse as integers are bound as integers,
    /// anything else as a string.
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
    vars: Vec<(String, Value)>,

    /// A JSON object of variable bindings.
    #[arg(long = "env", value_name = "JSON")]
    env: Option<String>,

    /// Path to a JSON VM config file.
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip constant folding of function calls.
    #[arg(long = "no-optimize")]
    no_optimize: bool,

    /// Start without the builtin functions.
    #[arg(long = "no-builtins")]
    no_builtins: bool,

    /// The expression to evaluate.
    #[arg(value_name = "EXPR")]
    expression: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("opening {}", path.display()))?;
            VmConfig::from_json_reader(file)
                .with_context(|| format!("reading config {}", path.display()))?
        }
        None => VmConfig::default(),
    };
    if args.no_optimize {
        config.optimize = false;
    }
    log::debug!("using config {config:?}");

    let registry = if args.no_builtins {
        FunctionRegistry::new()
    } else {
        FunctionRegistry::builtins()
    };
    let vm = Vm::with_registry(registry, config);

    let env = build_env(args.env.as_deref(), args.vars)?;
    let value = vm
        .eval(&args.expression, &env)
        .with_context(|| format!("evaluating {:?}", args.expression))?;

    println!("{value}");

    Ok(())
}

fn build_env(json: Option<&str>, vars: Vec<(String, Value)>) -> Result<Env> {
    let mut env = Env::new();
    if let Some(json) = json {
        let parsed: serde_json::Value = serde_json::from_str(json).context("parsing --env")?;
        let serde_json::Value::Object(map) = parsed else {
            bail!("--env must be a JSON object");
        };
        env.extend(
            map.into_iter()
                .map(|(name, value)| (name, Value::from_json(value))),
        );
    }
    env.extend(vars);
    Ok(env)
}

fn parse_binding(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
    if name.is_empty() {
        return Err(format!("missing variable name in {raw:?}"));
    }
    let value = match value.parse::<i64>() {
        Ok(number) => Value::Integer(number),
        Err(_) => Value::String(value.to_string()),
    };
    Ok((name.to_string(), value))
}
