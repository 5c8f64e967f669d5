use std::sync::Arc;
use std::time::Instant;

use clap::{arg, command, value_parser, ArgMatches, Command};
use colored::Colorize;
use inet::engine::{Engine, EngineConfig, Strategy};
use inet::runtime::{verify_confluence, verify_deterministic, Outcome};
use inet::spawn::TokioSpawn;
use inet::systems::{peano, System};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let operands = |name: &'static str, about: &'static str| {
        Command::new(name)
            .about(about)
            .arg(arg!(<a> "First operand").value_parser(value_parser!(usize)))
            .arg(arg!(<b> "Second operand").value_parser(value_parser!(usize)))
    };
    let matches = command!()
        .subcommand_required(true)
        .arg(
            arg!(--"max-steps" <STEPS> "Stop after this many rewrites")
                .value_parser(value_parser!(usize))
                .global(true),
        )
        .arg(arg!(--parallel "Rewrite all active pairs at once, in rounds").global(true))
        .arg(arg!(--show "Print the net after reduction").global(true))
        .arg(arg!(--json "Print statistics as JSON").global(true))
        .subcommand(operands("add", "Add two numbers with Peano interaction rules"))
        .subcommand(operands("mul", "Multiply two numbers with Peano interaction rules"))
        .subcommand(
            Command::new("rules")
                .about("Print a rule system and check it")
                .arg(arg!(<system> "peano or combinators").value_parser(value_parser!(System))),
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("add", args)) => run_arithmetic(args, "+"),
        Some(("mul", args)) => run_arithmetic(args, "*"),
        Some(("rules", args)) => {
            let system = *args.get_one::<System>("system").unwrap();
            show_rules(system, args.get_flag("json"))
        }
        _ => unreachable!(),
    };
    if let Err(report) = result {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn config(args: &ArgMatches) -> EngineConfig {
    EngineConfig {
        max_steps: args.get_one::<usize>("max-steps").copied(),
        strategy: if args.get_flag("parallel") {
            Strategy::Parallel
        } else {
            Strategy::Sequential
        },
    }
}

fn run_arithmetic(args: &ArgMatches, operator: &str) -> miette::Result<()> {
    let a = *args.get_one::<usize>("a").unwrap();
    let b = *args.get_one::<usize>("b").unwrap();
    let mut net = match operator {
        "+" => peano::add(a, b),
        _ => peano::mul(a, b),
    }
    .map_err(|error| error.to_report())?;
    let rules = peano::rules().map_err(|error| error.to_report())?;

    let config = config(args);
    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let spawner = Arc::new(TokioSpawn::from_handle(runtime.handle().clone()));
    let engine = Engine::new(config, rules, spawner);

    let start = Instant::now();
    let normalized = runtime
        .block_on(engine.run(&mut net))
        .map_err(|error| error.to_report())?;
    let elapsed = start.elapsed();

    match normalized.outcome {
        Outcome::NormalForm => match peano::read_nat(&net) {
            Some(n) => println!("{a} {operator} {b} = {}", n.to_string().bright_green()),
            None => println!("{}", "The normal form is not a number".bright_red()),
        },
        Outcome::Diverging => println!(
            "{}",
            format!("Gave up after {} steps", normalized.steps).bright_yellow()
        ),
    }

    if args.get_flag("show") {
        println!("{}", "Net:".bright_blue());
        print!("{}", net.show_indent(1));
    }

    if args.get_flag("json") {
        let report = serde_json::json!({
            "config": engine.config(),
            "result": normalized,
            "rewrites": net.rewrites,
            "elapsed_ms": elapsed.as_millis() as u64,
        });
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
    } else {
        println!("{}", "Stats:".bright_blue());
        print!("{}", net.rewrites.show(elapsed));
    }
    Ok(())
}

fn show_rules(system: System, json: bool) -> miette::Result<()> {
    let rules = system.rules().map_err(|error| error.to_report())?;
    let deterministic = verify_deterministic(rules.rules().map(|rule| &**rule));
    let confluent = verify_confluence(&rules);

    if json {
        let report = serde_json::json!({
            "system": system.name(),
            "rules": rules.rules().map(|rule| rule.key().to_string()).collect::<Vec<_>>(),
            "deterministic": deterministic.is_ok(),
            "asymmetric": confluent
                .err()
                .unwrap_or_default()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        return Ok(());
    }

    println!("{}", format!("Rule system `{system}`").bright_blue());
    print!("{}", rules.show());
    match deterministic {
        Ok(()) => println!("{}", "deterministic".bright_green()),
        Err(keys) => {
            for key in keys {
                println!("{}: {key}", "ambiguous".bright_red());
            }
        }
    }
    match confluent {
        Ok(()) => println!("{}", "confluent".bright_green()),
        Err(keys) => {
            for key in keys {
                println!("{}: {key}", "not symmetric".bright_red());
            }
        }
    }
    Ok(())
}
