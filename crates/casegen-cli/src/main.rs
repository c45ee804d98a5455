//! `casegen` command-line driver

use anyhow::{bail, Context as _, Result};
use casegen_core::prelude::*;
use casegen_core::ChangeDirection;
use chrono::{DateTime, SubsecRound, Utc};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let config_arg = || {
        Arg::new("config")
            .long("config")
            .value_parser(value_parser!(PathBuf))
            .help("TOML configuration file")
    };
    let catalog_arg = || {
        Arg::new("catalog")
            .long("catalog")
            .value_parser(value_parser!(PathBuf))
            .help("YAML or JSON family catalog (overrides the config file)")
    };

    Command::new("casegen")
        .version(casegen_core::VERSION)
        .about("Synthetic historical case generator for manufacturing anomaly investigation")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate a case corpus and write it as a JSON array")
                .arg(config_arg())
                .arg(catalog_arg())
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("repetitions")
                        .long("repetitions")
                        .value_parser(value_parser!(u32))
                        .help("Records per family"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Corpus output path"),
                )
                .arg(
                    Arg::new("reference-time")
                        .long("reference-time")
                        .help("RFC 3339 instant timestamps are drawn back from (default: now)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the run report as JSON"),
                ),
        )
        .subcommand(
            Command::new("catalog")
                .about("Validate and list the family catalog")
                .arg(config_arg())
                .arg(catalog_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("audit")
                .about("Check an existing corpus against the family catalog")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Corpus to audit"),
                )
                .arg(config_arg())
                .arg(catalog_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &ArgMatches) -> Result<CasegenConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => CasegenConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CasegenConfig::default(),
    };
    if let Some(catalog) = args.get_one::<PathBuf>("catalog") {
        config.catalog = Some(catalog.clone());
    }
    Ok(config)
}

fn parse_reference_time(text: Option<&String>) -> Result<DateTime<Utc>> {
    match text {
        Some(text) => Ok(DateTime::parse_from_rfc3339(text)
            .with_context(|| format!("invalid --reference-time '{text}'"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now().trunc_subsecs(0)),
    }
}

fn generate(args: &ArgMatches) -> Result<i32> {
    let mut config = load_config(args)?;
    if let Some(seed) = args.get_one::<u64>("seed") {
        config.seed = *seed;
    }
    if let Some(repetitions) = args.get_one::<u32>("repetitions") {
        config.repetitions_per_family = *repetitions;
    }
    if let Some(output) = args.get_one::<PathBuf>("output") {
        config.output = output.clone();
    }
    let reference_time = parse_reference_time(args.get_one::<String>("reference-time"))?;

    let catalog = config
        .validated_catalog()
        .context("family catalog is invalid")?;
    info!(
        output = %config.output.display(),
        %reference_time,
        custom_catalog = config.catalog.is_some(),
        "resolved run settings"
    );
    let run = Generator::new(&catalog, config.generator_config(reference_time))?
        .run()
        .context("generation aborted, nothing written")?;
    write_cases(&config.output, &run.cases)
        .with_context(|| format!("failed to write {}", config.output.display()))?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&run.report)?);
    } else {
        println!("{}", run.report.generate_text());
        println!("Output: {}", config.output.display());
    }
    Ok(0)
}

fn list_catalog(args: &ArgMatches) -> Result<i32> {
    let config = load_config(args)?;
    let catalog = config
        .validated_catalog()
        .context("family catalog is invalid")?;

    if args.get_flag("json") {
        let families: Vec<_> = catalog.families().iter().map(|f| &f.family).collect();
        println!("{}", serde_json::to_string_pretty(&families)?);
        return Ok(0);
    }

    println!("Family Catalog");
    println!("==============");
    println!();
    for (i, resolved) in catalog.families().iter().enumerate() {
        let family = &resolved.family;
        let signals = &family.signals;
        let change = match signals.change_dir {
            ChangeDirection::Zero => "zero".to_string(),
            dir => format!("{dir} {}", signals.change_bucket),
        };
        println!("{}. {}", i + 1, family.title);
        println!(
            "   yield={} change={} variance={} measurement={} lots={} rework={} window={}",
            signals.yield_bucket,
            change,
            signals.variance_bucket,
            signals.measurement_bucket,
            signals.lots_bucket,
            signals.rework_bucket,
            signals.window_bucket
        );
        if !family.constraints.is_unconstrained() {
            println!("   constraints: {}", serde_json::to_string(&family.constraints)?);
        }
    }
    println!();
    println!("Families: {}", catalog.len());
    Ok(0)
}

fn audit(args: &ArgMatches) -> Result<i32> {
    let Some(path) = args.get_one::<PathBuf>("path") else {
        bail!("missing corpus path");
    };
    let config = load_config(args)?;
    let catalog = config
        .validated_catalog()
        .context("family catalog is invalid")?;
    let cases = read_cases(path).with_context(|| format!("failed to read {}", path.display()))?;
    debug!(path = %path.display(), families = catalog.len(), "auditing corpus");
    let report = audit_cases(&cases, &catalog);

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.generate_text());
    }
    Ok(if report.is_clean() { 0 } else { 1 })
}

fn run(matches: &ArgMatches) -> Result<i32> {
    match matches.subcommand() {
        Some(("generate", args)) => generate(args),
        Some(("catalog", args)) => list_catalog(args),
        Some(("audit", args)) => audit(args),
        Some((other, _)) => bail!("unknown subcommand '{other}'"),
        None => bail!("no subcommand given"),
    }
}

fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let code = match run(&matches) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    };
    std::process::exit(code);
}
