use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use lcm_core::{Batch, Config, LambdaHost, LambdaManifest, LambdaSource, status_code};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod inputs;
mod output;

use output::{BatchReport, CheckReport, LambdaReport, RunReport};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Command::new("lcm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run Lua compute lambdas over data batches");

    let matches = setup_cli(cli).get_matches();
    match dispatch_commands(&matches) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", console::style("error:").for_stderr().red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the `run` and `check` subcommands.
fn setup_cli(cli: Command) -> Command {
    let json = Arg::new("json")
        .help("Print the summary as JSON on stdout")
        .long("json")
        .action(ArgAction::SetTrue);

    cli.subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Register one lambda and process each input file as a batch")
                .arg(
                    Arg::new("lambda")
                        .help("Lua source of the lambda")
                        .required(true)
                        .index(1)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("inputs")
                        .help("Input files or glob patterns; batch ids follow their order, starting at 1")
                        .required(true)
                        .index(2)
                        .num_args(1..)
                        .value_name("PATTERN"),
                )
                .arg(
                    Arg::new("id")
                        .help("Lambda id to register under")
                        .short('i')
                        .long("id")
                        .default_value("1")
                        .value_parser(clap::value_parser!(i32))
                        .value_name("ID"),
                )
                .arg(
                    Arg::new("output")
                        .help("Write each result to DIR/<input file name> instead of stdout")
                        .short('o')
                        .long("output")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_name("DIR"),
                )
                .arg(json.clone()),
        )
        .subcommand(
            Command::new("check")
                .about("Register every lambda listed in a manifest and report the outcome")
                .arg(
                    Arg::new("manifest")
                        .help("Lambda manifest (JSON)")
                        .required(true)
                        .index(1)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(json),
        )
}

fn dispatch_commands(matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    match matches.subcommand() {
        Some(("run", sub_m)) => cmd_run(sub_m),
        Some(("check", sub_m)) => cmd_check(sub_m),
        _ => anyhow::bail!("no valid subcommand was used; see --help"),
    }
}

fn cmd_run(m: &ArgMatches) -> anyhow::Result<ExitCode> {
    let lambda_path = m.get_one::<PathBuf>("lambda").context("missing lambda path")?;
    let lambda_id = *m.get_one::<i32>("id").context("missing lambda id")?;
    let output_dir = m.get_one::<PathBuf>("output");
    let json = m.get_flag("json");
    let patterns: Vec<&str> = m
        .get_many::<String>("inputs")
        .context("missing inputs")?
        .map(String::as_str)
        .collect();

    let inputs = inputs::expand(patterns)?;
    log::debug!("{} input file(s) for lambda {}", inputs.len(), lambda_id);
    let source = LambdaSource::from_file(lambda_id, lambda_path)?;
    if source.is_empty() {
        log::warn!("{} is empty; it cannot register anything", source);
    }
    let targets = match output_dir {
        Some(dir) => {
            let targets = inputs::output_targets(dir, &inputs)?;
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
            Some(targets)
        }
        None => None,
    };

    let progress = output::progress_bar(inputs.len(), output_dir.is_some() || json);
    let config = Config::new().with_log_sink(output::lambda_log_sink(progress.clone()));
    let host = LambdaHost::new(config)?;
    host.register(&source.as_lambda())
        .with_context(|| format!("register {}", source))?;

    let mut batches = Vec::with_capacity(inputs.len());
    let mut stdout = std::io::stdout().lock();
    for (index, path) in inputs.iter().enumerate() {
        let batch_id = i32::try_from(index + 1).context("too many inputs")?;
        let payload = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        progress.set_message(path.display().to_string());

        let result = host.process_owned(&Batch::new(lambda_id, batch_id, &payload));
        let mut report = BatchReport::new(batch_id, path, &result);
        if let Ok(out) = &result {
            match &targets {
                Some(targets) => {
                    let target = &targets[index];
                    fs::write(target, &out.payload)
                        .with_context(|| format!("write {}", target.display()))?;
                    report.output = Some(target.display().to_string());
                }
                None if json => {
                    report.payload = Some(String::from_utf8_lossy(&out.payload).into_owned());
                }
                None => stdout.write_all(&out.payload)?,
            }
        }
        batches.push(report);
        progress.inc(1);
    }
    progress.finish_and_clear();
    stdout.flush()?;

    let report = RunReport {
        lambda_id,
        lambda: lambda_path.display().to_string(),
        batches,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("{}", output::render_run_table(&report));
    }
    Ok(exit_code(report.batches.iter().all(|b| b.code == 0)))
}

fn cmd_check(m: &ArgMatches) -> anyhow::Result<ExitCode> {
    let manifest_path = m.get_one::<PathBuf>("manifest").context("missing manifest path")?;
    let json = m.get_flag("json");

    let manifest = LambdaManifest::load_from_file(manifest_path)?;
    log::debug!("checking {} lambda(s) from {}", manifest.lambdas.len(), manifest_path.display());
    let progress = output::progress_bar(0, false);
    let host = LambdaHost::new(Config::new().with_log_sink(output::lambda_log_sink(progress)))?;
    let outcomes = host.register_manifest(&manifest)?;

    let lambdas = manifest
        .lambdas
        .iter()
        .zip(outcomes.iter())
        .map(|(spec, (_, result))| LambdaReport::new(spec, status_code(result), result.as_ref().err()))
        .collect();
    let report = CheckReport {
        manifest: manifest_path.display().to_string(),
        name: manifest.name.clone(),
        lambdas,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("{}", output::render_check_table(&report));
    }
    Ok(exit_code(report.lambdas.iter().all(|l| l.code == 0)))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
