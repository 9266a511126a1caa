mod config;
mod output;

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::{EnvSource, load_plan};
use output::{OutputError, RunSummary, init_logging, write_summary};
use pgclone_connect::{ConnectionService, Database, Role};
use pgclone_core::{Error as CoreError, is_plain_identifier};
use pgclone_duplicate::{DuplicationReport, Duplicator};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("output error: {0}")]
    Output(#[from] OutputError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "pgclone",
    version,
    about = "Copy tables and materialized views between Postgres databases"
)]
struct Cli {
    /// Optional KEY=VALUE file with connection settings.
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,
    /// Append JSON log lines to this file.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every entry of a duplication plan.
    Duplicate(DuplicateArgs),
    /// Recreate a materialized view in the target and refresh it there.
    CopyMatview(ObjectArgs),
    /// Snapshot a materialized view into a plain table in the target.
    CopyMatviewAsTable(ObjectArgs),
    /// Print the columns of a relation.
    Describe(DescribeArgs),
}

#[derive(Args, Debug)]
struct DuplicateArgs {
    /// TOML plan with `[[entries]]` tables.
    #[arg(long)]
    plan: PathBuf,
    /// Write a JSON run summary here.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ObjectArgs {
    #[arg(long)]
    schema: String,
    #[arg(long)]
    name: String,
}

impl ObjectArgs {
    /// Both names end up unquoted in DROP/CREATE/REFRESH statements.
    fn validate(&self) -> Result<(), CliError> {
        for (flag, value) in [("--schema", &self.schema), ("--name", &self.name)] {
            if !is_plain_identifier(value) {
                return Err(CoreError::Config(format!(
                    "{flag} {value:?} is not a plain identifier"
                ))
                .into());
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
struct DescribeArgs {
    #[arg(long)]
    schema: String,
    #[arg(long)]
    name: String,
    #[arg(long, value_enum, default_value_t = RoleArg::Source)]
    role: RoleArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Source,
    Target,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Source => Role::Source,
            RoleArg::Target => Role::Target,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let started = Instant::now();
    tracing::info!(event = "run_started", run_id = %run_id, started_at = %started_at.to_rfc3339());

    let env = EnvSource::load(cli.env_file.as_deref())?;
    let result = match cli.command {
        Command::Duplicate(args) => run_duplicate(&env, args, run_id.clone(), started_at).await,
        Command::CopyMatview(args) => run_copy_matview(&env, args).await,
        Command::CopyMatviewAsTable(args) => run_copy_matview_as_table(&env, args).await,
        Command::Describe(args) => run_describe(&env, args).await,
    };

    match &result {
        Ok(()) => tracing::info!(
            event = "run_finished",
            run_id = %run_id,
            elapsed_ms = started.elapsed().as_millis() as u64
        ),
        Err(err) => tracing::error!(event = "run_failed", run_id = %run_id, error = %err),
    }
    result
}

/// Source and target services, connected up front.
struct Pair {
    source: ConnectionService,
    target: ConnectionService,
}

impl Pair {
    async fn open(env: &EnvSource) -> Result<Self, CliError> {
        let source = ConnectionService::new(env.settings(Role::Source)?)?;
        let target = ConnectionService::new(env.settings(Role::Target)?)?;

        source.connect().await?;
        if let Err(err) = target.connect().await {
            source.disconnect().await;
            return Err(err.into());
        }
        Ok(Self { source, target })
    }

    async fn close(self) {
        self.source.disconnect().await;
        self.target.disconnect().await;
    }
}

async fn run_duplicate(
    env: &EnvSource,
    args: DuplicateArgs,
    run_id: String,
    started_at: chrono::DateTime<Utc>,
) -> Result<(), CliError> {
    let plan = load_plan(&args.plan)?;
    if plan.is_empty() {
        tracing::warn!(event = "empty_plan", plan = %args.plan.display());
    }

    let pair = Pair::open(env).await?;
    let outcome = Duplicator::new()
        .duplicate(&pair.source, &pair.target, &plan.entries)
        .await;
    let source = pair.source.settings().to_string();
    let target = pair.target.settings().to_string();
    pair.close().await;

    let report = outcome?;
    print_report(&report);

    if let Some(path) = args.report {
        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            source,
            target,
            report,
        };
        write_summary(&path, &summary)?;
        tracing::info!(event = "summary_written", path = %path.display());
    }
    Ok(())
}

async fn run_copy_matview(env: &EnvSource, args: ObjectArgs) -> Result<(), CliError> {
    args.validate()?;
    let pair = Pair::open(env).await?;
    let outcome = Duplicator::new()
        .copy_materialized_view(&pair.source, &pair.target, &args.schema, &args.name)
        .await;
    pair.close().await;
    outcome?;

    println!("{}.{}: materialized view recreated and refreshed", args.schema, args.name);
    Ok(())
}

async fn run_copy_matview_as_table(env: &EnvSource, args: ObjectArgs) -> Result<(), CliError> {
    args.validate()?;
    let pair = Pair::open(env).await?;
    let outcome = Duplicator::new()
        .copy_materialized_view_as_table(&pair.source, &pair.target, &args.schema, &args.name)
        .await;
    pair.close().await;

    let outcome = outcome?;
    println!(
        "{}.{}: {} rows copied into table",
        outcome.schema, outcome.object_name, outcome.rows_copied
    );
    Ok(())
}

async fn run_describe(env: &EnvSource, args: DescribeArgs) -> Result<(), CliError> {
    let service = ConnectionService::new(env.settings(args.role.into())?)?;
    let columns = service.describe_columns(&args.schema, &args.name).await;
    service.disconnect().await;

    let columns = columns?;
    if columns.is_empty() {
        println!("{}.{}: no columns found", args.schema, args.name);
        return Ok(());
    }
    for column in &columns {
        let nullable = if column.is_nullable { "NULL" } else { "NOT NULL" };
        println!("{}\t{}\t{}", column.name, column.full_type(), nullable);
    }
    Ok(())
}

fn print_report(report: &DuplicationReport) {
    for entry in &report.entries {
        println!(
            "{}.{}\t{}\t{} rows",
            entry.schema,
            entry.object_name,
            entry.kind.label(),
            entry.rows_copied
        );
    }
    println!(
        "{} objects, {} rows copied",
        report.entries.len(),
        report.total_rows()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duplicate_with_global_flags() {
        let cli = Cli::try_parse_from([
            "pgclone",
            "duplicate",
            "--plan",
            "plan.toml",
            "--env-file",
            ".env",
            "--report",
            "out/summary.json",
        ])
        .expect("parse");

        assert_eq!(cli.env_file, Some(PathBuf::from(".env")));
        match cli.command {
            Command::Duplicate(args) => {
                assert_eq!(args.plan, PathBuf::from("plan.toml"));
                assert_eq!(args.report, Some(PathBuf::from("out/summary.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn describe_defaults_to_source() {
        let cli = Cli::try_parse_from(["pgclone", "describe", "--schema", "public", "--name", "users"])
            .expect("parse");
        match cli.command {
            Command::Describe(args) => assert!(matches!(args.role, RoleArg::Source)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn object_names_must_be_plain_identifiers() {
        let args = ObjectArgs {
            schema: "public".to_string(),
            name: "mv; DROP TABLE users".to_string(),
        };
        let err = args.validate().expect_err("unsafe name");
        assert!(err.to_string().contains("--name"));

        let args = ObjectArgs {
            schema: "Public".to_string(),
            name: "mv_stats".to_string(),
        };
        assert!(args.validate().is_err());

        let args = ObjectArgs {
            schema: "public".to_string(),
            name: "mv_stats".to_string(),
        };
        assert!(args.validate().is_ok());
    }

    #[test]
    fn copy_matview_requires_name() {
        assert!(Cli::try_parse_from(["pgclone", "copy-matview", "--schema", "public"]).is_err());
    }
}
