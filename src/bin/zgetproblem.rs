//! Find open problems and print them in syslog or html table form.

use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::{ArgGroup, Parser, ValueEnum};

use zbxtools::api::ZabbixApi;
use zbxtools::cli::{init_tracing, ConnectionArgs, CONFIG_EPILOG};
use zbxtools::problem::format::{html_table, summary_line, syslog_line};
use zbxtools::problem::{
    run_follow, run_once, ApiProblemSource, EnrichedProblem, FollowOptions, PollCursor,
    ProblemQuery,
};
use zbxtools::scope::Scope;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// One line per event on stdout.
    Syslog,
    /// A simple static table written to the html output file.
    Html,
}

#[derive(Parser, Debug)]
#[command(
    name = "zgetproblem",
    version,
    about = "Find open problems and print them in syslog or html table",
    after_help = CONFIG_EPILOG,
    group(ArgGroup::new("scope").required(true).args(["hostnames", "hostgroups", "triggerids", "all_hosts"]))
)]
struct Cli {
    /// Hostname(s) to find events for
    #[arg(short = 'H', long, num_args = 1.., value_name = "HOSTNAME")]
    hostnames: Option<Vec<String>>,

    /// Hostgroup(s) to find events for
    #[arg(short = 'G', long, num_args = 1.., value_name = "HOSTGROUP")]
    hostgroups: Option<Vec<String>>,

    /// Triggerid(s) to find events for
    #[arg(short = 'T', long, num_args = 1.., value_name = "TRIGGERID")]
    triggerids: Option<Vec<u64>>,

    /// Find events for all hosts
    #[arg(long)]
    all_hosts: bool,

    /// Use numeric ids instead of names, applies to -H and -G
    #[arg(short = 'n', long)]
    numeric: bool,

    /// Limit the number of returned lines, default is 100. Set to 0 to disable.
    #[arg(short = 'L', long, default_value_t = 100)]
    limit: u64,

    /// Include Acknowledged events, default is to exclude them.
    #[arg(short = 'A', long)]
    include_ack: bool,

    /// Timeperiod in seconds, default is one week. Set to 0 to disable.
    #[arg(short = 't', long, default_value_t = 604_800)]
    time_period: i64,

    /// Unix timestamp to search from
    #[arg(short = 's', long)]
    start_time: Option<i64>,

    /// Output format: syslog (default) or html (simple table).
    #[arg(short = 'o', long, value_enum, default_value = "syslog")]
    output_format: OutputFormat,

    /// Output file for html, default _problems.html
    #[arg(short = 'f', long, default_value = "_problems.html")]
    file_html: PathBuf,

    /// Print a one-line summary count by severity
    #[arg(short = 'S', long)]
    print_summary: bool,

    /// Output only eventids
    #[arg(short = 'i', long)]
    ids: bool,

    /// Keep polling for new events until interrupted
    #[arg(short = 'F', long)]
    follow: bool,

    #[command(flatten)]
    connection: ConnectionArgs,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.follow && cli.output_format == OutputFormat::Html {
        anyhow::bail!("html output is not available in follow mode");
    }

    let config = cli.connection.resolve()?;
    let mut api = ZabbixApi::new(&config)?;
    api.login(&config)?;

    // The session is released on every exit path, including errors.
    let result = query_problems(cli, &mut api);
    api.logout();
    result
}

fn query_problems(cli: &Cli, api: &mut ZabbixApi) -> anyhow::Result<()> {
    let scope = if let Some(hosts) = &cli.hostnames {
        Scope::Hosts(hosts.clone())
    } else if let Some(groups) = &cli.hostgroups {
        Scope::HostGroups(groups.clone())
    } else if let Some(triggers) = &cli.triggerids {
        Scope::Triggers(triggers.clone())
    } else {
        Scope::AllHosts
    };

    let resolved = scope.resolve(api, cli.numeric)?;
    let query = ProblemQuery {
        scope: resolved,
        limit: cli.limit,
        include_ack: cli.include_ack,
    };
    let now = Local::now();
    let mut cursor = PollCursor::from_window(cli.start_time, cli.time_period, now.timestamp());

    let mut source = if cli.ids {
        ApiProblemSource::without_enrichment(api, query)
    } else {
        ApiProblemSource::new(api, query)
    };

    if cli.follow {
        let stop = Arc::new(AtomicBool::new(false));
        let handler_flag = stop.clone();
        ctrlc::set_handler(move || {
            handler_flag.store(true, std::sync::atomic::Ordering::Relaxed);
        })
        .context("could not install the interrupt handler")?;

        let ids_only = cli.ids;
        run_follow(
            &mut source,
            &mut cursor,
            &FollowOptions::default(),
            &stop,
            |batch| emit_batch(batch, ids_only, Local::now().timestamp()),
        )?;
        return Ok(());
    }

    let problems = run_once(&mut source, &mut cursor)?;

    if cli.print_summary && !cli.ids {
        println!("{}", summary_line(&problems, now));
    }

    match cli.output_format {
        // Ages and timestamps render against the execution time fixed at
        // startup, so identical queries print identical output.
        OutputFormat::Syslog => emit_batch(&problems, cli.ids, now.timestamp()),
        OutputFormat::Html => {
            let html = html_table(&problems, now);
            std::fs::write(&cli.file_html, html)
                .with_context(|| format!("writing {}", cli.file_html.display()))?;
        }
    }
    Ok(())
}

fn emit_batch(batch: &[EnrichedProblem], ids_only: bool, now: i64) {
    for problem in batch {
        if ids_only {
            println!("{}", problem.eventid);
        } else {
            println!("{}", syslog_line(problem, now));
        }
    }
}
