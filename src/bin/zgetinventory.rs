//! Dump inventory data for the selected host(s) as CSV.

use std::io;
use std::process;

use clap::{ArgGroup, Parser};

use zbxtools::api::ZabbixApi;
use zbxtools::cli::{init_tracing, ConnectionArgs, CONFIG_EPILOG};
use zbxtools::inventory::{fetch_inventory, write_csv, FieldSelection, InventoryQuery};
use zbxtools::scope::Scope;

#[derive(Parser, Debug)]
#[command(
    name = "zgetinventory",
    version,
    about = "Queries inventory data for the specified host(s) or hostgroup(s)",
    after_help = CONFIG_EPILOG,
    group(ArgGroup::new("scope").required(true).args(["hostnames", "hostgroups", "all_hosts"])),
    group(ArgGroup::new("selection").required(true).args(["all_fields", "fields"]))
)]
struct Cli {
    /// Hostname(s) to find inventory data for
    #[arg(short = 'H', long, num_args = 1.., value_name = "HOSTNAME")]
    hostnames: Option<Vec<String>>,

    /// Hostgroup(s) whose member hosts are queried
    #[arg(short = 'G', long, num_args = 1.., value_name = "HOSTGROUP")]
    hostgroups: Option<Vec<String>>,

    /// Query *ALL* hosts, use with caution
    #[arg(long)]
    all_hosts: bool,

    /// Use numeric ids instead of names, applies to -H and -G
    #[arg(short = 'n', long)]
    numeric: bool,

    /// Only return data for monitored hosts
    #[arg(short = 'm', long)]
    monitored: bool,

    /// Only return data for hosts that have inventory
    #[arg(short = 'i', long)]
    with_inventory: bool,

    /// Return data from all inventory fields
    #[arg(short = 'A', long)]
    all_fields: bool,

    /// A list of inventory fields to return
    #[arg(short = 'F', long, num_args = 1.., value_name = "FIELD")]
    fields: Option<Vec<String>>,

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
    let config = cli.connection.resolve()?;
    let mut api = ZabbixApi::new(&config)?;
    api.login(&config)?;

    let result = dump_inventory(cli, &mut api);
    api.logout();
    result
}

fn dump_inventory(cli: &Cli, api: &mut ZabbixApi) -> anyhow::Result<()> {
    let scope = if let Some(hosts) = &cli.hostnames {
        Scope::Hosts(hosts.clone())
    } else if let Some(groups) = &cli.hostgroups {
        Scope::HostGroups(groups.clone())
    } else {
        Scope::AllHosts
    };
    let fields = if let Some(fields) = &cli.fields {
        FieldSelection::Fields(fields.clone())
    } else {
        FieldSelection::All
    };

    let query = InventoryQuery {
        scope,
        numeric: cli.numeric,
        monitored: cli.monitored,
        with_inventory: cli.with_inventory,
        fields,
    };
    let rows = fetch_inventory(api, &query)?;
    write_csv(&rows, &query.fields, io::stdout().lock())?;
    Ok(())
}
