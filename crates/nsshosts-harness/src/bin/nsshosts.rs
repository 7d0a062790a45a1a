//! CLI entrypoint: query a hosts file the way the NSS modules do.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use nsshosts_core::{AliasOrder, Family, FixedPath, HostConf, HostsDb, LookupPolicy, ProbeOrder};
use nsshosts_harness::{ConfView, HarnessError, Query, run};
use tracing_subscriber::EnvFilter;

/// Look up names and addresses in a hosts file.
#[derive(Debug, Parser)]
#[command(name = "nsshosts")]
#[command(about = "Query a hosts file through the nsshosts engine")]
struct Cli {
    /// Hosts file to read (required for lookups).
    #[arg(long)]
    file: Option<PathBuf>,
    /// Return every matching entry instead of the first (overrides host.conf).
    #[arg(long)]
    multi: bool,
    /// Size of the result buffer in bytes.
    #[arg(long, default_value_t = 1024)]
    buflen: usize,
    /// Try IPv6 before IPv4 for name lookups without --family.
    #[arg(long)]
    inet6_first: bool,
    /// List aliases in file order instead of stack order.
    #[arg(long)]
    discovery_order: bool,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
    /// Append a hex dump of the result buffer to each record.
    #[arg(long)]
    dump: bool,
    /// Emit debug traces on stderr (filter with RUST_LOG).
    #[arg(long, short)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Forward lookup by host name.
    Name {
        host: String,
        /// Restrict to one address family.
        #[arg(long, value_enum)]
        family: Option<FamilyArg>,
    },
    /// Reverse lookup by address literal.
    Addr { literal: String },
    /// List every entry of the file.
    Enumerate,
    /// Show the host.conf settings and the resulting lookup policy.
    Conf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FamilyArg {
    Inet,
    Inet6,
}

impl From<FamilyArg> for Family {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Inet => Family::Inet,
            FamilyArg::Inet6 => Family::Inet6,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match execute(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("nsshosts: {err}");
            ExitCode::from(1)
        }
    }
}

fn execute(cli: &Cli) -> Result<u8, HarnessError> {
    let conf = HostConf::load();
    let mut policy = LookupPolicy::from_host_conf(&conf);
    if cli.multi {
        policy = policy.with_multi(true);
    }
    if cli.inet6_first {
        policy = policy.with_probe_order(ProbeOrder::Inet6First);
    }
    if cli.discovery_order {
        policy = policy.with_alias_order(AliasOrder::Discovery);
    }

    let query = match &cli.command {
        Command::Name { host, family } => Query::Name {
            host: host.clone(),
            family: family.map(Family::from),
        },
        Command::Addr { literal } => Query::addr(literal)?,
        Command::Enumerate => Query::Enumerate,
        Command::Conf => {
            let view = ConfView::new(&conf, &policy);
            if cli.json {
                println!("{}", view.to_json()?);
            } else {
                print!("{}", view.to_text());
            }
            return Ok(0);
        }
    };

    let file = cli.file.as_ref().ok_or(HarnessError::NoFile)?;
    let db = HostsDb::new(FixedPath::new(file), policy);
    let report = run(&db, &query, cli.buflen, cli.dump);

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(u8::try_from(report.exit_code()).unwrap_or(1))
}
