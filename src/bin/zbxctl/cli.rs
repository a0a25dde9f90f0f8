use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use zbx_manager::types::{AckFilter, Severity};

#[derive(Parser, Debug)]
#[command(author, version, about = "Operator CLI for the Zabbix JSON-RPC API", long_about = None)]
pub struct Cli {
    /// TOML configuration file; missing files are ignored.
    #[arg(long, value_name = "PATH", default_value = "zbx-manager.toml")]
    pub config: PathBuf,

    /// Explicit log filter, e.g. "zbx_manager=debug".
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,

    /// Emit logs as JSON (needs the `json-logs` feature).
    #[arg(long, action = ArgAction::SetTrue)]
    pub json_logs: bool,

    /// Continue when the server reports an unsupported API version.
    #[arg(long, action = ArgAction::SetTrue)]
    pub ignore_version: bool,

    /// Log request and response bodies with secrets masked.
    #[arg(long, action = ArgAction::SetTrue)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the API version reported by the server.
    Version,
    /// Call any API method and print the result.
    Query {
        /// Method name, e.g. `host.get`.
        method: String,
        /// Parameters as JSON; defaults to `{}`.
        params: Option<String>,
    },
    /// Resolve an object's id from its natural key.
    GetId {
        /// Collection name, e.g. `hosts` or `hostgroups`.
        resource: String,
        /// Value of the identifying field (host name, group name, ...).
        name: String,
    },
    /// List current problems, most recent first.
    Problems {
        /// `acked`, `unacked` or `all`.
        #[arg(long, value_name = "FILTER", default_value = "all")]
        ack: AckFilter,
        /// Lowest severity to show, e.g. `warning` or `high`.
        #[arg(long, value_name = "SEVERITY")]
        min_severity: Option<Severity>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use zbx_manager::types::{AckFilter, Severity};

    use super::{Cli, Command};

    #[test]
    fn get_id_takes_resource_and_name() {
        let cli = Cli::try_parse_from(["zbxctl", "--debug", "get-id", "hosts", "web01"])
            .unwrap_or_else(|err| panic!("{err}"));
        assert!(cli.debug);
        assert!(matches!(
            cli.command,
            Command::GetId { ref resource, ref name } if resource == "hosts" && name == "web01"
        ));
    }

    #[test]
    fn query_params_are_optional() {
        let cli = Cli::try_parse_from(["zbxctl", "query", "apiinfo.version"])
            .unwrap_or_else(|err| panic!("{err}"));
        assert!(matches!(cli.command, Command::Query { params: None, .. }));
    }

    #[test]
    fn problems_parse_ack_and_severity_words() {
        let cli = Cli::try_parse_from([
            "zbxctl",
            "problems",
            "--ack",
            "unacked",
            "--min-severity",
            "high",
        ])
        .unwrap_or_else(|err| panic!("{err}"));
        assert!(matches!(
            cli.command,
            Command::Problems {
                ack: AckFilter::Unacked,
                min_severity: Some(Severity::High),
                limit: 20,
            }
        ));
        assert!(Cli::try_parse_from(["zbxctl", "problems", "--ack", "maybe"]).is_err());
    }
}
