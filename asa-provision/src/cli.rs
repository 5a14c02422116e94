use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "asa-provision")]
#[command(about = "Resolve zones and provision inbound ACL rules on REST-managed firewalls")]
pub struct Cli {
    /// Settings file; any subset of the embedded defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Show how address (or service) literals are classified and encoded.
    Classify(ClassifyArgs),
    /// Resolve the zone of an address by longest-prefix match.
    Resolve(ResolveArgs),
    /// Resolve the zone of a network object group.
    GroupZone(GroupZoneArgs),
    /// Provision every row of a CSV rule list against a snapshot.
    Provision(ProvisionArgs),
    /// Generate the network object name and payload for a literal.
    NameObject(NameObjectArgs),
    /// Show the decoded inbound ACL of a zone.
    ShowAcl(ShowAclArgs),
    /// List the access groups binding ACLs to zones.
    ListAcls(ListAclsArgs),
}

#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    #[arg(required = true)]
    pub literals: Vec<String>,
    /// Classify as services instead of addresses.
    #[arg(long)]
    pub service: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Snapshot directory (routes.json, acls/, ...).
    #[arg(long)]
    pub snapshot: PathBuf,
    pub address: String,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct GroupZoneArgs {
    #[arg(long)]
    pub snapshot: PathBuf,
    pub group: String,
    /// Also check that every member resolves to the same zone.
    #[arg(long)]
    pub check_members: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ProvisionArgs {
    #[arg(long)]
    pub snapshot: PathBuf,
    /// CSV with Source, Destination, Protocol and Remark columns.
    pub rules: PathBuf,
    /// Appliance name recorded in logs and the report. Defaults to the snapshot directory name.
    #[arg(long)]
    pub appliance: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Stop after the first failed row.
    #[arg(long)]
    pub fail_fast: bool,
    /// Write the accepted rule payloads to this file as JSON.
    #[arg(long)]
    pub payloads: Option<PathBuf>,
    /// Exit non-zero if any row failed.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser, Debug)]
pub struct NameObjectArgs {
    #[arg(long)]
    pub snapshot: PathBuf,
    pub literal: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ShowAclArgs {
    #[arg(long)]
    pub snapshot: PathBuf,
    pub zone: String,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ListAclsArgs {
    #[arg(long)]
    pub snapshot: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
