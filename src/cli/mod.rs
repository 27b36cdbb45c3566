pub mod commands;
pub mod output;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fedadmin")]
#[command(author = "Ignoramuss")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query keyspaces, schemas and tablets across many clusters at once", long_about = None)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        env = "FEDADMIN_CONFIG",
        default_value = "fedadmin.yaml",
        help = "Configuration file"
    )]
    pub config: PathBuf,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table, help = "Output format")]
    pub output: OutputFormat,

    #[arg(long, global = true, help = "Print request metrics after the command")]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ClusterFilter {
    #[arg(long = "cluster", value_name = "ID", help = "Only query this cluster (repeatable)")]
    pub clusters: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "List configured clusters")]
    Clusters,
    #[command(about = "List query gates")]
    Gates {
        #[command(flatten)]
        filter: ClusterFilter,
    },
    #[command(about = "List keyspaces and their shards")]
    Keyspaces {
        #[command(flatten)]
        filter: ClusterFilter,
    },
    #[command(about = "List keyspace schemas")]
    Schemas {
        #[command(flatten)]
        filter: ClusterFilter,
    },
    #[command(about = "List tablets")]
    Tablets {
        #[command(flatten)]
        filter: ClusterFilter,
    },
    #[command(about = "Show the tablet with the given hostname")]
    Tablet {
        hostname: String,

        #[command(flatten)]
        filter: ClusterFilter,
    },
    #[command(about = "Explain how a query would be routed")]
    Explain {
        #[arg(long, help = "Cluster id")]
        cluster: String,

        #[arg(short, long, help = "Keyspace name")]
        keyspace: String,

        #[arg(short, long, help = "SQL to explain")]
        sql: String,
    },
}
