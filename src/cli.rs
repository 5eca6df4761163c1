use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "class-scanner")]
#[command(about = "Scan a Java classpath at the bytecode level and walk the element model")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Classpath root (directory or jar); repeatable, `:`-separated entries
    /// also accepted. Falls back to $CLASSPATH, then the current directory.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub classpath: Vec<String>,

    /// Discover jar archives under this directory and append them as roots.
    #[arg(long, value_name = "DIR")]
    pub jars: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// List classes matching the given filters.
    Scan {
        #[arg(long, value_name = "PREFIX")]
        prefix: Option<String>,

        #[arg(long, value_enum, value_name = "KIND")]
        kind: Option<KindArg>,

        #[arg(long, value_name = "ANNOTATION")]
        annotated_with: Option<String>,

        #[arg(long, value_name = "INTERFACE")]
        implements: Option<String>,

        #[arg(short = 'f', long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Print the structural element model of one class.
    Inspect {
        class_name: String,

        #[arg(short = 'f', long, value_enum, default_value = "json")]
        format: OutputFormat,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Deep-walk one class and print the visit sequence.
    Walk {
        class_name: String,

        #[arg(short = 'f', long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Discover annotated conversion-method pairs across the classpath.
    Bindings {
        #[arg(long, value_name = "ANNOTATION")]
        annotation: String,

        #[arg(long, value_name = "PREFIX")]
        prefix: Option<String>,

        #[arg(short = 'f', long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Report root, class and package counts for the configured classpath.
    Stats,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum KindArg {
    Class,
    Interface,
    Enum,
    Annotation,
    Inner,
}
