use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::columns::ColumnOverrides;
use crate::util::parse_delimiter;

#[derive(Parser, Debug)]
#[command(
    name = "adquadrant",
    version,
    about = "Brand spend/revenue quadrant analysis for marketing exports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Analyze(AnalyzeArgs),
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,
}

#[derive(Args, Debug, Clone)]
pub struct ColumnArgs {
    #[arg(long)]
    pub label_column: Option<String>,

    #[arg(long)]
    pub ad_share_column: Option<String>,

    #[arg(long)]
    pub revenue_share_column: Option<String>,

    #[arg(long)]
    pub spend_column: Option<String>,

    #[arg(long)]
    pub poas_column: Option<String>,
}

impl ColumnArgs {
    pub fn overrides(&self) -> ColumnOverrides {
        ColumnOverrides {
            label: self.label_column.clone(),
            ad_spend_share: self.ad_share_column.clone(),
            revenue_share: self.revenue_share_column.clone(),
            absolute_spend: self.spend_column.clone(),
            poas: self.poas_column.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub table: TableArgs,

    #[command(flatten)]
    pub columns: ColumnArgs,

    #[arg(long, default_value_t = 3)]
    pub top_n: usize,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub table: TableArgs,

    #[command(flatten)]
    pub columns: ColumnArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_args_parse_with_defaults() {
        let cli = Cli::try_parse_from(["adquadrant", "analyze", "--input", "brands.csv"])
            .expect("arguments parse");
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze command");
        };
        assert_eq!(args.table.input, PathBuf::from("brands.csv"));
        assert_eq!(args.table.delimiter, b',');
        assert_eq!(args.top_n, 3);
        assert!(args.output_dir.is_none());
        assert!(!args.json);
    }

    #[test]
    fn column_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "adquadrant",
            "inspect",
            "--input",
            "brands.csv",
            "--delimiter",
            ";",
            "--spend-column",
            "Cost",
        ])
        .expect("arguments parse");
        let Commands::Inspect(args) = cli.command else {
            panic!("expected inspect command");
        };
        assert_eq!(args.table.delimiter, b';');
        let overrides = args.columns.overrides();
        assert_eq!(overrides.absolute_spend.as_deref(), Some("Cost"));
        assert!(overrides.label.is_none());
    }
}
