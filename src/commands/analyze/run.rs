use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use super::output::{write_json_response, write_text_response};
use super::report::{build_report, row_counts};
use crate::chart::bubble_chart;
use crate::cli::AnalyzeArgs;
use crate::columns::{currency_symbol, suggest_mapping};
use crate::model::{AnalysisPaths, AnalysisReport, AnalysisRunManifest};
use crate::normalize::CurrencyParser;
use crate::table::{
    PreparedAnalysis, export_analysis_csv, export_records_csv, load_table, prepare_analysis,
};
use crate::util::{
    ensure_directory, now_utc_string, read_input, sha256_bytes, utc_compact_string,
    write_json_pretty, write_text,
};

const MANIFEST_VERSION: u32 = 1;

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("analysis-{}", utc_compact_string(started_ts));
    let input_path = &args.table.input;

    info!(input = %input_path.display(), run_id = %run_id, "starting analysis");

    let bytes = read_input(input_path)?;
    let input_sha256 = sha256_bytes(&bytes);

    let table = load_table(&bytes, args.table.delimiter)
        .with_context(|| format!("failed to load {}", input_path.display()))?;
    let mapping = suggest_mapping(&table.headers, &args.columns.overrides())
        .with_context(|| format!("no columns found in {}", input_path.display()))?;

    info!(
        rows = table.rows.len(),
        label = %mapping.label,
        ad_spend_share = %mapping.ad_spend_share,
        revenue_share = %mapping.revenue_share,
        absolute_spend = %mapping.absolute_spend,
        poas = %mapping.poas,
        "loaded table"
    );

    let currency = CurrencyParser::new()?;
    let analysis = prepare_analysis(table, mapping, &currency)
        .with_context(|| format!("analysis of {} aborted", input_path.display()))?;

    let thresholds = analysis.dataset.thresholds();
    info!(
        rows_kept = analysis.dataset.len(),
        rows_dropped = analysis.rows_dropped(),
        median_ad_spend_share = thresholds.median_ad_spend_share,
        median_revenue_share = thresholds.median_revenue_share,
        "classified dataset"
    );

    let symbol = currency_symbol(&analysis.mapping.absolute_spend);
    let report = build_report(&analysis, input_path, symbol, args.top_n);

    if let Some(output_dir) = &args.output_dir {
        let manifest_path = write_artifacts(
            output_dir,
            &analysis,
            &report,
            ArtifactRun {
                run_id: &run_id,
                started_at,
                command: render_analyze_command(&args),
                input_sha256,
            },
        )?;
        info!(path = %manifest_path.display(), "wrote analysis manifest");
    }

    if args.json {
        write_json_response(&report)?;
    } else {
        write_text_response(&report)?;
    }

    info!(run_id = %run_id, brands = report.overview.total_brands, "analysis completed");

    Ok(())
}

struct ArtifactRun<'a> {
    run_id: &'a str,
    started_at: String,
    command: String,
    input_sha256: String,
}

fn write_artifacts(
    output_dir: &Path,
    analysis: &PreparedAnalysis,
    report: &AnalysisReport,
    run: ArtifactRun<'_>,
) -> Result<PathBuf> {
    ensure_directory(output_dir)?;

    let paths = AnalysisPaths {
        output_dir: output_dir.display().to_string(),
        records_csv_path: output_dir.join("enriched_records.csv").display().to_string(),
        analysis_csv_path: output_dir.join("quadrant_analysis.csv").display().to_string(),
        chart_json_path: output_dir.join("bubble_chart.json").display().to_string(),
        report_json_path: output_dir.join("analysis_report.json").display().to_string(),
        manifest_path: output_dir.join("analysis_manifest.json").display().to_string(),
    };

    write_text(Path::new(&paths.records_csv_path), &export_records_csv(analysis)?)?;
    write_text(Path::new(&paths.analysis_csv_path), &export_analysis_csv(analysis)?)?;

    let chart = bubble_chart(&analysis.dataset, &analysis.mapping, &report.currency_symbol);
    write_json_pretty(Path::new(&paths.chart_json_path), &chart)?;
    write_json_pretty(Path::new(&paths.report_json_path), report)?;

    let manifest = AnalysisRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id: run.run_id.to_string(),
        status: "completed".to_string(),
        started_at: run.started_at,
        generated_at: now_utc_string(),
        command: run.command,
        input_path: report.input_path.clone(),
        input_sha256: run.input_sha256,
        columns: analysis.mapping.clone(),
        counts: row_counts(analysis),
        thresholds: analysis.dataset.thresholds(),
        paths: paths.clone(),
        warnings: analysis.warnings.clone(),
        notes: vec![
            "Shares at or below 1 are read as fractions and scaled by 100.".to_string(),
            "Commas in spend values are treated as thousands separators.".to_string(),
            "Brands with zero ad spend share are excluded from efficiency rankings.".to_string(),
        ],
    };

    let manifest_path = PathBuf::from(&paths.manifest_path);
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        records_csv = %paths.records_csv_path,
        analysis_csv = %paths.analysis_csv_path,
        chart_json = %paths.chart_json_path,
        "wrote analysis artifacts"
    );

    Ok(manifest_path)
}

pub(super) fn render_analyze_command(args: &AnalyzeArgs) -> String {
    let mut command = vec![
        "adquadrant".to_string(),
        "analyze".to_string(),
        "--input".to_string(),
        args.table.input.display().to_string(),
    ];

    if args.table.delimiter != b',' {
        command.push("--delimiter".to_string());
        command.push(char::from(args.table.delimiter).escape_default().to_string());
    }

    let column_flags = [
        ("--label-column", &args.columns.label_column),
        ("--ad-share-column", &args.columns.ad_share_column),
        ("--revenue-share-column", &args.columns.revenue_share_column),
        ("--spend-column", &args.columns.spend_column),
        ("--poas-column", &args.columns.poas_column),
    ];
    for (flag, value) in column_flags {
        if let Some(value) = value {
            command.push(flag.to_string());
            command.push(format!("{value:?}"));
        }
    }

    command.push("--top-n".to_string());
    command.push(args.top_n.to_string());

    if let Some(path) = &args.output_dir {
        command.push("--output-dir".to_string());
        command.push(path.display().to_string());
    }
    if args.json {
        command.push("--json".to_string());
    }

    command.join(" ")
}
