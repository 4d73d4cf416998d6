use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::chart::format_thousands;
use crate::model::AnalysisReport;

pub(super) fn write_json_response(report: &AnalysisReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, report)
        .context("failed to serialize analysis json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub(super) fn write_text_response(report: &AnalysisReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    render_text_report(&mut output, report)?;
    output.flush()?;
    Ok(())
}

pub(super) fn render_text_report<W: Write>(
    output: &mut W,
    report: &AnalysisReport,
) -> io::Result<()> {
    let symbol = &report.currency_symbol;
    let columns = &report.columns;

    writeln!(output, "Marketing Performance Analysis: {}", report.input_path)?;
    writeln!(
        output,
        "Total Brands: {}\tTotal Spend: {}{}\tAverage POAS: {}",
        report.overview.total_brands,
        symbol,
        format_thousands(report.overview.total_spend),
        format_mean(report.overview.mean_poas),
    )?;
    writeln!(
        output,
        "Medians: {}={:.2}% {}={:.2}%",
        columns.ad_spend_share,
        report.thresholds.median_ad_spend_share,
        columns.revenue_share,
        report.thresholds.median_revenue_share,
    )?;
    if report.counts.rows_dropped > 0 {
        writeln!(
            output,
            "Rows dropped: {} of {} (missing or unparseable values)",
            report.counts.rows_dropped, report.counts.rows_total
        )?;
    }

    for summary in &report.segments {
        if summary.aggregate.count == 0 {
            continue;
        }

        writeln!(output)?;
        writeln!(
            output,
            "{} - {} Brands ({:.1}%)",
            summary.label, summary.aggregate.count, summary.share_of_brands_pct
        )?;
        writeln!(output, "\t{}", summary.description)?;
        writeln!(output, "\tUrgency: {}", summary.urgency)?;
        writeln!(output, "\tAction: {}", summary.action)?;
        writeln!(
            output,
            "\tTotal Spend: {}{}\t% of Ad Spend: {:.1}%\t% of Revenue: {:.1}%\tAvg POAS: {}",
            symbol,
            format_thousands(summary.aggregate.total_spend),
            summary.aggregate.total_ad_share,
            summary.aggregate.total_revenue_share,
            format_mean(summary.aggregate.mean_poas),
        )?;
        for brand in &summary.brands {
            writeln!(
                output,
                "\t{} | Spend: {}{} | POAS: {:.2} | Ad%: {:.1}% | Rev%: {:.1}%",
                brand.label,
                symbol,
                format_thousands(brand.absolute_spend),
                brand.poas,
                brand.ad_spend_share,
                brand.revenue_share,
            )?;
        }
    }

    writeln!(output)?;
    writeln!(output, "Top {} Most Efficient Brands", report.top_efficient.len())?;
    for brand in &report.top_efficient {
        writeln!(
            output,
            "\t{}. {} | Efficiency: {:.2}x | POAS: {:.2}",
            brand.rank, brand.label, brand.efficiency, brand.poas
        )?;
    }
    writeln!(
        output,
        "Bottom {} Least Efficient Brands",
        report.bottom_efficient.len()
    )?;
    for brand in &report.bottom_efficient {
        writeln!(
            output,
            "\t{}. {} | Efficiency: {:.2}x | POAS: {:.2}",
            brand.rank, brand.label, brand.efficiency, brand.poas
        )?;
    }

    Ok(())
}

fn format_mean(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |mean| format!("{mean:.2}"))
}
