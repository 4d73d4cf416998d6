use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use tracing::{debug, warn};

use crate::classify::Dataset;
use crate::error::{AnalysisError, ParseWarning};
use crate::model::{ColumnMapping, FieldRole, Record};
use crate::normalize::{CurrencyParser, RawCell, numeric_coerce, percent_parse};

pub const QUADRANT_COLUMN: &str = "Quadrant";
pub const EFFICIENCY_COLUMN: &str = "Efficiency_Score";

#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndices {
    pub label: usize,
    pub ad_spend_share: usize,
    pub revenue_share: usize,
    pub absolute_spend: usize,
    pub poas: usize,
}

impl ColumnIndices {
    pub fn index(&self, role: FieldRole) -> usize {
        match role {
            FieldRole::Label => self.label,
            FieldRole::AdSpendShare => self.ad_spend_share,
            FieldRole::RevenueShare => self.revenue_share,
            FieldRole::AbsoluteSpend => self.absolute_spend,
            FieldRole::Poas => self.poas,
        }
    }

    fn role_of(&self, column: usize) -> Option<FieldRole> {
        FieldRole::ALL
            .into_iter()
            .filter(|role| *role != FieldRole::Label)
            .find(|role| self.index(*role) == column)
    }
}

#[derive(Debug, Clone)]
pub struct CleanedRows {
    pub rows_total: usize,
    pub records: Vec<Record>,
    pub warnings: Vec<ParseWarning>,
}

impl CleanedRows {
    pub fn rows_dropped(&self) -> usize {
        self.rows_total - self.records.len()
    }
}

#[derive(Debug, Clone)]
pub struct PreparedAnalysis {
    pub table: RawTable,
    pub mapping: ColumnMapping,
    pub indices: ColumnIndices,
    pub dataset: Dataset,
    pub rows_total: usize,
    pub warnings: Vec<ParseWarning>,
}

impl PreparedAnalysis {
    pub fn rows_dropped(&self) -> usize {
        self.rows_total - self.dataset.len()
    }
}

pub fn load_table(bytes: &[u8], delimiter: u8) -> Result<RawTable, AnalysisError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|err| AnalysisError::InvalidTable {
            message: err.to_string(),
        })?
        .iter()
        .map(|field| {
            String::from_utf8_lossy(field)
                .trim_start_matches('\u{feff}')
                .trim()
                .to_string()
        })
        .collect();

    if headers.iter().all(|header| header.is_empty()) {
        return Err(AnalysisError::InvalidTable {
            message: "no header row found".to_string(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|err| AnalysisError::InvalidTable {
            message: err.to_string(),
        })?;
        let mut row: Vec<String> = record
            .iter()
            .take(headers.len())
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

pub fn resolve_columns(
    table: &RawTable,
    mapping: &ColumnMapping,
) -> Result<ColumnIndices, AnalysisError> {
    let find = |role: FieldRole| {
        let column = mapping.column(role);
        table
            .headers
            .iter()
            .position(|header| header == column.trim())
            .ok_or_else(|| AnalysisError::MissingColumn {
                role,
                column: column.to_string(),
                available: table.headers.join(", "),
            })
    };

    Ok(ColumnIndices {
        label: find(FieldRole::Label)?,
        ad_spend_share: find(FieldRole::AdSpendShare)?,
        revenue_share: find(FieldRole::RevenueShare)?,
        absolute_spend: find(FieldRole::AbsoluteSpend)?,
        poas: find(FieldRole::Poas)?,
    })
}

pub fn clean_rows(
    table: &RawTable,
    indices: &ColumnIndices,
    currency: &CurrencyParser,
) -> CleanedRows {
    let mut records = Vec::with_capacity(table.rows.len());
    let mut warnings = Vec::new();

    for (row_index, row) in table.rows.iter().enumerate() {
        let cell = move |role: FieldRole| RawCell::classify(&row[indices.index(role)]);

        let label = (!cell(FieldRole::Label).is_missing()).then(|| row[indices.label].clone());
        let ad_spend_share = percent_parse(cell(FieldRole::AdSpendShare));
        let revenue_share = percent_parse(cell(FieldRole::RevenueShare));
        let absolute_spend = currency.parse(cell(FieldRole::AbsoluteSpend));
        let poas = numeric_coerce(cell(FieldRole::Poas));

        let failed = [
            (FieldRole::Label, label.is_none()),
            (FieldRole::AdSpendShare, ad_spend_share.is_none()),
            (FieldRole::RevenueShare, revenue_share.is_none()),
            (FieldRole::AbsoluteSpend, absolute_spend.is_none()),
            (FieldRole::Poas, poas.is_none()),
        ];

        if let (
            Some(label),
            Some(ad_spend_share),
            Some(revenue_share),
            Some(absolute_spend),
            Some(poas),
        ) = (label, ad_spend_share, revenue_share, absolute_spend, poas)
        {
            records.push(Record {
                source_row: row_index,
                label,
                ad_spend_share,
                revenue_share,
                absolute_spend,
                poas,
            });
            continue;
        }

        for (role, _) in failed.into_iter().filter(|(_, missing)| *missing) {
            let column = indices.index(role);
            let warning = ParseWarning {
                row: row_index + 1,
                column: table.headers[column].clone(),
                role,
                raw: row[column].clone(),
            };
            debug!(
                row = warning.row,
                column = %warning.column,
                role = %warning.role,
                raw = %warning.raw,
                "dropping row with unparseable cell"
            );
            warnings.push(warning);
        }
    }

    CleanedRows {
        rows_total: table.rows.len(),
        records,
        warnings,
    }
}

pub fn prepare_analysis(
    table: RawTable,
    mapping: ColumnMapping,
    currency: &CurrencyParser,
) -> Result<PreparedAnalysis, AnalysisError> {
    let indices = resolve_columns(&table, &mapping)?;
    let cleaned = clean_rows(&table, &indices, currency);
    let rows_dropped = cleaned.rows_dropped();

    if rows_dropped > 0 {
        warn!(
            rows_total = cleaned.rows_total,
            rows_dropped, "dropped rows with missing or unparseable values"
        );
    }

    if cleaned.records.is_empty() {
        return Err(AnalysisError::EmptyDataset {
            rows_total: cleaned.rows_total,
            rows_dropped,
        });
    }

    let dataset = Dataset::new(cleaned.records)?;

    Ok(PreparedAnalysis {
        table,
        mapping,
        indices,
        dataset,
        rows_total: cleaned.rows_total,
        warnings: cleaned.warnings,
    })
}

pub fn export_records_csv(analysis: &PreparedAnalysis) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let mut header: Vec<&str> = analysis.table.headers.iter().map(String::as_str).collect();
    header.push(QUADRANT_COLUMN);
    header.push(EFFICIENCY_COLUMN);
    writer
        .write_record(&header)
        .context("failed to write records csv header")?;

    for row in analysis.dataset.rows() {
        let raw = &analysis.table.rows[row.record.source_row];
        let mut fields: Vec<String> = raw
            .iter()
            .enumerate()
            .map(|(column, value)| match analysis.indices.role_of(column) {
                Some(role) => format_float(normalized_value(row.record, role)),
                None => value.clone(),
            })
            .collect();
        fields.push(row.segment.label().to_string());
        fields.push(format_float(row.efficiency));
        writer
            .write_record(&fields)
            .with_context(|| {
                format!(
                    "failed to write records csv row {}",
                    row.record.source_row + 1
                )
            })?;
    }

    finish_csv(writer)
}

pub fn export_analysis_csv(analysis: &PreparedAnalysis) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    let mapping = &analysis.mapping;

    writer
        .write_record([
            mapping.label.as_str(),
            mapping.ad_spend_share.as_str(),
            mapping.revenue_share.as_str(),
            mapping.absolute_spend.as_str(),
            mapping.poas.as_str(),
            QUADRANT_COLUMN,
            EFFICIENCY_COLUMN,
        ])
        .context("failed to write analysis csv header")?;

    let mut rows: Vec<_> = analysis.dataset.rows().collect();
    rows.sort_by(|a, b| {
        a.segment
            .quadrant()
            .cmp(&b.segment.quadrant())
            .then_with(|| b.record.absolute_spend.total_cmp(&a.record.absolute_spend))
    });

    for row in rows {
        let record = row.record;
        writer
            .write_record([
                record.label.clone(),
                format_float(record.ad_spend_share),
                format_float(record.revenue_share),
                format_float(record.absolute_spend),
                format_float(record.poas),
                row.segment.label().to_string(),
                format_float(row.efficiency),
            ])
            .context("failed to write analysis csv row")?;
    }

    finish_csv(writer)
}

fn normalized_value(record: &Record, role: FieldRole) -> f64 {
    match role {
        FieldRole::AdSpendShare => record.ad_spend_share,
        FieldRole::RevenueShare => record.revenue_share,
        FieldRole::AbsoluteSpend => record.absolute_spend,
        FieldRole::Poas => record.poas,
        FieldRole::Label => f64::NAN,
    }
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv buffer: {}", err.error()))?;
    String::from_utf8(bytes).context("csv output was not valid utf-8")
}

pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Segment;

    const SAMPLE: &str = "\
Brand,% of Adspend,% Of Revenue,€ Ads Spend,POAS,Region
A,70%,80%,\"€1,000\",2.5,North
B,0.2,\"60,0%\",€200,3.0,South
C,10,10,50,1.0,East
D,90%,5%,€900.00,0.5,West
";

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            label: "Brand".to_string(),
            ad_spend_share: "% of Adspend".to_string(),
            revenue_share: "% Of Revenue".to_string(),
            absolute_spend: "€ Ads Spend".to_string(),
            poas: "POAS".to_string(),
        }
    }

    fn prepare(input: &str) -> Result<PreparedAnalysis, AnalysisError> {
        let table = load_table(input.as_bytes(), b',').expect("table loads");
        let currency = CurrencyParser::new().expect("pattern compiles");
        prepare_analysis(table, mapping(), &currency)
    }

    #[test]
    fn load_table_trims_headers_and_pads_short_rows() {
        let table = load_table(b" Brand , POAS \nA\nB,2,extra\n", b',').expect("table loads");
        assert_eq!(table.headers, vec!["Brand", "POAS"]);
        assert_eq!(table.rows[0], vec!["A".to_string(), String::new()]);
        assert_eq!(table.rows[1], vec!["B".to_string(), "2".to_string()]);
    }

    #[test]
    fn load_table_supports_semicolon_delimiter() {
        let table = load_table(b"Brand;POAS\nA;1,5\n", b';').expect("table loads");
        assert_eq!(table.rows[0][1], "1,5");
    }

    #[test]
    fn load_table_rejects_empty_input() {
        assert!(matches!(
            load_table(b"", b','),
            Err(AnalysisError::InvalidTable { .. })
        ));
    }

    #[test]
    fn resolve_columns_reports_missing_column() {
        let table = load_table(b"Brand,POAS\nA,1\n", b',').expect("table loads");
        let err = resolve_columns(&table, &mapping()).expect_err("columns missing");
        match err {
            AnalysisError::MissingColumn { role, column, .. } => {
                assert_eq!(role, FieldRole::AdSpendShare);
                assert_eq!(column, "% of Adspend");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn prepare_analysis_normalizes_and_classifies_mixed_formats() {
        let analysis = prepare(SAMPLE).expect("analysis succeeds");
        let thresholds = analysis.dataset.thresholds();
        assert_eq!(thresholds.median_ad_spend_share, 45.0);
        assert_eq!(thresholds.median_revenue_share, 35.0);

        let segments: Vec<Segment> = analysis.dataset.rows().map(|row| row.segment).collect();
        assert_eq!(
            segments,
            vec![
                Segment::CashCows,
                Segment::Stars,
                Segment::TestAndLearn,
                Segment::UrgentAction
            ]
        );
        assert_eq!(analysis.dataset.records()[0].absolute_spend, 1000.0);
        assert_eq!(analysis.rows_dropped(), 0);
    }

    #[test]
    fn unparseable_spend_drops_the_row_without_moving_medians() {
        let input = format!("{SAMPLE}E,99%,99%,N/A,9.0,North\nF,1%,,€10,1.0,South\n");
        let analysis = prepare(&input).expect("analysis succeeds");

        assert_eq!(analysis.rows_total, 6);
        assert_eq!(analysis.dataset.len(), 4);
        assert_eq!(analysis.rows_dropped(), 2);
        assert_eq!(analysis.dataset.thresholds().median_ad_spend_share, 45.0);
        assert_eq!(analysis.dataset.thresholds().median_revenue_share, 35.0);

        let roles: Vec<(usize, FieldRole)> = analysis
            .warnings
            .iter()
            .map(|warning| (warning.row, warning.role))
            .collect();
        assert_eq!(
            roles,
            vec![(5, FieldRole::AbsoluteSpend), (6, FieldRole::RevenueShare)]
        );
    }

    #[test]
    fn rows_without_a_label_are_dropped() {
        let input = format!("{SAMPLE} ,50%,50%,€10,1.0,North\n");
        let analysis = prepare(&input).expect("analysis succeeds");
        assert_eq!(analysis.dataset.len(), 4);
        assert_eq!(analysis.warnings[0].role, FieldRole::Label);
    }

    #[test]
    fn empty_dataset_is_reported_with_counts() {
        let input = "Brand,% of Adspend,% Of Revenue,€ Ads Spend,POAS\nA,x,y,z,w\n";
        match prepare(input) {
            Err(AnalysisError::EmptyDataset {
                rows_total,
                rows_dropped,
            }) => {
                assert_eq!(rows_total, 1);
                assert_eq!(rows_dropped, 1);
            }
            other => panic!("expected empty dataset error, got {other:?}"),
        }
    }

    #[test]
    fn export_records_csv_keeps_column_order_and_appends_derived_columns() {
        let analysis = prepare(SAMPLE).expect("analysis succeeds");
        let csv = export_records_csv(&analysis).expect("export succeeds");
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "Brand,% of Adspend,% Of Revenue,€ Ads Spend,POAS,Region,Quadrant,Efficiency_Score"
        );
        assert!(lines[1].starts_with("A,70.0,80.0,1000.0,2.5,North,Q1: CASH COWS,"));
        assert_eq!(lines[2], "B,20.0,60.0,200.0,3.0,South,Q2: STARS,3.0");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn export_analysis_csv_groups_by_quadrant_then_spend() {
        let input = format!("{SAMPLE}E,80%,90%,€5000,1.5,North\n");
        let analysis = prepare(&input).expect("analysis succeeds");
        let csv = export_analysis_csv(&analysis).expect("export succeeds");
        let labels: Vec<&str> = csv
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap_or_default())
            .collect();
        assert_eq!(labels, vec!["E", "A", "B", "C", "D"]);
    }

    #[test]
    fn format_float_handles_non_finite_values() {
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_float(f64::NAN), "");
        assert_eq!(format_float(1234.5), "1234.5");
    }
}
