use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::InspectArgs;
use crate::columns::{currency_symbol, suggest_mapping};
use crate::model::{FieldRole, TableInspection};
use crate::table::{RawTable, load_table, resolve_columns};
use crate::util::{read_input, sha256_bytes};

pub fn run(args: InspectArgs) -> Result<()> {
    let input_path = &args.table.input;
    info!(input = %input_path.display(), "inspecting table");

    let bytes = read_input(input_path)?;
    let table = load_table(&bytes, args.table.delimiter)
        .with_context(|| format!("failed to load {}", input_path.display()))?;

    let inspection = build_inspection(&table, &args, sha256_bytes(&bytes))
        .with_context(|| format!("no columns found in {}", input_path.display()))?;

    if let Err(err) = resolve_columns(&table, &inspection.suggested_columns) {
        warn!(error = %err, "suggested mapping is incomplete; pass explicit column flags");
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &inspection)
            .context("failed to serialize inspection json output")?;
        writeln!(output)?;
    } else {
        render_inspection(&mut output, &inspection)?;
    }
    output.flush()?;

    info!(
        headers = inspection.headers.len(),
        rows = inspection.row_count,
        "inspection completed"
    );

    Ok(())
}

fn build_inspection(
    table: &RawTable,
    args: &InspectArgs,
    input_sha256: String,
) -> Option<TableInspection> {
    let suggested_columns = suggest_mapping(&table.headers, &args.columns.overrides())?;
    Some(TableInspection {
        input_path: args.table.input.display().to_string(),
        input_sha256,
        row_count: table.rows.len(),
        headers: table.headers.clone(),
        currency_symbol: currency_symbol(&suggested_columns.absolute_spend).to_string(),
        suggested_columns,
    })
}

fn render_inspection<W: Write>(output: &mut W, inspection: &TableInspection) -> io::Result<()> {
    writeln!(output, "Input: {}", inspection.input_path)?;
    writeln!(output, "SHA-256: {}", inspection.input_sha256)?;
    writeln!(output, "Rows: {}", inspection.row_count)?;
    writeln!(output, "Columns:")?;
    for (index, header) in inspection.headers.iter().enumerate() {
        writeln!(output, "\t{}. {header}", index + 1)?;
    }
    writeln!(output, "Suggested mapping:")?;
    for role in FieldRole::ALL {
        writeln!(
            output,
            "\t{role}: {}",
            inspection.suggested_columns.column(role)
        )?;
    }
    writeln!(output, "Currency symbol: {}", inspection.currency_symbol)?;
    Ok(())
}
