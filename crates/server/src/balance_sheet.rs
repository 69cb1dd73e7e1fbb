//! Balance sheet export

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use engine::BalanceSheet;

use crate::{ServerError, server::ServerState};

const INDIVIDUAL_HEADER: [&str; 7] = [
    "User",
    "Description",
    "Total_Amount",
    "Split_Method",
    "Date",
    "Share_Amount",
    "Share_Percentage",
];
const OVERALL_HEADER: [&str; 4] = ["Description", "Total_Amount", "Split_Method", "Date"];

/// Appends `rows` to `out` as CSV records of any length.
fn write_rows<I, R, T>(out: &mut Vec<u8>, rows: I) -> Result<(), csv::Error>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// csv writes an empty record as `""`; separators must be truly empty lines.
fn blank_line(out: &mut Vec<u8>) {
    out.push(b'\n');
}

/// Renders the sheet as CSV: one block of rows per user, each followed by a
/// blank line, then the list of every expense.
fn write_csv(sheet: &BalanceSheet) -> Result<Vec<u8>, csv::Error> {
    let mut out = Vec::new();

    write_rows(&mut out, [["Individual Expenses"]])?;
    blank_line(&mut out);
    write_rows(&mut out, [INDIVIDUAL_HEADER])?;
    for rows in &sheet.individual {
        write_rows(
            &mut out,
            rows.iter().map(|row| {
                [
                    row.user_name.clone(),
                    row.description.clone(),
                    row.total_amount.to_string(),
                    row.split_method.to_string(),
                    row.date.to_string(),
                    row.share_amount.to_string(),
                    row.share_percentage.normalize().to_string(),
                ]
            }),
        )?;
        blank_line(&mut out);
    }

    blank_line(&mut out);
    write_rows(&mut out, [["Overall Expenses"]])?;
    write_rows(&mut out, [OVERALL_HEADER])?;
    write_rows(
        &mut out,
        sheet.overall.iter().map(|expense| {
            [
                expense.description.clone(),
                expense.total_amount.to_string(),
                expense.split_method.to_string(),
                expense.date.to_string(),
            ]
        }),
    )?;

    Ok(out)
}

/// Handle requests for downloading the balance sheet
pub async fn download(State(state): State<ServerState>) -> Result<Response, ServerError> {
    let sheet = state.engine.balance_sheet().await?;
    let body = write_csv(&sheet).map_err(|err| ServerError::Internal(err.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"balance_sheet.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}
