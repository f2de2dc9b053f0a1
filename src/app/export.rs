use log::debug;
use rust_xlsxwriter::{
    Color, DataValidation, Format, FormatBorder, IntoExcelData, Workbook, Worksheet, XlsxError,
};

use wsjf_engine::{ItemStatus, RankedItem, VALUE_SCALE};

const HEADERS: [&str; 15] = [
    "ID",
    "Rank",
    "Subject",
    "Description",
    "Business Value",
    "Time Criticality",
    "Risk Reduction",
    "Job Size",
    "Score",
    "Incomplete",
    "Status",
    "Owner",
    "Teams",
    "Period",
    "Created",
];

// Column indices into HEADERS.
const COL_SCORE: u16 = 8;
const COL_STATUS: u16 = 10;
const FIRST_VALUE_COL: u16 = 4;
const LAST_VALUE_COL: u16 = 7;

const COLUMN_WIDTHS: [(u16, f64); 15] = [
    (0, 38.0),
    (1, 6.0),
    (2, 32.0),
    (3, 42.0),
    (4, 14.0),
    (5, 14.0),
    (6, 14.0),
    (7, 10.0),
    (8, 8.0),
    (9, 11.0),
    (10, 8.0),
    (11, 18.0),
    (12, 16.0),
    (13, 12.0),
    (14, 20.0),
];

const HEADER_FILL: Color = Color::RGB(0x4472C4);
const HIGHLIGHT_FILL: Color = Color::RGB(0xFFE699);

/// Presentation knobs for the spreadsheet export.
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Score at or above which a row is filled as high priority.
    pub highlight_threshold: f64,
}

impl Default for ExportOptions {
    fn default() -> ExportOptions {
        ExportOptions {
            highlight_threshold: 2.5,
        }
    }
}

/// Worksheet names are capped at 31 characters and may not contain
/// `[ ] : * ? / \`.
fn sheet_name(period_name: &str) -> String {
    let cleaned: String = period_name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => ' ',
            c => c,
        })
        .collect();
    format!("WSJF {}", cleaned).chars().take(31).collect()
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: impl IntoExcelData,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match format {
        Some(f) => sheet.write_with_format(row, col, value, f).map(|_| ()),
        None => sheet.write(row, col, value).map(|_| ()),
    }
}

/// Builds the export workbook: one sheet, one row per item in rank order,
/// with a styled header, frozen top row, autofilter and per-column value
/// pickers for the estimation columns.
pub fn build_workbook(
    period_name: &str,
    ranked: &[RankedItem],
    options: &ExportOptions,
) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name(period_name))?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(HEADER_FILL)
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin);
    let score_format = Format::new().set_num_format("0.00");
    let highlight = Format::new().set_background_color(HIGHLIGHT_FILL);
    let highlight_score = Format::new()
        .set_background_color(HIGHLIGHT_FILL)
        .set_num_format("0.00");

    for (col, title) in HEADERS.iter().enumerate() {
        sheet.write_with_format(0, col as u16, *title, &header_format)?;
    }

    for (i, r) in ranked.iter().enumerate() {
        let row = (i + 1) as u32;
        let hot = r.score.value >= options.highlight_threshold;
        let fill = if hot { Some(&highlight) } else { None };
        let teams = wsjf_engine::active_teams(&r.item)
            .iter()
            .map(|t| t.label())
            .collect::<Vec<_>>()
            .join(", ");

        write_cell(sheet, row, 0, r.item.id.to_string(), fill)?;
        write_cell(sheet, row, 1, r.rank, fill)?;
        write_cell(sheet, row, 2, r.item.subject.as_str(), fill)?;
        write_cell(sheet, row, 3, r.item.description.as_str(), fill)?;
        write_cell(sheet, row, 4, r.score.business_value, fill)?;
        write_cell(sheet, row, 5, r.score.time_criticality, fill)?;
        write_cell(sheet, row, 6, r.score.risk_reduction, fill)?;
        write_cell(sheet, row, 7, r.score.job_size, fill)?;
        let sf = if hot { &highlight_score } else { &score_format };
        sheet.write_with_format(row, COL_SCORE, r.score.value, sf)?;
        write_cell(
            sheet,
            row,
            9,
            if r.score.incomplete { "Yes" } else { "No" },
            fill,
        )?;
        write_cell(sheet, row, COL_STATUS, r.item.status.label(), fill)?;
        write_cell(
            sheet,
            row,
            11,
            r.item.owner.as_deref().unwrap_or(""),
            fill,
        )?;
        write_cell(sheet, row, 12, teams.as_str(), fill)?;
        write_cell(sheet, row, 13, period_name, fill)?;
        write_cell(
            sheet,
            row,
            14,
            r.item.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            fill,
        )?;
    }

    let last_row = ranked.len() as u32;
    sheet.set_freeze_panes(1, 0)?;
    sheet.autofilter(0, 0, last_row, (HEADERS.len() - 1) as u16)?;
    for (col, width) in COLUMN_WIDTHS {
        sheet.set_column_width(col, width)?;
    }

    if !ranked.is_empty() {
        let scale: Vec<String> = VALUE_SCALE.iter().map(|v| v.to_string()).collect();
        let scale_picker = DataValidation::new().allow_list_strings(&scale)?;
        for col in FIRST_VALUE_COL..=LAST_VALUE_COL {
            sheet.add_data_validation(1, col, last_row, col, &scale_picker)?;
        }
        let statuses: Vec<&str> = ItemStatus::ALL.iter().map(|s| s.label()).collect();
        let status_picker = DataValidation::new().allow_list_strings(&statuses)?;
        sheet.add_data_validation(1, COL_STATUS, last_row, COL_STATUS, &status_picker)?;
    }

    sheet.set_landscape();
    sheet.set_paper_size(9); // A4
    sheet.set_print_fit_to_pages(1, 0);

    debug!("built workbook for {}: {} rows", period_name, ranked.len());
    Ok(workbook)
}

pub fn write_workbook(
    path: &str,
    period_name: &str,
    ranked: &[RankedItem],
    options: &ExportOptions,
) -> Result<(), XlsxError> {
    let mut workbook = build_workbook(period_name, ranked, options)?;
    workbook.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;
    use wsjf_engine::{AssessmentValues, Item, ItemStatus, SizeValues};

    fn sample_items() -> Vec<Item> {
        let period_id = Uuid::new_v4();
        let mut high = Item {
            id: Uuid::new_v4(),
            subject: "Payment gateway".to_string(),
            description: "Integration with the payment provider".to_string(),
            business_value: AssessmentValues::default(),
            time_criticality: AssessmentValues::default(),
            risk_reduction: AssessmentValues::default(),
            job_size: SizeValues::default(),
            status: ItemStatus::Go,
            owner: Some("Carol Davis".to_string()),
            period_id,
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap(),
        };
        high.business_value.dev_business = Some(21);
        high.time_criticality.cabinet_business = Some(13);
        high.risk_reduction.support_business = Some(5);
        high.job_size.dev = Some(8);

        let mut low = high.clone();
        low.id = Uuid::new_v4();
        low.subject = "Dashboard polish".to_string();
        low.owner = None;
        low.business_value.dev_business = Some(2);
        low.time_criticality.cabinet_business = Some(1);
        low.risk_reduction.support_business = Some(1);
        low.job_size.dev = Some(13);
        vec![high, low]
    }

    #[test]
    fn workbook_saves_to_buffer() {
        let ranked = wsjf_engine::rank(&sample_items());
        let mut workbook =
            build_workbook("PI18", &ranked, &ExportOptions::default()).unwrap();
        let buffer = workbook.save_to_buffer().unwrap();
        // xlsx files are zip archives.
        assert!(buffer.len() > 4);
        assert_eq!(&buffer[0..2], b"PK");
    }

    #[test]
    fn empty_period_still_produces_a_workbook() {
        let mut workbook = build_workbook("PI18", &[], &ExportOptions::default()).unwrap();
        assert!(workbook.save_to_buffer().unwrap().starts_with(b"PK"));
    }

    #[test]
    fn sheet_names_are_sanitized_and_capped() {
        assert_eq!(sheet_name("PI18"), "WSJF PI18");
        assert_eq!(sheet_name("Q1/Q2 [draft]"), "WSJF Q1 Q2  draft ");
        assert_eq!(sheet_name(&"x".repeat(60)).chars().count(), 31);
    }
}
