use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::info;
use serde::Serialize;
use serde_json::json;
use snafu::{prelude::*, Snafu};
use std::fs;
use uuid::Uuid;

use wsjf_engine::{EngineError, Item, PeriodStatus, PeriodSummary, Score};

use crate::args::{Args, Command, ItemCommand, PeriodCommand};

pub mod export;
pub mod sample;
pub mod store;

use crate::app::store::{ItemDraft, ItemPatch, PeriodDraft, PeriodPatch, Store, StoreFile};

const DEFAULT_STORE_PATH: &str = "wsjf_store.json";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AppError {
    #[snafu(display("Error opening store file {path}"))]
    OpeningStore {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing store file {path}"))]
    ParsingStore {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing store file {path}"))]
    WritingStore {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening input file {path}"))]
    OpeningInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing input document"))]
    ParsingInput { source: serde_json::Error },
    #[snafu(display(""))]
    SerializingOutput { source: serde_json::Error },
    #[snafu(display("{source}"))]
    Validation { source: EngineError },
    #[snafu(display("No item found with id {id}"))]
    ItemNotFound { id: Uuid },
    #[snafu(display("No planning period matches {key:?}"))]
    PeriodNotFound { key: String },
    #[snafu(display("Item references unknown planning period {key:?}"))]
    MissingReference { key: String },
    #[snafu(display("Cannot delete period {name:?}: {count} items are still attached to it"))]
    DeletionBlocked { name: String, count: usize },
    #[snafu(display("A planning period named {name:?} already exists"))]
    DuplicatePeriodName { name: String },
    #[snafu(display("The item subject may not be empty"))]
    EmptySubject {},
    #[snafu(display("The period name may not be empty"))]
    EmptyPeriodName {},
    #[snafu(display("The period end date must be strictly after its start date"))]
    InvalidPeriodDates {},
    #[snafu(display("A batch must carry between 1 and 100 items, got {count}"))]
    BatchSize { count: usize },
    #[snafu(display("Error writing workbook {path}"))]
    WritingWorkbook {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

/// An item decorated with its derived values, as presented to the user.
#[derive(Debug, Clone, Serialize)]
struct ItemView {
    #[serde(flatten)]
    item: Item,
    score: Score,
    teams: Vec<String>,
}

fn item_view(item: &Item) -> ItemView {
    ItemView {
        item: item.clone(),
        score: wsjf_engine::score(item),
        teams: wsjf_engine::active_teams(item)
            .iter()
            .map(|t| t.label().to_string())
            .collect(),
    }
}

/// One row of a ranked listing.
#[derive(Debug, Clone, Serialize)]
struct RankedRow {
    rank: u32,
    score: Score,
    teams: Vec<String>,
    #[serde(flatten)]
    item: Item,
}

#[derive(Debug, Clone, Serialize)]
struct PeriodStats {
    period_id: Uuid,
    period_name: String,
    #[serde(flatten)]
    summary: PeriodSummary,
}

pub fn run(args: Args) -> AppResult<()> {
    let path = args.store.unwrap_or_else(|| DEFAULT_STORE_PATH.to_string());
    let store_file = StoreFile::new(path);
    let mut store = store_file.load()?;

    match args.command {
        Command::Period(cmd) => run_period(&mut store, &store_file, cmd),
        Command::Item(cmd) => run_item(&mut store, &store_file, cmd),
        Command::Seed => run_seed(&mut store, &store_file),
        Command::Export {
            period,
            out,
            threshold,
        } => run_export(&store, &period, out, threshold),
    }
}

fn run_period(store: &mut Store, store_file: &StoreFile, cmd: PeriodCommand) -> AppResult<()> {
    match cmd {
        PeriodCommand::Create {
            name,
            description,
            start,
            end,
            status,
        } => {
            let draft = PeriodDraft {
                name,
                description,
                start_date: parse_instant(&start)?,
                end_date: parse_instant(&end)?,
                status: status.map(|s| parse_period_status(&s)).transpose()?,
            };
            let period = store.create_period(draft)?;
            store_file.save(store)?;
            print_json(&period)
        }
        PeriodCommand::List => print_json(&store.period_overviews()),
        PeriodCommand::Show { period } => {
            let period = store.resolve_period(&period)?.clone();
            print_json(&period)
        }
        PeriodCommand::Update {
            period,
            name,
            description,
            start,
            end,
            status,
        } => {
            let id = store.resolve_period(&period)?.id;
            let patch = PeriodPatch {
                name,
                description,
                start_date: start.map(|s| parse_instant(&s)).transpose()?,
                end_date: end.map(|s| parse_instant(&s)).transpose()?,
                status: status.map(|s| parse_period_status(&s)).transpose()?,
            };
            let updated = store.update_period(id, patch)?;
            store_file.save(store)?;
            print_json(&updated)
        }
        PeriodCommand::Delete { period } => {
            let id = store.resolve_period(&period)?.id;
            let deleted = store.delete_period(id)?;
            store_file.save(store)?;
            print_json(&json!({ "deleted": deleted.name }))
        }
        PeriodCommand::Stats { period } => {
            let period = store.resolve_period(&period)?.clone();
            let items = store.items_in_period(period.id);
            let stats = PeriodStats {
                period_id: period.id,
                period_name: period.name,
                summary: wsjf_engine::summarize(&items),
            };
            print_json(&stats)
        }
    }
}

fn run_item(store: &mut Store, store_file: &StoreFile, cmd: ItemCommand) -> AppResult<()> {
    match cmd {
        ItemCommand::Create { file, json } => {
            let doc = read_document(file, json)?;
            let draft: ItemDraft = serde_json::from_str(&doc).context(ParsingInputSnafu {})?;
            let item = store.create_item(draft)?;
            store_file.save(store)?;
            print_json(&item_view(&item))
        }
        ItemCommand::List { period } => {
            let items = match period {
                Some(key) => {
                    let id = store.resolve_period(&key)?.id;
                    store.items_in_period(id)
                }
                None => store.items.clone(),
            };
            let rows: Vec<RankedRow> = wsjf_engine::rank(&items)
                .into_iter()
                .map(|r| RankedRow {
                    rank: r.rank,
                    score: r.score,
                    teams: wsjf_engine::active_teams(&r.item)
                        .iter()
                        .map(|t| t.label().to_string())
                        .collect(),
                    item: r.item,
                })
                .collect();
            print_json(&rows)
        }
        ItemCommand::Show { id } => {
            let id = parse_id(&id)?;
            let item = store.get_item(id)?.clone();
            print_json(&item_view(&item))
        }
        ItemCommand::Update { id, file, json } => {
            let id = parse_id(&id)?;
            let doc = read_document(file, json)?;
            let patch: ItemPatch = serde_json::from_str(&doc).context(ParsingInputSnafu {})?;
            let updated = store.update_item(id, patch)?;
            store_file.save(store)?;
            print_json(&item_view(&updated))
        }
        ItemCommand::Delete { id } => {
            let id = parse_id(&id)?;
            let deleted = store.delete_item(id)?;
            store_file.save(store)?;
            print_json(&json!({ "deleted": deleted.subject }))
        }
        ItemCommand::Batch { file } => {
            let doc = fs::read_to_string(&file).context(OpeningInputSnafu {
                path: file.as_str(),
            })?;
            let drafts: Vec<ItemDraft> =
                serde_json::from_str(&doc).context(ParsingInputSnafu {})?;
            let created = store.create_batch(drafts)?;
            store_file.save(store)?;
            let views: Vec<ItemView> = created.iter().map(item_view).collect();
            print_json(&views)
        }
    }
}

fn run_seed(store: &mut Store, store_file: &StoreFile) -> AppResult<()> {
    let (period, items) = sample::seed(store)?;
    store_file.save(store)?;
    info!("seeded period {} with {} items", period.name, items.len());
    print_json(&json!({ "period": period.name, "items": items.len() }))
}

fn run_export(
    store: &Store,
    period_key: &str,
    out: Option<String>,
    threshold: Option<f64>,
) -> AppResult<()> {
    let period = store.resolve_period(period_key)?;
    let items = store.items_in_period(period.id);
    let ranked = wsjf_engine::rank(&items);

    let mut options = export::ExportOptions::default();
    if let Some(t) = threshold {
        options.highlight_threshold = t;
    }

    let path = out.unwrap_or_else(|| format!("WSJF_{}.xlsx", period.name.replace(' ', "_")));
    export::write_workbook(&path, &period.name, &ranked, &options).context(
        WritingWorkbookSnafu {
            path: path.as_str(),
        },
    )?;
    println!("Wrote {} items to {}", ranked.len(), path);
    Ok(())
}

// ******** parsing helpers *********

fn parse_id(raw: &str) -> AppResult<Uuid> {
    match Uuid::parse_str(raw) {
        Ok(id) => Ok(id),
        Err(e) => whatever!("Invalid item id {:?}: {}", raw, e),
    }
}

/// Accepts an RFC 3339 instant or a plain date, read as UTC midnight.
fn parse_instant(raw: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    whatever!(
        "Cannot parse instant {:?}: expected RFC 3339 or YYYY-MM-DD",
        raw
    )
}

fn parse_period_status(raw: &str) -> AppResult<PeriodStatus> {
    for status in PeriodStatus::ALL {
        if raw.eq_ignore_ascii_case(status.label()) {
            return Ok(status);
        }
    }
    whatever!(
        "Unknown period status {:?}: expected one of Planning, Active, Completed, Cancelled",
        raw
    )
}

fn read_document(file: Option<String>, inline: Option<String>) -> AppResult<String> {
    match (file, inline) {
        (Some(path), None) => fs::read_to_string(&path).context(OpeningInputSnafu {
            path: path.as_str(),
        }),
        (None, Some(doc)) => Ok(doc),
        _ => whatever!("Pass exactly one of --file and --json"),
    }
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let pretty = serde_json::to_string_pretty(value).context(SerializingOutputSnafu {})?;
    println!("{}", pretty);
    Ok(())
}
