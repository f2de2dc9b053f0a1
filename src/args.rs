use clap::{Parser, Subcommand};

/// WSJF prioritization planner.
///
/// Records prioritization items into planning periods, scores them with the
/// weighted-shortest-job-first formula, ranks them and exports the ranked
/// set as a formatted spreadsheet.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON snapshot store. Defaults to wsjf_store.json in
    /// the current directory.
    #[clap(short, long, value_parser)]
    pub store: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage planning periods.
    #[clap(subcommand)]
    Period(PeriodCommand),

    /// Manage prioritization items.
    #[clap(subcommand)]
    Item(ItemCommand),

    /// Seed the store with a demonstration planning period and items.
    Seed,

    /// Export one planning period as a formatted spreadsheet (.xlsx),
    /// one row per item in rank order.
    Export {
        /// (name or id) The planning period to export.
        #[clap(short, long, value_parser)]
        period: String,

        /// (file path) Output location. Defaults to WSJF_<period>.xlsx.
        #[clap(short, long, value_parser)]
        out: Option<String>,

        /// Score at or above which rows are highlighted as high priority.
        #[clap(long, value_parser)]
        threshold: Option<f64>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PeriodCommand {
    /// Create a new planning period.
    Create {
        /// Unique period name, e.g. PI18.
        #[clap(short, long, value_parser)]
        name: String,

        #[clap(short, long, value_parser, default_value = "")]
        description: String,

        /// Start instant (RFC 3339 or YYYY-MM-DD).
        #[clap(long, value_parser)]
        start: String,

        /// End instant (RFC 3339 or YYYY-MM-DD); must be strictly after the start.
        #[clap(long, value_parser)]
        end: String,

        /// One of Planning, Active, Completed, Cancelled. Defaults to Planning.
        #[clap(long, value_parser)]
        status: Option<String>,
    },

    /// List all planning periods with their item counts, newest first.
    List,

    /// Show one planning period.
    Show {
        /// (name or id)
        #[clap(value_parser)]
        period: String,
    },

    /// Update fields of a planning period. Omitted fields are left unchanged.
    Update {
        /// (name or id)
        #[clap(value_parser)]
        period: String,

        #[clap(long, value_parser)]
        name: Option<String>,

        #[clap(long, value_parser)]
        description: Option<String>,

        #[clap(long, value_parser)]
        start: Option<String>,

        #[clap(long, value_parser)]
        end: Option<String>,

        #[clap(long, value_parser)]
        status: Option<String>,
    },

    /// Delete a planning period. Rejected while items are still attached.
    Delete {
        /// (name or id)
        #[clap(value_parser)]
        period: String,
    },

    /// Summary statistics for one period: item count, average score,
    /// status distribution and team distribution.
    Stats {
        /// (name or id)
        #[clap(value_parser)]
        period: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ItemCommand {
    /// Create an item from a JSON document.
    Create {
        /// (file path) JSON item document.
        #[clap(short, long, value_parser)]
        file: Option<String>,

        /// Inline JSON item document; alternative to --file.
        #[clap(short, long, value_parser)]
        json: Option<String>,
    },

    /// List items as a ranked view (rank 1 = highest priority).
    List {
        /// (name or id) Restrict the ranked view to one planning period.
        #[clap(short, long, value_parser)]
        period: Option<String>,
    },

    /// Show one item with its derived score and teams.
    Show {
        /// Item id.
        #[clap(value_parser)]
        id: String,
    },

    /// Update an item from a JSON document. Omitted fields are left unchanged.
    Update {
        /// Item id.
        #[clap(value_parser)]
        id: String,

        /// (file path) JSON patch document.
        #[clap(short, long, value_parser)]
        file: Option<String>,

        /// Inline JSON patch document; alternative to --file.
        #[clap(short, long, value_parser)]
        json: Option<String>,
    },

    /// Delete an item.
    Delete {
        /// Item id.
        #[clap(value_parser)]
        id: String,
    },

    /// Create up to 100 items in one call from a JSON array document.
    Batch {
        /// (file path) JSON array of item documents.
        #[clap(value_parser)]
        file: String,
    },
}
