use crate::record::Record;

/// Non-interactive operations on the configured collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        record: Record,
    },
    /// By `id` when given, else by a JSON filter, else everything.
    Find {
        id: Option<String>,
        filter_json: Option<String>,
        projection_json: Option<String>,
        one: bool,
    },
    Delete {
        id: Option<String>,
        filter_json: Option<String>,
        many: bool,
    },
    /// `$set` the given columns, or apply `update_json` verbatim.
    Update {
        id: String,
        nazwa: Option<String>,
        opis: Option<String>,
        kategoria: Option<String>,
        update_json: Option<String>,
        upsert: bool,
    },
    /// The last `last` records (all when `None`).
    List {
        last: Option<usize>,
    },
    Collections,
}
