use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_PROJECTION_FIELDS: usize = 64;
pub(crate) const MAX_UPDATE_FIELDS: usize = 128;
pub(crate) const MAX_FILTER_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Nor(Vec<Filter>),
    Exists { path: String, exists: bool },
    In { path: String, values: Vec<Bson> },
    Nin { path: String, values: Vec<Bson> },
    Cmp { path: String, op: CmpOp, value: Bson },
}

impl Filter {
    /// Equality filter on a single field, the shape the form uses for `id` lookups.
    #[must_use]
    pub fn eq(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::Cmp { path: path.into(), op: CmpOp::Eq, value: value.into() }
    }

    /// Fields pinned by top-level equality; used to seed an upserted document.
    #[must_use]
    pub fn equality_fields(&self) -> Vec<(String, Bson)> {
        match self {
            Self::Cmp { path, op: CmpOp::Eq, value } if !path.contains('.') => {
                vec![(path.clone(), value.clone())]
            }
            Self::And(fs) => fs.iter().flat_map(Self::equality_fields).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateDoc {
    /// `inc` steps are numeric `Bson` values so integer increments stay exact.
    Operators { set: Vec<(String, Bson)>, inc: Vec<(String, Bson)>, unset: Vec<String> },
    Replace(BsonDocument),
}

impl UpdateDoc {
    /// `$set` update built from the given fields.
    #[must_use]
    pub fn set(fields: BsonDocument) -> Self {
        Self::Operators { set: fields.into_iter().collect(), inc: Vec::new(), unset: Vec::new() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Operators { set, inc, unset } => set.is_empty() && inc.is_empty() && unset.is_empty(),
            Self::Replace(d) => d.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Include { fields: Vec<String>, keep_id: bool },
    Exclude(Vec<String>),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub matched: u64,
    pub modified: u64,
    pub upserted_id: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub deleted: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertReport {
    pub inserted_ids: Vec<String>,
}
