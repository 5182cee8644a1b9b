// Submodules for separation of concerns
mod eval;
mod parse;
mod types;

pub(crate) use eval::get_path;
pub use eval::{apply_update, compare_bson, eval_filter, project, upsert_seed};
pub use parse::{
    parse_filter, parse_filter_json, parse_json_document, parse_projection,
    parse_projection_json, parse_update, parse_update_json,
};
pub use types::{
    CmpOp, DeleteReport, Filter, InsertReport, Projection, UpdateDoc, UpdateReport,
};
