//! wst-core: addon SavedVariables import and weekly progress tracking
//!
//! The pipeline, leaves first:
//! - `lua`: data-only evaluator for the addon's table literal
//! - `fields`: absent-tolerant typed accessors over the evaluated tree
//! - `projector`: one `characters` entry -> [`Character`], with the vault,
//!   timewalk and gear-gap derivations
//! - `import`: whole-file parse and merge into an existing collection
//!
//! Around it sit the JSON-backed [`CharacterStore`] and [`Config`], week-id
//! calculation and addon file discovery.
//!
pub mod character;
pub mod config;
pub mod error;
pub mod fields;
pub mod import;
pub mod json;
pub mod lua;
pub mod projector;
pub mod saves;
pub mod store;
pub mod week;

pub use character::Character;
pub use config::Config;
pub use error::StoreError;
pub use import::{
    AddonData, ImportOptions, ImportSummary, import_all, import_all_with, parse_addon_content,
    parse_addon_file,
};
pub use lua::{Key, LiteralError, Table, Value, evaluate, parse_value};
pub use projector::{project_character, split_character_key};
pub use saves::{find_addon_file, is_wow_root};
pub use store::CharacterStore;
pub use week::{check_weekly_reset, current_week_id, week_id_for};
