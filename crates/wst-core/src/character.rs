use serde::{Deserialize, Serialize};

pub const MAX_ITEM_LEVEL: f64 = 1000.0;
pub const MAX_ITEMS_PER_CATEGORY: i32 = 50;
pub const MAX_DELVES: i32 = 8;
pub const MAX_GILDED_STASH: i32 = 3;
pub const MAX_TIMEWALK: i32 = 5;

/// One tracked character. Serialized field names are the on-disk store format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub realm: String,
    pub name: String,
    pub guild: String,
    pub item_level: f64,
    pub heroic_items: i32,
    pub champion_items: i32,
    pub veteran_items: i32,
    pub adventure_items: i32,
    pub old_items: i32,
    pub vault_visited: bool,
    pub delves: i32,
    pub dungeons: i32,
    pub vault_t8_plus: i32,
    pub gilded_stash: i32,
    pub gearing_up: bool,
    pub quests: bool,
    pub timewalk: i32,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_id: Option<String>,
    pub upgrade_current: i32,
    pub upgrade_max: i32,
    pub socket_missing_count: i32,
    pub socket_empty_count: i32,
    pub enchant_missing_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_upgrades_json: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_sockets_json: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_sockets_json: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_enchants_json: Option<String>,
}

impl Character {
    pub fn new(realm: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Range and required-field checks. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Character name is required".to_string());
        }
        if self.realm.trim().is_empty() {
            errors.push("Realm is required".to_string());
        }
        if !(0.0..=MAX_ITEM_LEVEL).contains(&self.item_level) {
            errors.push(format!("Item level must be between 0 and {}", MAX_ITEM_LEVEL));
        }
        for (field, value) in self.item_counts() {
            if !(0..=MAX_ITEMS_PER_CATEGORY).contains(&value) {
                errors.push(format!(
                    "{} must be between 0 and {}",
                    field, MAX_ITEMS_PER_CATEGORY
                ));
            }
        }
        if !(0..=MAX_DELVES).contains(&self.delves) {
            errors.push(format!("Delves must be between 0 and {}", MAX_DELVES));
        }
        if !(0..=MAX_GILDED_STASH).contains(&self.gilded_stash) {
            errors.push(format!("Gilded stash must be between 0 and {}", MAX_GILDED_STASH));
        }
        if !(0..=MAX_TIMEWALK).contains(&self.timewalk) {
            errors.push(format!("Timewalk must be between 0 and {}", MAX_TIMEWALK));
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    fn item_counts(&self) -> [(&'static str, i32); 5] {
        [
            ("heroic_items", self.heroic_items),
            ("champion_items", self.champion_items),
            ("veteran_items", self.veteran_items),
            ("adventure_items", self.adventure_items),
            ("old_items", self.old_items),
        ]
    }

    /// Zero the fields that track this week's activity.
    pub fn reset_weekly(&mut self) {
        self.vault_visited = false;
        self.delves = 0;
        self.gilded_stash = 0;
        self.gearing_up = false;
        self.quests = false;
        self.timewalk = 0;
    }

    /// Overwrite every addon-sourced field with `src`'s values.
    ///
    /// Identity (`realm`, `name`) and `notes` are left alone. With
    /// `include_weekly == false` the weekly activity fields are kept too.
    pub fn apply_import(&mut self, src: &Character, include_weekly: bool) {
        self.guild.clone_from(&src.guild);
        self.item_level = src.item_level;
        self.heroic_items = src.heroic_items;
        self.champion_items = src.champion_items;
        self.veteran_items = src.veteran_items;
        self.adventure_items = src.adventure_items;
        self.old_items = src.old_items;
        if include_weekly {
            self.vault_visited = src.vault_visited;
            self.delves = src.delves;
            self.gilded_stash = src.gilded_stash;
            self.gearing_up = src.gearing_up;
            self.quests = src.quests;
            self.timewalk = src.timewalk;
        }
        self.dungeons = src.dungeons;
        self.vault_t8_plus = src.vault_t8_plus;
        self.week_id.clone_from(&src.week_id);
        self.upgrade_current = src.upgrade_current;
        self.upgrade_max = src.upgrade_max;
        self.socket_missing_count = src.socket_missing_count;
        self.socket_empty_count = src.socket_empty_count;
        self.enchant_missing_count = src.enchant_missing_count;
        self.slot_upgrades_json.clone_from(&src.slot_upgrades_json);
        self.missing_sockets_json.clone_from(&src.missing_sockets_json);
        self.empty_sockets_json.clone_from(&src.empty_sockets_json);
        self.missing_enchants_json.clone_from(&src.missing_enchants_json);
    }
}
