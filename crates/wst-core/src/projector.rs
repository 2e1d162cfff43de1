use crate::character::{Character, MAX_TIMEWALK};
use crate::fields::HIGH_TIER_THRESHOLD;
use crate::lua::Table;

/// Split a `"Name-Realm"` key on its last dash.
pub fn split_character_key(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once('-')
}

/// Build a character from one entry of the addon's `characters` table.
///
/// Only an unsplittable key yields `None`; every field that is missing or has
/// the wrong type keeps its default.
pub fn project_character(key: &str, t: &Table) -> Option<Character> {
    let (name, realm) = split_character_key(key)?;
    let mut c = Character::new(realm, name);

    if let Some(guild) = t.get_str("guild") {
        c.guild = guild.to_string();
    }
    if let Some(ilvl) = t.get_number("item_level") {
        c.item_level = ilvl;
    }
    let counts = [
        ("heroic_items", &mut c.heroic_items),
        ("champion_items", &mut c.champion_items),
        ("veteran_items", &mut c.veteran_items),
        ("adventure_items", &mut c.adventure_items),
        ("old_items", &mut c.old_items),
    ];
    for (field, slot) in counts {
        if let Some(n) = t.get_number(field) {
            *slot = n as i32;
        }
    }

    if let Some(b) = t.get_bool("vault_visited") {
        c.vault_visited = b;
    }
    if let Some(b) = t.get_bool("gearing_up") {
        c.gearing_up = b;
    }
    if let Some(b) = t.get_bool("quests") {
        c.quests = b;
    }

    // the addon counts the Gearing Up delve toward the vault tally
    if let Some(n) = t.nested_number("vault_delves", "count") {
        c.delves = n as i32;
        if c.gearing_up && c.delves > 0 {
            c.delves -= 1;
        }
    }
    if let Some(n) = t.nested_number("vault_dungeons", "count") {
        c.dungeons = n as i32;
    }
    let high_tier = t.count_threshold_rewards("vault_delves", "tiers", HIGH_TIER_THRESHOLD)
        + t.count_threshold_rewards("vault_dungeons", "levels", HIGH_TIER_THRESHOLD);
    c.vault_t8_plus = high_tier as i32;

    if let Some(n) = t.nested_number("gilded_stash", "claimed") {
        c.gilded_stash = n as i32;
    }

    c.timewalk = if t.nested_bool("timewalking_quest", "completed") == Some(true) {
        MAX_TIMEWALK
    } else {
        t.nested_number("timewalking_quest", "progress").unwrap_or(0.0) as i32
    };

    c.week_id = t.get_str("week_id").map(str::to_string);
    if let Some(n) = t.get_number("upgrade_current") {
        c.upgrade_current = n as i32;
    }
    if let Some(n) = t.get_number("upgrade_max") {
        c.upgrade_max = n as i32;
    }

    // gaps are passed through unclamped, inconsistent addon data can go negative
    let socketable = t.nested_number("socket_info", "socketable_count").unwrap_or(0.0);
    let socketed = t.nested_number("socket_info", "socketed_count").unwrap_or(0.0);
    c.socket_missing_count = (socketable - socketed) as i32;
    c.socket_empty_count = t.nested_number("socket_info", "empty_count").unwrap_or(0.0) as i32;

    let enchantable = t.nested_number("enchant_info", "enchantable_count").unwrap_or(0.0);
    let enchanted = t.nested_number("enchant_info", "enchant_count").unwrap_or(0.0);
    c.enchant_missing_count = (enchantable - enchanted) as i32;

    c.slot_upgrades_json = t.slot_upgrades_to_json_string();
    c.missing_sockets_json = t.array_to_json_string("socket_info", "missing_sockets");
    c.empty_sockets_json = t.array_to_json_string("socket_info", "empty_sockets");
    c.missing_enchants_json = t.array_to_json_string("enchant_info", "missing_enchants");

    Some(c)
}
