use chrono::{TimeZone, Utc};
use tempfile::tempdir;
use wst_core::{
    Character, CharacterStore, Config, ImportOptions, StoreError, check_weekly_reset,
    find_addon_file, import_all, import_all_with, is_wow_root, parse_addon_content,
    parse_addon_file, week_id_for,
};

fn parsed(src: &str) -> Vec<Character> {
    parse_addon_content(src.as_bytes()).characters
}

#[test]
fn import_updates_in_place_and_keeps_notes() {
    let mut existing = vec![Character {
        guild: "Old Guild".into(),
        item_level: 600.0,
        notes: "alt, needs crests".into(),
        delves: 2,
        ..Character::new("Server", "Hero")
    }];
    let incoming = parsed(
        r#"{ characters = { ["Hero-Server"] = {
            guild = "New Guild", item_level = 715, heroic_items = 4, vault_visited = true,
            vault_delves = { count = 6 }, vault_dungeons = { count = 8, levels = { [1] = 10 } },
            week_id = "20251230", upgrade_current = 3, upgrade_max = 9,
            socket_info = { socketable_count = 2, socketed_count = 1, missing_sockets = { 2 } },
        } } }"#,
    );
    let summary = import_all(&incoming, &mut existing);
    assert_eq!((summary.added, summary.updated), (0, 1));
    assert_eq!(existing.len(), 1);
    let c = &existing[0];
    assert_eq!(c.notes, "alt, needs crests");
    assert_eq!(c.guild, "New Guild");
    assert_eq!(c.item_level, 715.0);
    assert_eq!(c.heroic_items, 4);
    assert!(c.vault_visited);
    assert_eq!(c.delves, 6);
    // newer aggregate fields refresh on update as well
    assert_eq!((c.dungeons, c.vault_t8_plus), (8, 1));
    assert_eq!(c.week_id.as_deref(), Some("20251230"));
    assert_eq!((c.upgrade_current, c.upgrade_max), (3, 9));
    assert_eq!(c.socket_missing_count, 1);
    assert_eq!(c.missing_sockets_json.as_deref(), Some("[2]"));
}

#[test]
fn import_inserts_owned_copy() {
    let mut existing = vec![Character::new("Server", "Other")];
    let mut incoming = parsed(r#"{ characters = { ["Hero-Server"] = { item_level = 700 } } }"#);
    let summary = import_all(&incoming, &mut existing);
    assert_eq!((summary.added, summary.updated), (1, 0));
    incoming[0].item_level = 1.0;
    incoming[0].name.push_str("-mutated");
    assert_eq!(existing[1].name, "Hero");
    assert_eq!(existing[1].item_level, 700.0);
}

#[test]
fn import_match_is_case_sensitive_and_skips_blank() {
    let mut existing = vec![Character::new("server", "hero")];
    let incoming = vec![
        Character::new("Server", "Hero"),
        Character::new("Realm", ""),
        Character::new("", "Nameless"),
    ];
    let summary = import_all(&incoming, &mut existing);
    assert_eq!((summary.added, summary.updated), (1, 0));
    assert_eq!(existing.len(), 2);
}

#[test]
fn import_twice_is_stable() {
    let src = r#"{ characters = { ["A-R"] = { item_level = 1 }, ["B-R"] = { item_level = 2 } } }"#;
    let mut existing = Vec::new();
    assert_eq!(import_all(&parsed(src), &mut existing).added, 2);
    let again = import_all(&parsed(src), &mut existing);
    assert_eq!((again.added, again.updated), (0, 2));
    assert_eq!(existing.len(), 2);
}

#[test]
fn stale_week_keeps_weekly_fields_out() {
    let mut existing = vec![Character {
        delves: 3,
        quests: true,
        ..Character::new("R", "Known")
    }];
    let incoming = parsed(
        r#"{ characters = {
            ["Known-R"] = { week_id = "20251223", item_level = 650, quests = false, vault_delves = { count = 8 } },
            ["Fresh-R"] = { week_id = "20251223", item_level = 640, quests = true, vault_delves = { count = 2 } },
            ["Current-R"] = { week_id = "20251230", quests = true },
        } }"#,
    );
    let opts = ImportOptions {
        current_week: Some("20251230".into()),
    };
    let summary = import_all_with(&incoming, &mut existing, &opts);
    assert_eq!((summary.added, summary.updated, summary.stale), (2, 1, 2));

    let known = &existing[0];
    assert_eq!(known.item_level, 650.0);
    assert_eq!(known.delves, 3);
    assert!(known.quests);

    let fresh = existing.iter().find(|c| c.name == "Fresh").unwrap();
    assert_eq!(fresh.item_level, 640.0);
    assert_eq!(fresh.delves, 0);
    assert!(!fresh.quests);

    let current = existing.iter().find(|c| c.name == "Current").unwrap();
    assert!(current.quests);
}

#[test]
fn unstamped_snapshot_is_not_current() {
    let mut existing = vec![Character {
        delves: 4,
        ..Character::new("R", "Known")
    }];
    let incoming = parsed(
        r#"{ characters = {
            ["Known-R"] = { item_level = 660, vault_delves = { count = 6 } },
            ["New-R"] = { quests = true, vault_delves = { count = 2 } },
        } }"#,
    );
    let opts = ImportOptions {
        current_week: Some("20251230".into()),
    };
    let summary = import_all_with(&incoming, &mut existing, &opts);
    // filtered, but only stamped snapshots are reported as stale
    assert_eq!((summary.added, summary.updated, summary.stale), (1, 1, 0));
    assert_eq!(existing[0].item_level, 660.0);
    assert_eq!(existing[0].delves, 4);
    assert_eq!(existing[1].delves, 0);
    assert!(!existing[1].quests);

    // without a current week everything applies
    let mut existing = vec![Character::new("R", "Known")];
    import_all(&incoming, &mut existing);
    assert_eq!(existing[0].delves, 6);
}

#[test]
fn validate_collects_all_messages() {
    assert!(Character::new("Realm", "Name").is_valid());
    let bad = Character {
        item_level: 1001.0,
        heroic_items: 51,
        old_items: -1,
        delves: 9,
        gilded_stash: 4,
        timewalk: 6,
        ..Character::default()
    };
    let errors = bad.validate();
    assert_eq!(errors.len(), 8, "{:?}", errors);
    assert!(errors.contains(&"Character name is required".to_string()));
    assert!(errors.contains(&"Realm is required".to_string()));
    assert!(errors.contains(&"Item level must be between 0 and 1000".to_string()));
    assert!(errors.contains(&"heroic_items must be between 0 and 50".to_string()));
    assert!(errors.contains(&"old_items must be between 0 and 50".to_string()));
    assert!(errors.contains(&"Delves must be between 0 and 8".to_string()));
    assert!(errors.contains(&"Gilded stash must be between 0 and 3".to_string()));
    assert!(errors.contains(&"Timewalk must be between 0 and 5".to_string()));
}

#[test]
fn reset_weekly_clears_progress_only() {
    let mut c = Character {
        item_level: 700.0,
        vault_visited: true,
        delves: 4,
        gilded_stash: 2,
        gearing_up: true,
        quests: true,
        timewalk: 5,
        notes: "keep".into(),
        ..Character::new("R", "N")
    };
    c.reset_weekly();
    assert!(!c.vault_visited && !c.gearing_up && !c.quests);
    assert_eq!((c.delves, c.gilded_stash, c.timewalk), (0, 0, 0));
    assert_eq!(c.item_level, 700.0);
    assert_eq!(c.notes, "keep");
}

#[test]
fn store_round_trip_and_crud() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wowstat_data.json");

    let mut store = CharacterStore::open(&path).unwrap();
    assert!(store.is_empty());
    store.add(Character {
        notes: "main".into(),
        slot_upgrades_json: Some("[]".into()),
        ..Character::new("R", "A")
    });
    store.add(Character::new("R", "B"));
    store.save().unwrap();
    assert!(!path.with_extension("json.tmp").exists());

    let mut loaded = CharacterStore::open(&path).unwrap();
    assert_eq!(loaded.characters(), store.characters());
    assert_eq!(loaded.find("R", "B"), Some(1));
    assert_eq!(loaded.find("r", "b"), None);

    loaded.update(1, Character::new("R", "C")).unwrap();
    assert_eq!(loaded.get(1).unwrap().name, "C");
    assert!(matches!(
        loaded.update(5, Character::default()),
        Err(StoreError::OutOfRange { index: 5, len: 2 })
    ));
    let removed = loaded.delete(0).unwrap();
    assert_eq!(removed.notes, "main");
    assert_eq!(loaded.len(), 1);
    assert!(loaded.delete(3).is_err());
}

#[test]
fn store_load_tolerates_missing_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.json");
    std::fs::write(&path, r#"[{"realm":"R","name":"Old","item_level":612.5,"gundarz":true}]"#).unwrap();
    let store = CharacterStore::open(&path).unwrap();
    let c = store.get(0).unwrap();
    assert_eq!(c.name, "Old");
    assert_eq!(c.item_level, 612.5);
    assert_eq!(c.week_id, None);
    assert_eq!(c.upgrade_max, 0);

    std::fs::write(&path, "{\"not\": \"an array\"}").unwrap();
    assert!(matches!(CharacterStore::open(&path), Err(StoreError::Json { .. })));
    std::fs::write(&path, "  \n").unwrap();
    assert!(CharacterStore::open(&path).unwrap().is_empty());
}

#[test]
fn store_import_then_persist() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.json");
    let mut store = CharacterStore::new(&path);
    store.add(Character {
        notes: "bank".into(),
        ..Character::new("Server", "Hero")
    });
    let data = parse_addon_content(
        br#"{characters={["Hero-Server"]={item_level=715},["Alt-Server"]={item_level=600}}}"#,
    );
    let summary = store.import(&data.characters, &ImportOptions::default());
    assert_eq!((summary.added, summary.updated), (1, 1));
    store.save().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json[0]["notes"], "bank");
    assert_eq!(json[0]["item_level"], 715.0);
    assert_eq!(json[1]["name"], "Alt");
}

#[test]
fn config_get_set_persist() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("wowstat_config.json");
    let mut cfg = Config::open(&path).unwrap();
    assert_eq!(cfg.get_str("theme"), None);
    assert_eq!(cfg.get_i64("window_width", 1000), 1000);
    cfg.set("theme", "dark");
    cfg.set("window_width", 1280);
    cfg.set("auto_import", true);
    cfg.save().unwrap();

    let cfg = Config::open(&path).unwrap();
    assert_eq!(cfg.get_str("theme"), Some("dark"));
    assert_eq!(cfg.get_i64("window_width", 0), 1280);
    assert!(cfg.get_bool("auto_import", false));
    assert!(!cfg.get_bool("theme", false));
}

#[test]
fn week_ids_follow_tuesday_reset() {
    let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2025, 12, d, h, 0, 0).unwrap();
    assert_eq!(week_id_for(at(30, 15)), "20251230");
    assert_eq!(week_id_for(at(30, 14)), "20251223");
    assert_eq!(week_id_for(at(29, 23)), "20251223");
    assert_eq!(week_id_for(at(31, 0)), "20251230");
    assert_eq!(week_id_for(Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap()), "20251230");
    assert_eq!(week_id_for(Utc.with_ymd_and_hms(2026, 1, 6, 15, 30, 0).unwrap()), "20260106");
    assert_eq!(wst_core::current_week_id().len(), 8);
}

#[test]
fn weekly_reset_check() {
    let dir = tempdir().unwrap();
    let mut cfg = Config::new(dir.path().join("cfg.json"));
    let mut store = CharacterStore::new(dir.path().join("data.json"));
    store.add(Character {
        delves: 5,
        quests: true,
        ..Character::new("R", "N")
    });

    assert!(!check_weekly_reset(&mut cfg, &mut store, "20251223"));
    assert_eq!(cfg.get_str("last_week_id"), Some("20251223"));
    assert_eq!(store.get(0).unwrap().delves, 5);

    assert!(!check_weekly_reset(&mut cfg, &mut store, "20251223"));
    assert!(check_weekly_reset(&mut cfg, &mut store, "20251230"));
    assert_eq!(store.get(0).unwrap().delves, 0);
    assert!(!store.get(0).unwrap().quests);
    assert_eq!(cfg.get_str("last_week_id"), Some("20251230"));
}

#[test]
fn discover_addon_file() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    assert!(!is_wow_root(root));
    assert_eq!(find_addon_file(root), None);

    let accounts = root.join("_retail_").join("WTF").join("Account");
    std::fs::create_dir_all(accounts.join(".hidden").join("SavedVariables")).unwrap();
    std::fs::write(
        accounts.join(".hidden").join("SavedVariables").join("WoWStatTracker_Addon.lua"),
        "x",
    )
    .unwrap();
    std::fs::create_dir_all(accounts.join("ACCOUNT1")).unwrap();
    let sv = accounts.join("ACCOUNT2").join("SavedVariables");
    std::fs::create_dir_all(&sv).unwrap();
    let file = sv.join("WoWStatTracker_Addon.lua");
    std::fs::write(
        &file,
        "WoWStatTrackerDB = {\n  characters = { [\"Hero-Server\"] = { item_level = 715 } },\n}\n",
    )
    .unwrap();

    assert!(is_wow_root(root));
    assert_eq!(find_addon_file(root), Some(file.clone()));
    assert_eq!(parse_addon_file(&file).characters[0].name, "Hero");
    assert!(parse_addon_file(&root.join("missing.lua")).is_empty());
}
