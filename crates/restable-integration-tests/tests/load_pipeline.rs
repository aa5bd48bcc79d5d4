//! End-to-end loading pipeline tests: discovery through publication, with
//! the snapshot cache exercised against real files in a temp directory.

use std::fs;
use std::path::Path;

use restable_core::config::LoadConfig;
use restable_core::snapshot;
use restable_core::test_utils::{make_test_dir, remove_test_dir};
use restable_data::load_game_data;
use restable_data::schema::{EquipRow, ItemRow, ItemType, SkillRow};

fn write_file(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn write_standard_tables(root: &Path) {
    write_file(
        root,
        "items.ron",
        r#"[
            (id: 1, name: "Sealed Letter", item_type: Quest, max_stack: 1),
            (id: 2, name: "Arrow", item_type: Material, max_stack: 99),
        ]"#,
    );
    write_file(
        root,
        "skills.ron",
        r#"[(id: 10, name: "Fireball", mp_cost: 25, cooldown_ms: 1500,
             effect: Damage(amount: 180))]"#,
    );
    write_file(
        root,
        "equips.ron",
        r#"[(id: 20, name: "Iron Sword", slot: Weapon, max_durability: 120)]"#,
    );
}

#[test]
fn item_table_scenario() {
    let root = make_test_dir("it_scenario");
    write_standard_tables(&root);
    let config = LoadConfig::new(&root);

    let tables = load_game_data(&config).unwrap();

    // Identity-indexed lookups on the published set.
    let table = tables.table::<ItemRow>().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(&1).unwrap().max_stack, 1);
    assert_eq!(table.get(&2).unwrap().max_stack, 99);
    assert_eq!(table.get(&1).unwrap().item_type, ItemType::Quest);

    // Every registered table was published.
    assert!(tables.table::<SkillRow>().is_some());
    assert!(tables.table::<EquipRow>().is_some());

    remove_test_dir(&root);
}

#[test]
fn cold_load_writes_one_snapshot_per_table() {
    let root = make_test_dir("it_cold_snapshots");
    write_standard_tables(&root);
    let config = LoadConfig::new(&root);

    load_game_data(&config).unwrap();

    for stem in ["items", "skills", "equips"] {
        assert!(
            config.cache_dir.join(format!("{stem}.snap")).is_file(),
            "missing snapshot for {stem}"
        );
    }

    remove_test_dir(&root);
}

/// Proves the warm path really reads the snapshot: the source file is
/// rewritten with different records, but its snapshot's version stamp is
/// patched to the rewritten file's mtime, so the (now wrong) snapshot is
/// trusted and the old records come back.
#[test]
fn warm_load_restores_from_snapshot() {
    let root = make_test_dir("it_warm_hit");
    write_standard_tables(&root);
    let config = LoadConfig::new(&root);

    load_game_data(&config).unwrap();

    // Rewrite the item source with a different record set.
    write_file(
        &root,
        "items.ron",
        r#"[(id: 1, name: "Changed", item_type: Quest, max_stack: 42)]"#,
    );
    let live_version = snapshot::file_version(&root.join("items.ron")).unwrap();

    // Forge the snapshot's version stamp to match the rewritten file.
    let snap_path = config.cache_dir.join("items.snap");
    let mut bytes = fs::read(&snap_path).unwrap();
    bytes[..8].copy_from_slice(&live_version.to_le_bytes());
    fs::write(&snap_path, bytes).unwrap();

    let tables = load_game_data(&config).unwrap();
    let table = tables.table::<ItemRow>().unwrap();
    // Old records: the snapshot was used, the rewritten source was not parsed.
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(&1).unwrap().name, "Sealed Letter");

    remove_test_dir(&root);
}

/// A changed source file (different mtime than the snapshot stamp) bypasses
/// the snapshot and parses fresh.
#[test]
fn changed_source_bypasses_snapshot() {
    let root = make_test_dir("it_stale");
    write_standard_tables(&root);
    let config = LoadConfig::new(&root);

    load_game_data(&config).unwrap();

    // mtime has millisecond granularity; make sure the rewrite moves it.
    std::thread::sleep(std::time::Duration::from_millis(20));
    write_file(
        &root,
        "items.ron",
        r#"[(id: 1, name: "Reforged", item_type: Quest, max_stack: 7)]"#,
    );

    let tables = load_game_data(&config).unwrap();
    let table = tables.table::<ItemRow>().unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(&1).unwrap().name, "Reforged");
    assert_eq!(table.get(&1).unwrap().max_stack, 7);

    remove_test_dir(&root);
}

/// A failed snapshot write loses only the next startup's speed-up; the load
/// itself succeeds with the freshly parsed tables.
#[test]
fn unwritable_cache_dir_does_not_fail_the_load() {
    let root = make_test_dir("it_bad_cache");
    write_standard_tables(&root);
    let mut config = LoadConfig::new(&root);
    // Occupy the cache path with a regular file so snapshot writes fail.
    config.cache_dir = root.join("cache-blocker");
    fs::write(&config.cache_dir, b"in the way").unwrap();

    let tables = load_game_data(&config).unwrap();
    assert_eq!(tables.table::<ItemRow>().unwrap().len(), 2);

    remove_test_dir(&root);
}

#[test]
fn corrupt_snapshot_falls_back_to_source() {
    let root = make_test_dir("it_corrupt_snap");
    write_standard_tables(&root);
    let config = LoadConfig::new(&root);

    load_game_data(&config).unwrap();

    // Keep the valid version stamp but trash the payload.
    let snap_path = config.cache_dir.join("items.snap");
    let bytes = fs::read(&snap_path).unwrap();
    let mut forged = bytes[..8].to_vec();
    forged.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    fs::write(&snap_path, forged).unwrap();

    let tables = load_game_data(&config).unwrap();
    assert_eq!(tables.table::<ItemRow>().unwrap().len(), 2);

    remove_test_dir(&root);
}
