//! Loads the sample tables twice to show the snapshot cache at work.
//!
//! Run with `RUST_LOG=debug` to watch the first pass parse the RON sources
//! and the second pass restore every table from its snapshot.

use std::path::PathBuf;

use restable_core::config::LoadConfig;
use restable_data::schema::{EquipRow, ItemRow, SkillRow};

fn main() {
    env_logger::init();

    let data_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("examples/data");
    let mut config = LoadConfig::new(data_root);
    // Keep the cache out of the source tree.
    config.cache_dir = std::env::temp_dir().join("restable-demo-cache");
    config.worker_threads = 2;

    for pass in ["cold", "warm"] {
        let tables = match restable_data::load_game_data(&config) {
            Ok(tables) => tables,
            Err(e) => {
                eprintln!("startup failed: {e}");
                std::process::exit(1);
            }
        };
        println!("[{pass}] loaded tables: {:?}", tables.table_names());

        let potion = tables.get::<ItemRow>(&1001).expect("item 1001");
        println!("[{pass}] item 1001: {} (stack {})", potion.name, potion.max_stack);

        let fireball = tables.get::<SkillRow>(&3001).expect("skill 3001");
        println!("[{pass}] skill 3001: {} ({:?})", fireball.name, fireball.effect);

        let helm = tables.get::<EquipRow>(&4002).expect("equip 4002");
        println!("[{pass}] equip 4002: {} bonuses {:?}", helm.name, helm.prop_bonuses);
    }
}
