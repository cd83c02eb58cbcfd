use std::{
    env,
    path::{Path, PathBuf},
    process,
};

use foodgram_sdk::{
    connection::{connect, migrate},
    import::import_fixture,
    Config,
};

async fn run(path: &Path, config: &Config) -> Result<u64, potion::Error> {
    let pool = connect(config).await?;
    migrate(&pool).await?;
    import_fixture(path, &pool).await
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let path = match env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            log::error!("Usage: import_ingredients <ingredients.csv|ingredients.json>");
            process::exit(2);
        }
    };

    let config = Config::load();

    match run(&path, &config).await {
        Ok(inserted) => log::info!("Done, {inserted} new ingredients"),
        Err(e) => {
            log::error!(
                "Import failed ({}): {}",
                e.code,
                e.info.unwrap_or_else(|| String::from("no details"))
            );
            process::exit(1);
        }
    }
}
