use anyhow::Result;
use rusqlite::Connection;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use turkey_geo::db::{schema, Db, GeoReader, SqliteStore};
use turkey_geo::seed::{progress, HierarchySeeder};
use turkey_geo::{Config, EntityLevel, GeoError};

#[derive(Parser, Debug)]
#[command(name = "turkey-geo")]
#[command(about = "Seed and inspect the Turkish city / district / neighborhood hierarchy")]
struct Args {
    /// Config file (overrides TURKEY_GEO_CONFIG and ./config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the schema if needed and load all three levels
    Seed {
        /// Delete existing rows from the three tables first
        #[arg(long)]
        fresh: bool,
    },
    /// Print a city with its districts and their neighborhood counts
    Show {
        city_id: i64,
    },
    /// Print the row count of each level
    Counts,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let _ = dotenv::dotenv();
            Config::load_from(path)?
        }
        None => Config::load()?,
    };

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", &config.log_level)
    ).init();

    let db = Db::new(config.db_path());

    match args.command {
        Command::Seed { fresh } => run_seed(&db, config, fresh).await,
        Command::Show { city_id } => run_show(&db, config, city_id).await,
        Command::Counts => run_counts(&db, config).await,
    }
}

async fn run_seed(db: &Db, config: Config, fresh: bool) -> Result<()> {
    log::info!("Starting turkey-geo v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Data root: {}", config.data_path().display());
    log::info!("Database path: {}", config.db_path().display());

    let outcome = db
        .with_connection(move |conn| {
            schema::ensure_schema(conn, &config.tables)?;
            if fresh {
                schema::clear(conn, &config.tables)?;
            }

            let progress = progress::reporter(config.seeding.show_progress);
            let mut store = SqliteStore::new(conn);
            let mut seeder = HierarchySeeder::new(&mut store, config, progress);
            seeder.run()
        })
        .await;

    let summary = match outcome {
        Ok(summary) => summary,
        Err(err) => {
            if let Some(level) = err.level() {
                log::error!(
                    "Nothing was written for {}; levels before it remain committed",
                    level
                );
            }
            return Err(anyhow::Error::new(err).context("Seeding failed"));
        }
    };

    println!(
        "Seeded {} cities, {} districts, {} neighborhoods from {} region files ({} empty) in {:.1?}",
        summary.cities,
        summary.districts,
        summary.neighborhoods,
        summary.region_files,
        summary.empty_region_files,
        summary.elapsed
    );
    Ok(())
}

/// Fail with a hint when a level's table has not been created yet
fn require_schema(conn: &Connection, config: &Config) -> turkey_geo::Result<()> {
    for level in EntityLevel::ALL {
        let table = config.tables.for_level(level);
        if !schema::table_exists(conn, table)? {
            return Err(GeoError::Config(format!(
                "table `{}` does not exist; run `turkey-geo seed` first",
                table
            )));
        }
    }
    Ok(())
}

async fn run_show(db: &Db, config: Config, city_id: i64) -> Result<()> {
    let report = db
        .with_connection(move |conn| {
            require_schema(conn, &config)?;
            let reader = GeoReader::new(conn, &config.tables);
            let Some(city) = reader.city(city_id)? else {
                return Ok(None);
            };

            let mut districts = Vec::new();
            for district in reader.districts_of(city.id)? {
                let neighborhoods = reader.neighborhoods_of(district.id)?.len();
                districts.push((district, neighborhoods));
            }
            Ok::<_, GeoError>(Some((city, districts)))
        })
        .await?;

    let Some((city, districts)) = report else {
        anyhow::bail!("City {} not found", city_id);
    };

    println!("{} (id {}), {} districts", city.name, city.id, districts.len());
    println!("{:-<60}", "");
    for (district, neighborhoods) in &districts {
        println!("{:>8}  {:<36} {:>8} neighborhoods", district.id, district.name, neighborhoods);
    }
    Ok(())
}

async fn run_counts(db: &Db, config: Config) -> Result<()> {
    let counts = db
        .with_connection(move |conn| {
            require_schema(conn, &config)?;
            let reader = GeoReader::new(conn, &config.tables);
            EntityLevel::ALL
                .into_iter()
                .map(|level| reader.count(level).map(|n| (level, n)))
                .collect::<turkey_geo::Result<Vec<_>>>()
        })
        .await?;

    for (level, n) in counts {
        println!("{:<14} {:>8}", level.to_string(), n);
    }
    Ok(())
}
