use std::env;
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use waterstats_core::error::ConnectionError;
use waterstats_core::pipeline::{self, PipelineRun};
use waterstats_core::{db, PipelineConfig, PipelineError};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../waterstats-parser/tests/data")
        .join(name)
}

fn fixture_config() -> PipelineConfig {
    PipelineConfig {
        evapotranspiration_path: fixture_path("evapotranspiration.csv"),
        soil_moisture_path: fixture_path("soil_moisture.csv"),
        ..PipelineConfig::default()
    }
}

#[test]
fn prepare_joins_fixture_exports() {
    let prepared = pipeline::prepare(&fixture_config(), &PipelineRun::new()).expect("prepare");

    assert_eq!(prepared.transform.evapo_rows, 4);
    assert_eq!(prepared.transform.soil_rows, 4);
    // Bidar only matches on state/district, not on date.
    assert_eq!(prepared.records.len(), 3);

    let first = &prepared.records[0];
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    assert_eq!(first.state_name, "Telangana");
    assert_eq!(first.district_name, "Adilabad");
    assert_eq!(first.evapotranspiration_level, Some(0.0));
    assert_eq!(first.water_efficiency, Some(5.0));
    assert_eq!(first.moisture_deficit, Some(-5.0));

    assert!(prepared
        .records
        .iter()
        .all(|record| record.district_name != "Bidar"));
}

#[tokio::test]
async fn dry_run_skips_the_database() {
    let config = PipelineConfig {
        dry_run: true,
        ..fixture_config()
    };
    let run = PipelineRun::new();

    let summary = pipeline::run(&config, &run).await.expect("dry run");
    assert_eq!(summary.run_id, run.run_id);
    assert_eq!(summary.joined_rows, 3);
    assert_eq!(summary.rows_written, None);
}

#[tokio::test]
async fn missing_database_url_is_a_connection_error() {
    let err = pipeline::run(&fixture_config(), &PipelineRun::new())
        .await
        .unwrap_err();

    assert_eq!(err.category(), "connection");
    assert!(matches!(
        err,
        PipelineError::Connection(ConnectionError::MissingUrl)
    ));
}

#[tokio::test]
async fn unreadable_source_is_a_load_error() {
    let config = PipelineConfig {
        soil_moisture_path: fixture_path("missing.csv"),
        database_url: Some("postgres://unused@localhost/unused".into()),
        ..fixture_config()
    };
    let err = pipeline::run(&config, &PipelineRun::new())
        .await
        .unwrap_err();

    assert_eq!(err.category(), "load");
    assert!(matches!(
        err,
        PipelineError::Load {
            source_name: "soil moisture",
            ..
        }
    ));
}

#[tokio::test]
async fn invalid_table_name_is_rejected_before_loading() {
    let config = PipelineConfig {
        table: "stats; DROP TABLE stats".into(),
        evapotranspiration_path: fixture_path("missing.csv"),
        ..fixture_config()
    };
    let err = pipeline::run(&config, &PipelineRun::new())
        .await
        .unwrap_err();

    assert_eq!(err.category(), "config");
}

#[tokio::test]
async fn rerun_inserts_the_same_rows_again() -> Result<()> {
    let database_url = match env::var("WATERSTATS_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping rerun_inserts_the_same_rows_again because WATERSTATS_TEST_DATABASE_URL is not set"
            );
            return Ok(());
        }
    };

    let table = "waterstats_pipeline_rerun";
    let mut conn = db::connect(&database_url).await?;
    sqlx::query(&format!("DROP TABLE IF EXISTS \"{table}\""))
        .execute(&mut conn)
        .await?;

    let config = PipelineConfig {
        table: table.into(),
        database_url: Some(database_url.clone()),
        ..fixture_config()
    };

    let first = pipeline::run(&config, &PipelineRun::new()).await?;
    assert_eq!(first.rows_written, Some(3));

    // Table creation is idempotent; row insertion is not.
    let second = pipeline::run(&config, &PipelineRun::new()).await?;
    assert_eq!(second.rows_written, Some(3));

    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM \"{table}\""))
        .fetch_one(&mut conn)
        .await?;
    assert_eq!(count, 6);

    let bidar: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM \"{table}\" WHERE \"DistrictName\" = $1"
    ))
    .bind("Bidar")
    .fetch_one(&mut conn)
    .await?;
    assert_eq!(bidar, 0);

    sqlx::query(&format!("DROP TABLE \"{table}\""))
        .execute(&mut conn)
        .await?;
    db::close(conn).await;
    Ok(())
}
