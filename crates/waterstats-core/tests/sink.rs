use std::env;

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::postgres::PgConnection;
use waterstats_core::schema::DistrictWaterStats;
use waterstats_core::{db, sink, PipelineError, TableName, WriteStage};

async fn test_connection(test_name: &str) -> Result<Option<PgConnection>> {
    let database_url = match env::var("WATERSTATS_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping {test_name} because WATERSTATS_TEST_DATABASE_URL is not set");
            return Ok(None);
        }
    };
    Ok(Some(db::connect(&database_url).await?))
}

async fn fresh_table(conn: &mut PgConnection, name: &str) -> Result<TableName> {
    sqlx::query(&format!("DROP TABLE IF EXISTS \"{name}\""))
        .execute(&mut *conn)
        .await?;
    Ok(name.parse()?)
}

fn record(day: u32, district: &str, evapo: f64, soil: f64) -> DistrictWaterStats {
    DistrictWaterStats {
        date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
        state_name: "Telangana".into(),
        district_name: district.into(),
        evapotranspiration_level: Some(evapo),
        evapotranspiration_volume: Some(0.4),
        aggregate_evapotranspiration_level: Some(12.5),
        aggregate_evapotranspiration_volume: None,
        avg_soilmoisture_level: Some(soil),
        avg_soilmoisture_volume: Some(0.7),
        aggregate_soilmoisture_percentage: Some(18.2),
        volume_soilmoisture_percentage: Some(22.4),
        water_efficiency: Some(soil / if evapo == 0.0 { 1.0 } else { evapo }),
        moisture_deficit: Some(evapo - soil),
    }
}

#[tokio::test]
async fn persist_reports_every_row_written() -> Result<()> {
    let Some(mut conn) = test_connection("persist_reports_every_row_written").await? else {
        return Ok(());
    };
    let table = fresh_table(&mut conn, "waterstats_sink_rows").await?;

    // More than one INSERT chunk.
    let records: Vec<_> = (0..sink::INSERT_CHUNK_ROWS + 5)
        .map(|i| record(1 + (i % 28) as u32, &format!("D{i}"), 2.0, 4.0))
        .collect();

    let report = sink::persist(&mut conn, &table, &records).await?;
    assert_eq!(report.rows_written, records.len() as u64);

    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table.quoted()))
        .fetch_one(&mut conn)
        .await?;
    assert_eq!(count, records.len() as i64);

    sqlx::query(&format!("DROP TABLE {}", table.quoted()))
        .execute(&mut conn)
        .await?;
    db::close(conn).await;
    Ok(())
}

#[tokio::test]
async fn persisted_row_round_trips_values() -> Result<()> {
    let Some(mut conn) = test_connection("persisted_row_round_trips_values").await? else {
        return Ok(());
    };
    let table = fresh_table(&mut conn, "waterstats_sink_values").await?;

    let written = record(1, "Adilabad", 0.0, 5.0);
    sink::persist(&mut conn, &table, std::slice::from_ref(&written)).await?;

    let (date, district, level, aggregate_volume, efficiency, deficit): (
        NaiveDate,
        String,
        Option<f64>,
        Option<f64>,
        Option<f64>,
        Option<f64>,
    ) = sqlx::query_as(&format!(
        "SELECT \"Date\", \"DistrictName\", \"Evapotranspiration_Level\", \
         \"Aggregate_Evapotranspiration_Volume\", \"Water_Efficiency\", \"Moisture_Deficit\" \
         FROM {}",
        table.quoted()
    ))
    .fetch_one(&mut conn)
    .await?;

    assert_eq!(date, written.date);
    assert_eq!(district, "Adilabad");
    assert_eq!(level, Some(0.0));
    assert_eq!(aggregate_volume, None);
    assert_eq!(efficiency, Some(5.0));
    assert_eq!(deficit, Some(-5.0));

    sqlx::query(&format!("DROP TABLE {}", table.quoted()))
        .execute(&mut conn)
        .await?;
    db::close(conn).await;
    Ok(())
}

#[tokio::test]
async fn empty_batch_still_creates_table() -> Result<()> {
    let Some(mut conn) = test_connection("empty_batch_still_creates_table").await? else {
        return Ok(());
    };
    let table = fresh_table(&mut conn, "waterstats_sink_empty").await?;

    let report = sink::persist(&mut conn, &table, &[]).await?;
    assert_eq!(report.rows_written, 0);

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = $1)",
    )
    .bind(table.name())
    .fetch_one(&mut conn)
    .await?;
    assert!(exists);

    sqlx::query(&format!("DROP TABLE {}", table.quoted()))
        .execute(&mut conn)
        .await?;
    db::close(conn).await;
    Ok(())
}

#[tokio::test]
async fn failed_insert_rolls_back_the_batch() -> Result<()> {
    let Some(mut conn) = test_connection("failed_insert_rolls_back_the_batch").await? else {
        return Ok(());
    };
    let table = fresh_table(&mut conn, "waterstats_sink_rollback").await?;
    sink::ensure_table(&mut conn, &table).await?;
    sqlx::query(&format!(
        "ALTER TABLE {} ADD CONSTRAINT district_not_bad CHECK (\"DistrictName\" <> 'Bad')",
        table.quoted()
    ))
    .execute(&mut conn)
    .await?;

    // The offending row sits in the second chunk; the first must not survive.
    let mut records: Vec<_> = (0..sink::INSERT_CHUNK_ROWS)
        .map(|i| record(1, &format!("D{i}"), 1.0, 1.0))
        .collect();
    records.push(record(1, "Bad", 1.0, 1.0));

    let err = sink::persist(&mut conn, &table, &records)
        .await
        .unwrap_err();
    assert_eq!(err.category(), "write");
    assert!(matches!(
        err,
        PipelineError::Write {
            stage: WriteStage::Insert,
            ..
        }
    ));

    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table.quoted()))
        .fetch_one(&mut conn)
        .await?;
    assert_eq!(count, 0);

    sqlx::query(&format!("DROP TABLE {}", table.quoted()))
        .execute(&mut conn)
        .await?;
    db::close(conn).await;
    Ok(())
}
