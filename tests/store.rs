use anyhow::Result;
use chrono::NaiveDate;
use movie_ranks::export::export_table;
use movie_ranks::model::{BoxOfficeRecord, RankingRecord};
use movie_ranks::store::{Store, Table};
use std::fs;
use tempfile::tempdir;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn movie(title: &str, gross: &str, pulled_at: NaiveDate) -> BoxOfficeRecord {
    BoxOfficeRecord {
        title: title.to_string(),
        total_gross: gross.to_string(),
        release_date: "2025-01-01".to_string(),
        distributor: "WB".to_string(),
        pulled_at,
    }
}

fn ranking(title: &str, score: &str, pulled_at: NaiveDate) -> RankingRecord {
    RankingRecord {
        title: title.to_string(),
        tomatometer_score: score.to_string(),
        pulled_at,
    }
}

#[test]
fn schema_is_created_on_first_use() -> Result<()> {
    let temp = tempdir()?;
    let store = Store::new(temp.path().join("nested/dir/movies.db"));

    assert_eq!(store.count(Table::BoxOffice)?, 0);
    assert_eq!(store.count(Table::Rankings)?, 0);
    assert!(store.path().exists());
    Ok(())
}

#[test]
fn appends_accumulate_and_titles_stay_distinct() -> Result<()> {
    let temp = tempdir()?;
    let store = Store::new(temp.path().join("movies.db"));
    let today = day(2025, 6, 1);

    store.append_box_office(&[movie("Dune", "$50M", today), movie("Barbie", "$30M", today)])?;
    store.append_box_office(&[movie("Barbie", "$31M", today), movie("Wonka", "$5M", today)])?;

    assert_eq!(store.count(Table::BoxOffice)?, 4);
    assert_eq!(store.distinct_titles()?, vec!["Dune", "Barbie", "Wonka"]);

    let records = store.box_office_records()?;
    assert_eq!(records[2], movie("Barbie", "$31M", today));
    Ok(())
}

#[test]
fn replace_day_history_keeps_one_listing_per_day() -> Result<()> {
    let temp = tempdir()?;
    let store = Store::new(temp.path().join("movies.db"));
    let yesterday = day(2025, 5, 31);
    let today = day(2025, 6, 1);

    store.append_box_office(&[movie("Dune", "$40M", yesterday)])?;
    store.replace_box_office_for_day(today, &[movie("Dune", "$50M", today)])?;
    store.replace_box_office_for_day(today, &[movie("Dune", "$51M", today)])?;

    let records = store.box_office_records()?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].total_gross, "$40M");
    assert_eq!(records[1].total_gross, "$51M");
    Ok(())
}

#[test]
fn rankings_replace_only_the_given_day() -> Result<()> {
    let temp = tempdir()?;
    let store = Store::new(temp.path().join("movies.db"));
    let yesterday = day(2025, 5, 31);
    let today = day(2025, 6, 1);

    store.replace_rankings_for_day(yesterday, &[ranking("Dune", "90%", yesterday)])?;
    store.replace_rankings_for_day(
        today,
        &[ranking("Dune", "92%", today), ranking("Barbie", "88%", today)],
    )?;
    store.replace_rankings_for_day(
        today,
        &[ranking("Dune", "93%", today), ranking("Barbie", "88%", today)],
    )?;

    let rows = store.rankings()?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], ranking("Dune", "90%", yesterday));

    let todays: Vec<_> = rows.iter().filter(|r| r.pulled_at == today).collect();
    assert_eq!(todays.len(), 2);
    assert_eq!(todays[0].tomatometer_score, "93%");
    Ok(())
}

#[test]
fn export_writes_header_then_rows_in_column_order() -> Result<()> {
    let temp = tempdir()?;
    let store = Store::new(temp.path().join("movies.db"));
    store.append_box_office(&[movie("Dune", "$50M", day(2025, 6, 1))])?;

    let path = temp.path().join("out/box_office.csv");
    let rows = export_table(&store, Table::BoxOffice, &path, b',')?;
    assert_eq!(rows, 1);

    let content = fs::read_to_string(&path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "id,title,total_gross,release_date,distributor,pulled_at",
            "1,Dune,$50M,2025-01-01,WB,2025-06-01",
        ]
    );
    Ok(())
}

#[test]
fn export_honours_delimiter_and_quotes_embedded_ones() -> Result<()> {
    let temp = tempdir()?;
    let store = Store::new(temp.path().join("movies.db"));
    store.replace_rankings_for_day(
        day(2025, 6, 1),
        &[ranking("Crouching Tiger; Hidden Dragon", "97%", day(2025, 6, 1))],
    )?;

    let path = temp.path().join("rankings.csv");
    export_table(&store, Table::Rankings, &path, b';')?;

    let content = fs::read_to_string(&path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "id;title;tomatometer_score;pulled_at");
    assert_eq!(lines[1], "1;\"Crouching Tiger; Hidden Dragon\";97%;2025-06-01");
    Ok(())
}

#[test]
fn empty_table_exports_only_the_header() -> Result<()> {
    let temp = tempdir()?;
    let store = Store::new(temp.path().join("movies.db"));

    let path = temp.path().join("rankings.csv");
    assert_eq!(export_table(&store, Table::Rankings, &path, b',')?, 0);
    assert_eq!(
        fs::read_to_string(&path)?,
        "id,title,tomatometer_score,pulled_at\n"
    );
    Ok(())
}
