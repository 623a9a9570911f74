mod common;

use common::FakeSheet;
use health_sync::coord::Coord;
use health_sync::csv_sink::CsvMirror;
use health_sync::metric::{CellAssignment, CellValue};
use health_sync::sheets::Spreadsheet;

fn assignment(a1: &str, value: CellValue) -> CellAssignment {
    CellAssignment {
        coord: a1.parse::<Coord>().unwrap(),
        value,
    }
}

#[tokio::test]
async fn dry_run_writes_go_to_csv_and_reads_to_the_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("nested").join("cells.csv");

    let inner = FakeSheet::with_tabs(&[("Week 1", "Y"), ("Week 2", "")]);
    let mirror = CsvMirror::new(inner, &csv_path, true);

    let week1 = mirror.open_tab("Week 1").await.unwrap().expect("tab exists");
    assert_eq!(mirror.read_cell(&week1, "B2".parse().unwrap()).await.unwrap(), "Y");
    assert!(mirror.open_tab("Week 9").await.unwrap().is_none());

    let week2 = mirror.open_tab("Week 2").await.unwrap().unwrap();
    mirror
        .bulk_write(
            &week2,
            &[
                assignment("C6", CellValue::Text("07:12".into())),
                assignment("C9", CellValue::Whole(64)),
            ],
        )
        .await
        .unwrap();
    mirror
        .bulk_write(&week2, &[assignment("C15", CellValue::Number(2.5))])
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "tab,cell,value",
            "Week 2,C6,07:12",
            "Week 2,C9,64",
            "Week 2,C15,2.5",
        ]
    );
}

#[tokio::test]
async fn empty_batch_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("cells.csv");
    let mirror = CsvMirror::new(FakeSheet::with_tabs(&[("Week 1", "")]), &csv_path, true);

    let tab = mirror.open_tab("Week 1").await.unwrap().unwrap();
    mirror.bulk_write(&tab, &[]).await.unwrap();

    assert!(!csv_path.exists());
}
