use crate::{
    AllocationStrategy, CounterAllocator, IdAllocator, MemorySpreadsheets, MemoryWorksheet,
    ReadMaxAllocator, Row, Spreadsheet, SpreadsheetProvider, StoreError, Worksheet, max_assigned_id,
    next_id_after, parse_id_cell,
};

const BOOK: &str = "book";
const SHEET: &str = "Tokyo";

async fn worksheet(sheets: &MemorySpreadsheets) -> MemoryWorksheet {
    sheets
        .open(BOOK)
        .await
        .unwrap()
        .worksheet(SHEET)
        .await
        .unwrap()
        .unwrap()
}

fn row(id: u64) -> Row {
    Row {
        id,
        post_type: "フォーム投稿".into(),
        last_post_timestamp: "2030-01-01 00:00:00".into(),
        char_count: 1,
        content: "x".into(),
        media_url: String::new(),
        enabled: false,
        posted_count: 0,
    }
}

/// Allocates and appends `n` rows in sequence, returning the ids handed out.
async fn run_allocate_append<A: IdAllocator>(
    allocator: &A,
    sheet: &MemoryWorksheet,
    n: usize,
) -> Vec<u64> {
    let mut ids = Vec::with_capacity(n);
    for _ in 0..n {
        let id = allocator.next_id(sheet).await.unwrap();
        sheet.append_row(&row(id)).await.unwrap();
        ids.push(id);
    }
    ids
}

async fn run_empty_worksheet_starts_at_one<A: IdAllocator>(allocator: A) {
    let sheets = MemorySpreadsheets::new();
    sheets.add_worksheet(BOOK, SHEET, &["ID"]);
    let sheet = worksheet(&sheets).await;

    assert_eq!(run_allocate_append(&allocator, &sheet, 4).await, [1, 2, 3, 4]);
}

async fn run_continues_after_existing_max<A: IdAllocator>(allocator: A) {
    let sheets = MemorySpreadsheets::new();
    sheets.add_worksheet(BOOK, SHEET, &["ID"]);
    sheets.push_row(BOOK, SHEET, &["3"]);
    sheets.push_row(BOOK, SHEET, &["7"]);
    sheets.push_row(BOOK, SHEET, &["5"]);
    let sheet = worksheet(&sheets).await;

    assert_eq!(run_allocate_append(&allocator, &sheet, 2).await, [8, 9]);
}

async fn run_exhausted_id_space_is_an_error<A: IdAllocator>(allocator: A) {
    let sheets = MemorySpreadsheets::new();
    sheets.add_worksheet(BOOK, SHEET, &["ID"]);
    sheets.push_row(BOOK, SHEET, &["18446744073709551614"]);
    let sheet = worksheet(&sheets).await;

    assert_eq!(allocator.next_id(&sheet).await.unwrap(), u64::MAX);
    sheet.append_row(&row(u64::MAX)).await.unwrap();
    assert_eq!(
        allocator.next_id(&sheet).await,
        Err(StoreError::IdSpaceExhausted {
            worksheet: SHEET.into(),
        })
    );
}

#[tokio::test]
async fn read_max_empty_worksheet_starts_at_one() {
    run_empty_worksheet_starts_at_one(ReadMaxAllocator::new()).await;
}

#[tokio::test]
async fn counter_empty_worksheet_starts_at_one() {
    run_empty_worksheet_starts_at_one(CounterAllocator::new()).await;
}

#[tokio::test]
async fn read_max_continues_after_existing_max() {
    run_continues_after_existing_max(ReadMaxAllocator::new()).await;
}

#[tokio::test]
async fn counter_continues_after_existing_max() {
    run_continues_after_existing_max(CounterAllocator::new()).await;
}

#[tokio::test]
async fn read_max_exhausted_id_space_is_an_error() {
    run_exhausted_id_space_is_an_error(ReadMaxAllocator::new()).await;
}

#[tokio::test]
async fn counter_exhausted_id_space_is_an_error() {
    run_exhausted_id_space_is_an_error(CounterAllocator::new()).await;
}

#[tokio::test]
async fn headerless_empty_worksheet_starts_at_one() {
    let sheets = MemorySpreadsheets::new();
    sheets.add_worksheet(BOOK, SHEET, &[]);
    let sheet = worksheet(&sheets).await;

    assert_eq!(ReadMaxAllocator.next_id(&sheet).await.unwrap(), 1);
}

#[tokio::test]
async fn read_max_sees_external_writers() {
    let sheets = MemorySpreadsheets::new();
    sheets.add_worksheet(BOOK, SHEET, &["ID"]);
    let sheet = worksheet(&sheets).await;
    let allocator = ReadMaxAllocator::new();

    assert_eq!(allocator.next_id(&sheet).await.unwrap(), 1);
    sheets.push_row(BOOK, SHEET, &["40"]);
    assert_eq!(allocator.next_id(&sheet).await.unwrap(), 41);
}

#[tokio::test]
async fn counter_does_not_reread_until_forgotten() {
    let sheets = MemorySpreadsheets::new();
    sheets.add_worksheet(BOOK, SHEET, &["ID"]);
    let sheet = worksheet(&sheets).await;
    let allocator = CounterAllocator::new();

    assert_eq!(allocator.next_id(&sheet).await.unwrap(), 1);
    sheets.push_row(BOOK, SHEET, &["40"]);
    // Never appended, but the counter has moved on.
    assert_eq!(allocator.next_id(&sheet).await.unwrap(), 2);

    allocator.forget(SHEET);
    assert_eq!(allocator.next_id(&sheet).await.unwrap(), 41);
}

#[tokio::test]
async fn counter_hands_out_distinct_ids_to_overlapping_calls() {
    let sheets = MemorySpreadsheets::new();
    sheets.add_worksheet(BOOK, SHEET, &["ID"]);
    sheets.push_row(BOOK, SHEET, &["10"]);
    let sheet = worksheet(&sheets).await;
    let allocator = CounterAllocator::new();

    let (a, b, c) = tokio::join!(
        allocator.next_id(&sheet),
        allocator.next_id(&sheet),
        allocator.next_id(&sheet),
    );
    let mut ids = vec![a.unwrap(), b.unwrap(), c.unwrap()];
    ids.sort_unstable();
    assert_eq!(ids, [11, 12, 13]);
}

#[test]
fn next_id_rule() {
    assert_eq!(next_id_after(None), Some(1));
    assert_eq!(next_id_after(Some(0)), Some(1));
    assert_eq!(next_id_after(Some(7)), Some(8));
    assert_eq!(next_id_after(Some(u64::MAX)), None);
}

#[test]
fn blank_and_garbage_cells_are_skipped() {
    assert_eq!(max_assigned_id::<&str>(&[]), None);
    assert_eq!(max_assigned_id(&["", "  ", ""]), None);
    assert_eq!(max_assigned_id(&["2", "", "abc", "9", "-4", "1.5"]), Some(9));
    assert_eq!(max_assigned_id(&[String::from("12.0"), String::from(" 3 ")]), Some(12));
}

#[test]
fn id_cell_parsing() {
    assert_eq!(parse_id_cell("7"), Some(7));
    assert_eq!(parse_id_cell(" 7 "), Some(7));
    assert_eq!(parse_id_cell("7.0"), Some(7));
    assert_eq!(parse_id_cell("7.5"), None);
    assert_eq!(parse_id_cell("-1"), None);
    assert_eq!(parse_id_cell("NaN"), None);
    assert_eq!(parse_id_cell("ID"), None);
    assert_eq!(parse_id_cell("18446744073709551615"), Some(u64::MAX));
    assert_eq!(parse_id_cell("1.8446744073709552e19"), None);
}

#[tokio::test]
async fn strategy_parses_and_delegates() {
    let sheets = MemorySpreadsheets::new();
    sheets.add_worksheet(BOOK, SHEET, &["ID"]);
    sheets.push_row(BOOK, SHEET, &["5"]);
    let sheet = worksheet(&sheets).await;

    let strategy: AllocationStrategy = "counter".parse().unwrap();
    assert_eq!(strategy.to_string(), "counter");
    assert_eq!(run_allocate_append(&strategy, &sheet, 2).await, [6, 7]);

    let strategy: AllocationStrategy = "READ-MAX".parse().unwrap();
    assert_eq!(strategy.next_id(&sheet).await.unwrap(), 8);

    assert!("random".parse::<AllocationStrategy>().is_err());
}
