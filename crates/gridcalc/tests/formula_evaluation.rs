//! End-to-end tests for cell evaluation and block copies

use gridcalc::prelude::*;

fn pos(address: &str) -> Position {
    Position::parse(address).unwrap()
}

/// Assert a numeric cell value with a relative tolerance
fn assert_number(sheet: &Spreadsheet, address: &str, expected: f64) {
    match sheet.value(address).unwrap() {
        CellValue::Number(n) => assert!(
            (n - expected).abs() <= 1e-9 * expected.abs().max(1.0),
            "{}: {} != {}",
            address,
            n,
            expected
        ),
        other => panic!("{}: expected {}, got {:?}", address, expected, other),
    }
}

fn assert_empty(sheet: &Spreadsheet, address: &str) {
    assert_eq!(sheet.value(address).unwrap(), CellValue::Empty, "{}", address);
}

fn literal_sheet() -> Spreadsheet {
    let mut sheet = Spreadsheet::new();
    sheet.set_cell("A1", "10").unwrap();
    sheet.set_cell("A2", "20.5").unwrap();
    sheet.set_cell("A3", "3e1").unwrap();
    sheet.set_cell("A4", "=40").unwrap();
    sheet.set_cell("A5", "=5e+1").unwrap();
    sheet
        .set_cell(
            "A6",
            "raw text with any characters, including a quote \" or a newline\n",
        )
        .unwrap();
    sheet
        .set_cell(
            "A7",
            "=\"quoted string, quotes must be doubled: \"\". Moreover, pipes | are fine.\"",
        )
        .unwrap();
    sheet
}

/// Literal and constant-formula cells
#[test]
fn test_literals() {
    let sheet = literal_sheet();

    assert_number(&sheet, "A1", 10.0);
    assert_number(&sheet, "A2", 20.5);
    assert_number(&sheet, "A3", 30.0);
    assert_number(&sheet, "A4", 40.0);
    assert_number(&sheet, "A5", 50.0);
    assert_eq!(
        sheet.value("A6").unwrap().as_string(),
        Some("raw text with any characters, including a quote \" or a newline\n")
    );
    assert_eq!(
        sheet.value("A7").unwrap().as_string(),
        Some("quoted string, quotes must be doubled: \". Moreover, pipes | are fine.")
    );
    assert_empty(&sheet, "A8");
    assert_empty(&sheet, "AAAA9999");
}

/// Formulas over literal cells, recomputed after every edit
#[test]
fn test_dependent_formulas() {
    let mut sheet = literal_sheet();
    sheet.set_cell("B1", "=A1+A2*A3").unwrap();
    sheet.set_cell("B2", "= -A1 ^ 2 - A2 / 2   ").unwrap();
    sheet.set_cell("B3", "= 2 ^ $A$1").unwrap();
    sheet.set_cell("B4", "=($A1+A$2)^2").unwrap();
    sheet.set_cell("B5", "=B1+B2+B3+B4").unwrap();
    sheet.set_cell("B6", "=B1+B2+B3+B4+B5").unwrap();

    assert_number(&sheet, "B1", 625.0);
    assert_number(&sheet, "B2", -110.25);
    assert_number(&sheet, "B3", 1024.0);
    assert_number(&sheet, "B4", 930.25);
    assert_number(&sheet, "B5", 2469.0);
    assert_number(&sheet, "B6", 4938.0);

    sheet.set_cell("A1", "12").unwrap();
    assert_number(&sheet, "B1", 627.0);
    assert_number(&sheet, "B2", -154.25);
    assert_number(&sheet, "B3", 4096.0);
    assert_number(&sheet, "B4", 1056.25);
    assert_number(&sheet, "B5", 5625.0);
    assert_number(&sheet, "B6", 11250.0);

    // Clones are independent
    let mut other = sheet.clone();
    sheet.set_cell("A2", "100").unwrap();
    other.set_cell("A2", "=A3+A5+A4").unwrap();

    assert_number(&sheet, "B1", 3012.0);
    assert_number(&sheet, "B2", -194.0);
    assert_number(&sheet, "B4", 12544.0);
    assert_number(&sheet, "B5", 19458.0);
    assert_number(&sheet, "B6", 38916.0);

    assert_number(&other, "B1", 3612.0);
    assert_number(&other, "B2", -204.0);
    assert_number(&other, "B4", 17424.0);
    assert_number(&other, "B5", 24928.0);
    assert_number(&other, "B6", 49856.0);
}

/// Text operands
#[test]
fn test_text_operations() {
    let mut sheet = literal_sheet();
    sheet.set_cell("C1", "=A6+A7").unwrap();
    sheet.set_cell("C2", "=A6+A1").unwrap();
    sheet.set_cell("C3", "=\"abc\"<\"abd\"").unwrap();
    sheet.set_cell("C4", "=A1=\"10\"").unwrap();

    assert!(sheet.value("C1").unwrap().as_string().is_some());
    assert_empty(&sheet, "C2");
    assert_number(&sheet, "C3", 1.0);
    assert_number(&sheet, "C4", 0.0);
}

fn copy_sheet() -> Spreadsheet {
    let mut sheet = Spreadsheet::new();
    for (i, address) in ["D0", "D1", "D2", "D3", "D4"].iter().enumerate() {
        sheet.set_cell(address, &((i + 1) * 10).to_string()).unwrap();
    }
    for (i, address) in ["E0", "E1", "E2", "E3", "E4"].iter().enumerate() {
        sheet.set_cell(address, &((i + 6) * 10).to_string()).unwrap();
    }
    sheet.set_cell("F10", "=D0+5").unwrap();
    sheet.set_cell("F11", "=$D0+5").unwrap();
    sheet.set_cell("F12", "=D$0+5").unwrap();
    sheet.set_cell("F13", "=$D$0+5").unwrap();
    sheet
}

/// Copies shift relative axes only, and read the whole source first
#[test]
fn test_copy_rect() {
    let mut sheet = copy_sheet();

    sheet.copy_rect(pos("G11"), pos("F10"), 1, 4);
    for address in ["F10", "F11", "F12", "F13"] {
        assert_number(&sheet, address, 15.0);
    }
    assert_empty(&sheet, "F14");
    assert_empty(&sheet, "G10");
    assert_number(&sheet, "G11", 75.0);
    assert_number(&sheet, "G12", 25.0);
    assert_number(&sheet, "G13", 65.0);
    assert_number(&sheet, "G14", 15.0);

    // Overlaps its own output: G11..G13 are read before being rewritten
    sheet.copy_rect(pos("G11"), pos("F10"), 2, 4);
    assert_number(&sheet, "G11", 75.0);
    assert_number(&sheet, "G12", 25.0);
    assert_number(&sheet, "G13", 65.0);
    assert_number(&sheet, "G14", 15.0);
    assert_empty(&sheet, "H10");
    assert_empty(&sheet, "H11");
    assert_empty(&sheet, "H12");
    assert_number(&sheet, "H13", 35.0);
    assert_empty(&sheet, "H14");

    sheet.set_cell("F0", "-27").unwrap();
    assert_number(&sheet, "H14", -22.0);

    sheet.copy_rect(pos("H12"), pos("H13"), 1, 2);
    assert_number(&sheet, "H12", 25.0);
    assert_number(&sheet, "H13", -22.0);
    assert_number(&sheet, "H14", -22.0);
}

/// A 2x2 block copied one cell down-right onto itself
#[test]
fn test_copy_rect_overlap() {
    let mut sheet = Spreadsheet::new();
    sheet.set_cell("V5", "1").unwrap();
    sheet.set_cell("W5", "2").unwrap();
    sheet.set_cell("V6", "3").unwrap();
    sheet.set_cell("W6", "4").unwrap();

    sheet.copy_rect(pos("W6"), pos("V5"), 2, 2);
    assert_number(&sheet, "W6", 1.0);
    assert_number(&sheet, "X6", 2.0);
    assert_number(&sheet, "W7", 3.0);
    assert_number(&sheet, "X7", 4.0);
    assert_number(&sheet, "V5", 1.0);
}

/// Copies of absolute references keep pointing at the same cells
#[test]
fn test_copy_rect_absolute_block() {
    let mut sheet = literal_sheet();
    sheet.set_cell("B1", "=$A$1+$A$2*$A$3").unwrap();
    sheet.set_cell("B2", "= -$A$1 ^ 2 - $A$2 / 2   ").unwrap();
    sheet.set_cell("B3", "= 2 ^ $A$1").unwrap();
    sheet.set_cell("B4", "=($A$1+$A$2)^2").unwrap();
    sheet.set_cell("B5", "=$B$1+$B$2+$B$3+$B$4").unwrap();
    sheet.set_cell("B6", "=$B$1+$B$2+$B$3+$B$4+$B$5").unwrap();

    sheet.copy_rect(pos("AA1"), pos("A1"), 2, 10);
    for row in 1..=10 {
        for col in ["A", "B"] {
            let src = format!("{}{}", col, row);
            let dst = format!("A{}{}", col, row);
            assert_eq!(sheet.value(&src).unwrap(), sheet.value(&dst).unwrap(), "{}", dst);
        }
    }
}

/// Cycles evaluate empty, shared precedents do not
#[test]
fn test_reference_cycles() {
    let mut sheet = Spreadsheet::new();
    sheet.set_cell("Z0", "=Z1+Z2").unwrap();
    sheet.set_cell("Z1", "=Z3").unwrap();
    sheet.set_cell("Z2", "=Z3").unwrap();
    sheet.set_cell("Z3", "1024").unwrap();
    assert_number(&sheet, "Z0", 2048.0);

    sheet.set_cell("Z4", "=Z4+3").unwrap();
    assert_empty(&sheet, "Z4");

    sheet.set_cell("Z5", "=Z6+20").unwrap();
    sheet.set_cell("Z6", "=Z5-6").unwrap();
    assert_empty(&sheet, "Z5");
    assert_empty(&sheet, "Z6");

    // Unrelated cells are unaffected
    assert_number(&sheet, "Z0", 2048.0);
}

/// Long reference chains are evaluated, not mistaken for cycles
#[test]
fn test_long_chain() {
    let mut sheet = Spreadsheet::new();
    sheet.set_cell("A1", "1").unwrap();
    for row in 2..=20_000 {
        sheet
            .set_cell(&format!("A{}", row), &format!("=A{}+1", row - 1))
            .unwrap();
    }
    assert_number(&sheet, "A200", 200.0);
    assert_number(&sheet, "A20000", 20_000.0);

    // Closing the chain makes every cell on it empty
    sheet.set_cell("A1", "=A20000").unwrap();
    assert_empty(&sheet, "A20000");
    assert_empty(&sheet, "A2");
}

/// Formulas nested past the limit are rejected instead of overflowing
#[test]
fn test_deeply_nested_formula_is_rejected() {
    let mut sheet = Spreadsheet::new();
    sheet.set_cell("A1", "1").unwrap();

    let deep = format!("={}A1{}", "(".repeat(50_000), ")".repeat(50_000));
    assert!(matches!(
        sheet.set_cell("B1", &deep),
        Err(SpreadsheetError::Formula(_))
    ));

    let long_sum = format!("={}", vec!["A1"; 50_000].join("+"));
    assert!(sheet.set_cell("B2", &long_sum).is_err());
    assert_eq!(sheet.len(), 1);
}
