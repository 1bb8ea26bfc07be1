//! Workbook fixtures for tests

use std::path::Path;

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

#[derive(Debug, Clone, Copy)]
pub enum Cell {
    Str(&'static str),
    Num(f64),
    /// A real date cell, given as `yyyy-mm-dd` or `yyyy-mm-ddThh:mm:ss`
    Date(&'static str),
}

pub struct SheetFixture<'a> {
    pub name: &'a str,
    pub headers: &'a [&'a str],
    pub rows: Vec<Vec<Cell>>,
}

/// Write `sheets` to an xlsx file at `path`, header in row 0
pub fn write_workbook(path: &Path, sheets: &[SheetFixture<'_>]) {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for sheet in sheets {
        let ws = workbook.add_worksheet();
        ws.set_name(sheet.name).unwrap();

        for (col, header) in sheet.headers.iter().enumerate() {
            ws.write_string(0, col as u16, *header).unwrap();
        }
        for (row, cells) in sheet.rows.iter().enumerate() {
            let row = row as u32 + 1;
            for (col, cell) in cells.iter().enumerate() {
                match cell {
                    Cell::Str(s) => {
                        ws.write_string(row, col as u16, *s).unwrap();
                    }
                    Cell::Num(n) => {
                        ws.write_number(row, col as u16, *n).unwrap();
                    }
                    Cell::Date(s) => {
                        let date = ExcelDateTime::parse_from_str(s).unwrap();
                        ws.write_datetime_with_format(row, col as u16, &date, &date_format)
                            .unwrap();
                    }
                }
            }
        }
    }

    workbook.save(path).unwrap();
}

pub const CUSTOMER_HEADERS: &[&str] =
    &["Customer Number", "Customer Name", "Country", "Region", "Sales Rep"];

pub const PRODUCT_HEADERS: &[&str] = &[
    "Product Code",
    "Product",
    "Product Category Code",
    "Product Category",
    "Standard Price",
    "Variable Cost",
    "Gross Margin",
    "Year",
];

pub const SALES_HEADERS: &[&str] = &[
    "Product",
    "Account",
    "Invoice Number",
    "Invoice Date",
    "Year",
    "Month",
    "Quantity",
    "Invoice Amount",
];

pub const BUDGET_HEADERS: &[&str] = &["Product Code", "Account", "Year", "Month", "Budget"];

pub fn customer_rows() -> Vec<Vec<Cell>> {
    use Cell::*;
    vec![
        vec![Num(1001.0), Str("Acme"), Str("Netherlands"), Str("West"), Str("Ann")],
        vec![Num(1002.0), Str("Globex"), Str("Germany"), Str("Central"), Str("Bob")],
        // Same customer, different rep: a duplicate once the rep column is dropped
        vec![Num(1001.0), Str("Acme"), Str("Netherlands"), Str("West"), Str("Cas")],
    ]
}

pub fn product_rows() -> Vec<Vec<Cell>> {
    use Cell::*;
    vec![
        vec![Num(1.0), Str("Widget"), Num(10.0), Str("Hardware"), Num(20.0), Num(12.0), Num(8.0), Num(2018.0)],
        vec![Num(2.0), Str("Gadget"), Num(20.0), Str("Software"), Num(50.0), Num(10.0), Num(40.0), Num(2018.0)],
        vec![Num(1.0), Str("Widget"), Num(10.0), Str("Hardware"), Num(21.0), Num(12.5), Num(8.5), Num(2019.0)],
    ]
}

pub fn sales_rows() -> Vec<Vec<Cell>> {
    use Cell::*;
    vec![
        vec![Num(1.0), Num(1001.0), Num(5001.0), Date("2018-01-05"), Num(2018.0), Num(1.0), Num(3.0), Num(60.0)],
        vec![Num(2.0), Num(1002.0), Num(5002.0), Date("2018-02-10T14:45:00"), Num(2018.0), Num(2.0), Num(1.0), Num(50.0)],
        vec![Num(1.0), Num(1002.0), Num(5003.0), Str("2019-03-01 09:30:00"), Num(2019.0), Str("Mar"), Num(2.0), Num(42.0)],
        vec![Num(1.0), Num(1001.0), Num(5001.0), Date("2018-01-05"), Num(2018.0), Num(1.0), Num(3.0), Num(60.0)],
    ]
}

/// A second sales sheet whose rows would violate the customers foreign key
pub fn archived_sales_rows() -> Vec<Vec<Cell>> {
    use Cell::*;
    vec![vec![Num(1.0), Num(9999.0), Num(4001.0), Str("2017-06-01"), Num(2018.0), Num(6.0), Num(1.0), Num(20.0)]]
}

pub fn budget_rows() -> Vec<Vec<Cell>> {
    use Cell::*;
    vec![
        vec![Num(1.0), Num(1001.0), Num(2018.0), Num(1.0), Num(100.0)],
        vec![Num(2.0), Num(1002.0), Num(2018.0), Num(2.0), Num(75.0)],
    ]
}

/// Write the four source workbooks for the standard registry into `dir`
pub fn write_standard_workbooks(dir: &Path) {
    write_workbook(
        &dir.join("Customer_Data.xlsx"),
        &[SheetFixture {
            name: "Customers",
            headers: CUSTOMER_HEADERS,
            rows: customer_rows(),
        }],
    );
    write_workbook(
        &dir.join("Product_data.xlsx"),
        &[SheetFixture {
            name: "Products",
            headers: PRODUCT_HEADERS,
            rows: product_rows(),
        }],
    );
    write_workbook(
        &dir.join("Sales_Data.xlsx"),
        &[
            SheetFixture {
                name: "Sales",
                headers: SALES_HEADERS,
                rows: sales_rows(),
            },
            SheetFixture {
                name: "Archive",
                headers: SALES_HEADERS,
                rows: archived_sales_rows(),
            },
        ],
    );
    write_workbook(
        &dir.join("Sales_budgets.xlsx"),
        &[SheetFixture {
            name: "Budgets",
            headers: BUDGET_HEADERS,
            rows: budget_rows(),
        }],
    );
}
