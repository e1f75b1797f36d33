//! 报表导出：按用户选择的列与顺序生成表格，再写成 xlsx 或可打印 HTML

use rust_xlsxwriter::{Format, Workbook};

use crate::error::{AppError, AppResult};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, Copy)]
pub struct ReportColumn {
    pub key: &'static str,
    pub header: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n as f64)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}

/// 可导出的报表行
pub trait ReportRow {
    const COLUMNS: &'static [ReportColumn];

    fn row_id(&self) -> i64;

    /// `key` 一定来自 `COLUMNS`
    fn cell(&self, key: &str) -> Cell;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// 只保留选中的列并按选中顺序排列；没有数据行时不生成文件
pub fn select_columns<R: ReportRow>(rows: &[R], columns: &[String]) -> AppResult<ExportTable> {
    if columns.is_empty() {
        return Err(AppError::field("columns", "select at least one column"));
    }

    let selected = columns
        .iter()
        .map(|key| {
            R::COLUMNS
                .iter()
                .find(|c| c.key == key.as_str())
                .ok_or_else(|| AppError::field("columns", format!("unknown column {}", key)))
        })
        .collect::<AppResult<Vec<&ReportColumn>>>()?;

    if rows.is_empty() {
        return Err(AppError::NoData);
    }

    Ok(ExportTable {
        headers: selected.iter().map(|c| c.header.to_string()).collect(),
        rows: rows
            .iter()
            .map(|row| selected.iter().map(|c| row.cell(c.key)).collect())
            .collect(),
    })
}

#[derive(Debug, PartialEq)]
enum SheetCell<'a> {
    Header(&'a str),
    Value(&'a Cell),
}

/// (行, 列, 内容)：第 0 行为表头，数据从第 1 行开始
fn sheet_cells(table: &ExportTable) -> Vec<(u32, u16, SheetCell<'_>)> {
    let headers = table
        .headers
        .iter()
        .enumerate()
        .map(|(col, header)| (0, col as u16, SheetCell::Header(header.as_str())));
    let values = table.rows.iter().enumerate().flat_map(|(index, row)| {
        row.iter()
            .enumerate()
            .map(move |(col, cell)| ((index + 1) as u32, col as u16, SheetCell::Value(cell)))
    });
    headers.chain(values).collect()
}

pub fn to_xlsx(table: &ExportTable, sheet_name: &str) -> AppResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (row, col, cell) in sheet_cells(table) {
        match cell {
            SheetCell::Header(header) => {
                worksheet.write_string_with_format(row, col, header, &bold)?;
            }
            SheetCell::Value(Cell::Text(s)) => {
                worksheet.write_string(row, col, s.as_str())?;
            }
            SheetCell::Value(Cell::Number(n)) => {
                worksheet.write_number(row, col, *n)?;
            }
            SheetCell::Value(Cell::Empty) => {}
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 供浏览器“打印为 PDF”的 HTML 文档
pub fn to_html(table: &ExportTable, title: &str) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"th\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str(
        "<style>\
         body{font-family:'Sarabun',sans-serif;margin:24px}\
         table{border-collapse:collapse;width:100%}\
         th,td{border:1px solid #999;padding:4px 8px;font-size:12px}\
         th{background:#eee}\
         @media print{@page{size:A4 landscape}}\
         </style>\n</head>\n<body>\n",
    );
    html.push_str(&format!("<h2>{}</h2>\n<table>\n<thead><tr>", escape_html(title)));
    for header in &table.headers {
        html.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(&cell.display())));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n<script>window.onload=function(){window.print();}</script>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        id: i64,
        hn: &'static str,
        visits: i64,
    }

    impl ReportRow for Row {
        const COLUMNS: &'static [ReportColumn] = &[
            ReportColumn { key: "hn", header: "HN" },
            ReportColumn { key: "visits", header: "จำนวนครั้ง" },
            ReportColumn { key: "note", header: "หมายเหตุ" },
        ];

        fn row_id(&self) -> i64 {
            self.id
        }

        fn cell(&self, key: &str) -> Cell {
            match key {
                "hn" => Cell::from(self.hn.to_string()),
                "visits" => Cell::from(self.visits),
                _ => Cell::Empty,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, hn: "HN001", visits: 3 },
            Row { id: 2, hn: "HN002", visits: 0 },
        ]
    }

    fn columns(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn columns_follow_selected_order() {
        let table = select_columns(&rows(), &columns(&["visits", "hn"])).unwrap();
        assert_eq!(table.headers, vec!["จำนวนครั้ง", "HN"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec![Cell::Number(3.0), Cell::Text("HN001".into())]);
        assert_eq!(table.rows[0].len(), 2);
    }

    #[test]
    fn zero_rows_is_no_data() {
        let empty: Vec<Row> = Vec::new();
        assert!(matches!(
            select_columns(&empty, &columns(&["hn"])),
            Err(AppError::NoData)
        ));
    }

    #[test]
    fn unknown_or_missing_columns_are_rejected() {
        assert!(matches!(
            select_columns(&rows(), &columns(&["hn", "password"])),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            select_columns(&rows(), &[]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn workbook_is_a_zip_container() {
        let table = select_columns(&rows(), &columns(&["hn", "visits", "note"])).unwrap();
        let bytes = to_xlsx(&table, "patients").unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn sheet_puts_headers_on_first_row_in_selected_order() {
        let table = select_columns(&rows(), &columns(&["visits", "hn"])).unwrap();
        let cells = sheet_cells(&table);

        let header_row: Vec<(u16, &SheetCell)> = cells
            .iter()
            .filter(|(row, _, _)| *row == 0)
            .map(|(_, col, cell)| (*col, cell))
            .collect();
        assert_eq!(
            header_row,
            vec![
                (0, &SheetCell::Header("จำนวนครั้ง")),
                (1, &SheetCell::Header("HN")),
            ]
        );

        let second: Vec<&SheetCell> = cells
            .iter()
            .filter(|(row, _, _)| *row == 2)
            .map(|(_, _, cell)| cell)
            .collect();
        assert_eq!(
            second,
            vec![
                &SheetCell::Value(&Cell::Number(0.0)),
                &SheetCell::Value(&Cell::Text("HN002".into())),
            ]
        );
        assert_eq!(cells.len(), 2 + 2 * 2);
    }

    #[test]
    fn html_escapes_cells_and_keeps_column_order() {
        let table = ExportTable {
            headers: vec!["HN".into(), "Name".into()],
            rows: vec![vec![Cell::Text("HN<1>".into()), Cell::Empty]],
        };
        let html = to_html(&table, "รายงาน & สรุป");
        assert!(html.contains("<th>HN</th><th>Name</th>"));
        assert!(html.contains("<td>HN&lt;1&gt;</td><td></td>"));
        assert!(html.contains("รายงาน &amp; สรุป"));
    }
}
