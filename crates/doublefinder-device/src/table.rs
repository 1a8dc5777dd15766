//! 表格展示
//!
//! 只读数据源：行数、列定义、按 (行, 列) 取单元格文本。单元格是记录与列的纯函数。

use serde::{Deserialize, Serialize};

use doublefinder_core::Result;

use crate::lister::DeviceSnapshot;
use crate::record::{DeviceClass, DeviceRecord};

const EMPTY_MESSAGE: &str = "(no OpenCL devices found)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Name,
    Class,
    DoublePrecision,
    Platform,
}

impl Column {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Class => "Class",
            Self::DoublePrecision => "Double Precision",
            Self::Platform => "Platform",
        }
    }
}

/// 双精度列的文字：同时体现类别与能力。
pub fn capability_text(class: DeviceClass, doubles: bool) -> &'static str {
    match (class, doubles) {
        (DeviceClass::Cpu, true) => "CPU: doubles supported",
        (DeviceClass::Cpu, false) => "CPU: no doubles",
        (DeviceClass::Gpu | DeviceClass::Accelerator, true) => "doubles supported",
        (DeviceClass::Gpu | DeviceClass::Accelerator, false) => "no doubles",
        (DeviceClass::Other, true) => "doubles supported (mystery device)",
        (DeviceClass::Other, false) => "no doubles (mystery device)",
    }
}

pub struct TablePresenter {
    records: Vec<DeviceRecord>,
    columns: Vec<Column>,
}

impl TablePresenter {
    pub fn new(records: Vec<DeviceRecord>) -> Self {
        Self {
            records,
            columns: vec![Column::Name, Column::Class, Column::DoublePrecision],
        }
    }

    pub fn from_snapshot(snapshot: &DeviceSnapshot) -> Self {
        Self::new(snapshot.records.clone())
    }

    pub fn with_platform_column(mut self) -> Self {
        if !self.columns.contains(&Column::Platform) {
            self.columns.push(Column::Platform);
        }
        self
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    /// 行越界时返回 `None`。
    pub fn cell(&self, row: usize, column: Column) -> Option<String> {
        let record = self.records.get(row)?;
        let text = match column {
            Column::Name => record.name().to_string(),
            Column::Class => record.class().label().to_string(),
            Column::DoublePrecision => {
                capability_text(record.class(), record.supports_double_precision()).to_string()
            }
            Column::Platform => record.platform().unwrap_or("-").to_string(),
        };
        Some(text)
    }

    pub fn render_table(&self) -> String {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .map(|column| {
                (0..self.row_count())
                    .filter_map(|row| self.cell(row, *column))
                    .map(|text| text.chars().count())
                    .chain(std::iter::once(column.title().len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let header: Vec<String> = self.columns.iter().map(|c| c.title().to_string()).collect();
        push_row(&mut out, &header, &widths);

        let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&"─".repeat(total));
        out.push('\n');

        if self.records.is_empty() {
            out.push_str(EMPTY_MESSAGE);
            out.push('\n');
            return out;
        }

        for row in 0..self.row_count() {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|column| self.cell(row, *column).unwrap_or_default())
                .collect();
            push_row(&mut out, &cells, &widths);
        }

        out
    }

    pub fn render_json(snapshot: &DeviceSnapshot) -> Result<String> {
        Ok(serde_json::to_string_pretty(snapshot)?)
    }
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
