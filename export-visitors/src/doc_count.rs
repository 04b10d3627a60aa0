// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::{collections::HashMap, fmt::Write as _};

use core_types::Revision;
use export_engine::{RevisionVisitor, TableRef, Visitor, VisitorError};
use log::info;

const ID_WIDTH: usize = 24;
const COUNT_WIDTH: usize = 15;
const SPACER: &str = "  ";

/// Net live documents in one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDocumentCount {
    pub table_id: String,
    pub table_name: String,
    pub document_count: i64,
}

/// Tracks net document counts per table id from revision versions.
///
/// Version 0 is an insert; a later version carrying neither `data` nor `dataHash` is a
/// delete; anything else is an update and leaves counts unchanged. Exports that start
/// mid-history are not reconciled against prior state, so counts can go negative.
#[derive(Debug, Default)]
pub struct TableDocumentCountVisitor {
    counts: HashMap<String, TableDocumentCount>,
    report: Option<String>,
}

impl TableDocumentCountVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts sorted by table name, then table id.
    pub fn counts(&self) -> Vec<TableDocumentCount> {
        let mut counts: Vec<_> = self.counts.values().cloned().collect();
        counts.sort_by(|a, b| {
            a.table_name
                .cmp(&b.table_name)
                .then_with(|| a.table_id.cmp(&b.table_id))
        });
        counts
    }

    pub fn count_for(&self, table_id: &str) -> Option<i64> {
        self.counts.get(table_id).map(|c| c.document_count)
    }

    /// Table rendered at the last teardown.
    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn render(&self) -> String {
        let counts = self.counts();
        let name_width = counts
            .iter()
            .map(|c| c.table_name.chars().count())
            .max()
            .unwrap_or(0)
            + 2;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<name_width$}{SPACER}{:<ID_WIDTH$}{SPACER}{:>COUNT_WIDTH$}",
            "Table Name", "Table ID", "Document Count"
        );
        let _ = writeln!(
            out,
            "{}{SPACER}{}{SPACER}{}",
            "-".repeat(name_width),
            "-".repeat(ID_WIDTH),
            "-".repeat(COUNT_WIDTH)
        );
        out.push('\n');
        for c in &counts {
            let _ = writeln!(
                out,
                "{:<name_width$}{SPACER}{:<ID_WIDTH$}{SPACER}{:>COUNT_WIDTH$}",
                c.table_name,
                c.table_id,
                group_thousands(c.document_count)
            );
        }
        out
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

impl Visitor for TableDocumentCountVisitor {
    fn name(&self) -> &str {
        "table-document-count"
    }

    fn setup(&mut self) -> Result<(), VisitorError> {
        self.counts.clear();
        self.report = None;
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), VisitorError> {
        let report = self.render();
        for line in report.lines() {
            info!("{line}");
        }
        self.report = Some(report);
        Ok(())
    }
}

impl RevisionVisitor for TableDocumentCountVisitor {
    fn visit_revision(
        &mut self,
        revision: Revision<'_>,
        table: TableRef<'_>,
    ) -> Result<(), VisitorError> {
        let version = revision
            .version()
            .ok_or_else(|| VisitorError::msg("revision metadata has no version"))?;
        let delete = !(revision.has_data() || revision.has_data_hash());
        if version > 0 && !delete {
            return Ok(());
        }

        let entry = self
            .counts
            .entry(table.table_id.to_string())
            .or_insert_with(|| TableDocumentCount {
                table_id: table.table_id.to_string(),
                table_name: table.table_name.to_string(),
                document_count: 0,
            });
        if version == 0 {
            entry.document_count += 1;
        } else {
            entry.document_count -= 1;
        }
        Ok(())
    }
}
