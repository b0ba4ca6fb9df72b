use crate::prelude::{println, *};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Ok,
    Skipped,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ItemRow {
    pub item: String,
    pub status: ItemStatus,
    pub detail: String,
}

/// Per-item outcomes of a run, in processing order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub rows: Vec<ItemRow>,
}

impl RunSummary {
    pub fn record(&mut self, item: impl Into<String>, status: ItemStatus, detail: impl Into<String>) {
        self.rows.push(ItemRow {
            item: item.into(),
            status,
            detail: detail.into(),
        });
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.rows.iter().filter(|row| row.status == status).count()
    }

    pub fn print(&self) {
        let mut table = new_table();
        table.add_row(prettytable::row!["Item", "Status", "Detail"]);

        for row in &self.rows {
            let status = match row.status {
                ItemStatus::Ok => "ok".green(),
                ItemStatus::Skipped => "skipped".yellow(),
                ItemStatus::Failed => "failed".red(),
            };
            table.add_row(prettytable::row![row.item, status, row.detail]);
        }

        println!();
        println!("{}", table);
        println!(
            "{} ok, {} skipped, {} failed",
            self.count(ItemStatus::Ok),
            self.count(ItemStatus::Skipped),
            self.count(ItemStatus::Failed)
        );
    }

    /// `Err(Error::ItemsFailed)` when any item did not succeed.
    pub fn into_result(self) -> Result<()> {
        let failed = self.count(ItemStatus::Failed) + self.count(ItemStatus::Skipped);
        if failed > 0 {
            return Err(Error::ItemsFailed {
                failed,
                total: self.rows.len(),
            }
            .into());
        }
        Ok(())
    }
}

/// Progress bar over `len` items.
pub fn progress_bar(len: usize, prefix: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template("{prefix:>10.cyan.bold} [{bar:24}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_prefix(prefix);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_ok() {
        let mut summary = RunSummary::default();
        summary.record("a.c", ItemStatus::Ok, "written");
        summary.record("b.c", ItemStatus::Ok, "written");
        assert!(summary.into_result().is_ok());
    }

    #[test]
    fn test_skipped_and_failed_items_count_as_failures() {
        let mut summary = RunSummary::default();
        summary.record("a.c", ItemStatus::Ok, "written");
        summary.record("b.c", ItemStatus::Skipped, "no code block");
        summary.record("c.c", ItemStatus::Failed, "model error");

        let err = summary.into_result().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ItemsFailed { failed: 2, total: 3 })
        ));
    }
}
