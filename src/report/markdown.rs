use crate::error::{Error, Result};
use crate::model::{BugListReport, BugStatus, PullRequestRecord, QaContactSummary, TeamSummary};
use markdown_builder::Markdown;
use markdown_table::{Heading, HeadingAlignment, MarkdownTable};
use std::fs;
use std::path::Path;

pub trait MarkdownReport {
    fn render_markdown(&self, generated_at: &str) -> Result<String>;

    fn report_create(&self, path: &Path, generated_at: &str) -> Result<()> {
        fs::write(path, self.render_markdown(generated_at)?)?;
        tracing::info!(path = %path.display(), "wrote markdown report");
        Ok(())
    }
}

impl MarkdownReport for [TeamSummary] {
    fn render_markdown(&self, generated_at: &str) -> Result<String> {
        let mut doc = Markdown::new();
        doc.header1("Bug status by team");
        doc.paragraph(format!("*{generated_at}*"));

        let header = [
            vec![Heading::new("Team".to_string(), None)],
            BugStatus::ACTIVE
                .iter()
                .map(|status| Heading::new(status.to_string(), Some(HeadingAlignment::Right)))
                .collect(),
            vec![Heading::new("Total".to_string(), Some(HeadingAlignment::Right))],
        ]
        .concat();
        let table = self
            .iter()
            .map(|summary| {
                [
                    vec![format!("**{}**", summary.team)],
                    BugStatus::ACTIVE
                        .iter()
                        .map(|status| summary.count(*status).to_string())
                        .collect(),
                    vec![summary.total.to_string()],
                ]
                .concat()
            })
            .collect::<Vec<_>>();
        doc.add_table(table, header)?;
        Ok(doc.render())
    }
}

impl MarkdownReport for [QaContactSummary] {
    fn render_markdown(&self, generated_at: &str) -> Result<String> {
        let mut doc = Markdown::new();
        doc.header1("QA status");
        doc.paragraph(format!("*{generated_at}*"));

        let header = [
            vec![Heading::new("QA contact".to_string(), None)],
            BugStatus::QA_TRIAGE
                .iter()
                .map(|status| Heading::new(status.to_string(), Some(HeadingAlignment::Right)))
                .collect(),
            vec![Heading::new("Total".to_string(), Some(HeadingAlignment::Right))],
        ]
        .concat();
        let table = self
            .iter()
            .map(|summary| {
                [
                    vec![summary.qa_contact.clone()],
                    BugStatus::QA_TRIAGE
                        .iter()
                        .map(|status| summary.count(*status).to_string())
                        .collect(),
                    vec![summary.total.to_string()],
                ]
                .concat()
            })
            .collect::<Vec<_>>();
        doc.add_table(table, header)?;
        Ok(doc.render())
    }
}

impl MarkdownReport for BugListReport {
    fn render_markdown(&self, generated_at: &str) -> Result<String> {
        let mut doc = Markdown::new();
        doc.header1(format!("Bugs of team {} ({})", self.team, self.count));
        doc.paragraph(format!("*{generated_at}*"));

        for group in &self.groups {
            doc.header2(format!("{} ({})", group.component, group.bugs.len()));
            // Columns of the first record; exports share one header row.
            let columns = group
                .bugs
                .first()
                .map(|bug| bug.keys().cloned().collect::<Vec<_>>())
                .unwrap_or_default();
            if columns.is_empty() {
                continue;
            }
            let header = columns
                .iter()
                .map(|column| Heading::new(column.clone(), None))
                .collect();
            let table = group
                .bugs
                .iter()
                .map(|bug| {
                    columns
                        .iter()
                        .map(|column| escape_cell(bug.get(column).map(String::as_str).unwrap_or_default()))
                        .collect()
                })
                .collect();
            doc.add_table(table, header)?;
        }
        Ok(doc.render())
    }
}

impl MarkdownReport for [PullRequestRecord] {
    fn render_markdown(&self, generated_at: &str) -> Result<String> {
        let mut doc = Markdown::new();
        doc.header1(format!("Open pull requests ({})", self.len()));
        doc.paragraph(format!("*{generated_at}*"));
        if self.is_empty() {
            return Ok(doc.render());
        }

        let header = ["Repository", "Title", "Author", "Branches", "Created"]
            .into_iter()
            .map(|s| Heading::new(s.to_string(), None))
            .collect();
        let table = self
            .iter()
            .map(|pr| {
                vec![
                    pr.repository.clone(),
                    format!("[{}]({})", escape_cell(&pr.title), pr.url),
                    pr.author.clone(),
                    format!("`{}` → `{}`", pr.source_branch, pr.destination_branch),
                    pr.created_on_display(),
                ]
            })
            .collect();
        doc.add_table(table, header)?;
        Ok(doc.render())
    }
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

trait MarkdownExt {
    fn add_table(&mut self, table: Vec<Vec<String>>, header: Vec<Heading>) -> Result<()>;
}

impl MarkdownExt for Markdown {
    fn add_table(&mut self, table: Vec<Vec<String>>, header: Vec<Heading>) -> Result<()> {
        if table.is_empty() {
            self.paragraph("*No data*");
            return Ok(());
        }
        let mut md_table = MarkdownTable::new(table);
        md_table.with_headings(header);
        let rendered = md_table
            .as_markdown()
            .map_err(|e| Error::Markdown(format!("{e:?}")))?;
        self.paragraph(rendered);
        Ok(())
    }
}
