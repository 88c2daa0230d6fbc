use crate::error::{Error, Result};
use crate::model::{
    BugRecord, BugStatus, ComponentGroup, QaContactSummary, StatusCounts, TeamSummary, TOTAL_LABEL,
};
use crate::parse::{coerce_count, parse_count, NormalizedTable, RawTable};
use indexmap::IndexMap;
use itertools::Itertools;

pub const OTHER_COMPONENT: &str = "Other";

pub trait TeamAnalyzer {
    fn team_summaries(&self) -> Vec<TeamSummary>;
}

impl TeamAnalyzer for NormalizedTable {
    fn team_summaries(&self) -> Vec<TeamSummary> {
        self.groups()
            .into_iter()
            .filter(|group| *group != TOTAL_LABEL)
            .map(|team| {
                let counts = BugStatus::ACTIVE
                    .iter()
                    .map(|status| (*status, self.get(status.label(), team).unwrap_or(0)))
                    .collect::<StatusCounts>();
                // Every row but the aggregate one, unknown statuses included.
                let total = self
                    .rows()
                    .filter(|(label, _)| *label != TOTAL_LABEL)
                    .map(|(_, cells)| cells.get(team).copied().unwrap_or(0))
                    .sum();
                TeamSummary::new(team, counts, total)
            })
            .collect()
    }
}

pub trait QaContactAnalyzer {
    fn qa_contact_summaries(&self) -> Result<Vec<QaContactSummary>>;
}

impl QaContactAnalyzer for RawTable {
    /// Rows are QA contacts, columns are statuses. Contacts without activity
    /// are dropped and a synthetic `Total` record closes the list.
    fn qa_contact_summaries(&self) -> Result<Vec<QaContactSummary>> {
        let status_columns = BugStatus::QA_TRIAGE
            .iter()
            .filter_map(|status| {
                let column = self
                    .headers
                    .iter()
                    .position(|header| BugStatus::from_label(header) == Some(*status))?;
                Some((*status, column))
            })
            .collect::<Vec<_>>();
        let total_column = self.headers.iter().position(|header| header.trim() == TOTAL_LABEL);

        let mut summaries = vec![];
        for row in &self.rows {
            let Some(contact) = row.first().map(|cell| cell.trim()) else {
                continue;
            };
            if !is_contact_identifier(contact) {
                continue;
            }
            let statuses = status_columns
                .iter()
                .map(|(status, column)| (*status, row.get(*column).map(|c| coerce_count(c)).unwrap_or(0)))
                .filter(|(_, count)| *count > 0)
                .collect::<StatusCounts>();
            let total = total_column
                .and_then(|column| row.get(column))
                .and_then(|cell| parse_count(cell))
                .unwrap_or_else(|| statuses.values().sum());
            if total == 0 {
                continue;
            }
            summaries.push(QaContactSummary::new(contact, statuses, total));
        }

        if summaries.is_empty() {
            return Err(Error::NoData);
        }
        let overall = overall_total(&summaries);
        summaries.push(overall);
        Ok(summaries)
    }
}

fn overall_total(summaries: &[QaContactSummary]) -> QaContactSummary {
    let statuses = BugStatus::QA_TRIAGE
        .iter()
        .map(|status| (*status, summaries.iter().map(|s| s.count(*status)).sum::<u64>()))
        .filter(|(_, count)| *count > 0)
        .collect::<StatusCounts>();
    let total = summaries.iter().map(|s| s.total).sum();
    QaContactSummary::new(TOTAL_LABEL, statuses, total)
}

/// A `local@domain.tld` token somewhere in the cell.
fn is_contact_identifier(cell: &str) -> bool {
    cell.split_whitespace()
        .map(|token| token.trim_matches(|c: char| matches!(c, '<' | '>' | '(' | ')' | ',')))
        .any(|token| {
            let Some((local, domain)) = token.split_once('@') else {
                return false;
            };
            !local.is_empty()
                && domain.contains('.')
                && domain.split('.').all(|part| !part.is_empty())
        })
}

pub trait ComponentGrouper {
    fn group_by_component(&self) -> Vec<ComponentGroup>;
}

impl ComponentGrouper for [BugRecord] {
    fn group_by_component(&self) -> Vec<ComponentGroup> {
        let mut groups: IndexMap<String, Vec<BugRecord>> = IndexMap::new();
        for bug in self {
            let component = bug
                .iter()
                .find(|(column, _)| column.trim().eq_ignore_ascii_case("component"))
                .map(|(_, value)| value.trim())
                .filter(|value| !value.is_empty())
                .unwrap_or(OTHER_COMPONENT);
            groups.entry(component.to_string()).or_default().push(bug.clone());
        }
        groups
            .into_iter()
            .map(|(component, bugs)| ComponentGroup { component, bugs })
            .collect()
    }
}

/// Case-insensitive lookup of one team's summary.
pub fn find_team<'a>(summaries: &'a [TeamSummary], team: &str) -> Result<&'a TeamSummary> {
    summaries
        .iter()
        .find(|summary| summary.team.eq_ignore_ascii_case(team.trim()))
        .ok_or_else(|| Error::UnknownTeam {
            team: team.to_string(),
            available: summaries.iter().map(|s| s.team.clone()).unique().collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::csv::csv_table;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn team_totals_exclude_the_total_row() {
        let table = NormalizedTable::from_raw(&csv_table(
            "Status,OS,Web,Total\nUNCONFIRMED,3,5,8\nCONFIRMED,0,.,0\nTotal,3,5,8\n",
        ));
        let summaries = table.team_summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].team, "OS");
        assert_eq!(summaries[0].total, 3);
        assert_eq!(summaries[1].total, 5);
        assert_eq!(summaries[1].count(BugStatus::Confirmed), 0);
        assert_eq!(summaries[1].count(BugStatus::Reopened), 0);
    }

    #[test]
    fn team_totals_include_unknown_statuses() {
        let table = NormalizedTable::from_raw(&csv_table(
            "Status,OS\nUNCONFIRMED,1\nVERIFIED,4\nTotal,99\n",
        ));
        let summary = &table.team_summaries()[0];
        assert_eq!(summary.total, 5);
        assert_eq!(summary.count(BugStatus::Unconfirmed), 1);
    }

    #[test]
    fn team_counts_cover_active_statuses_only() {
        let table = NormalizedTable::from_raw(&csv_table(
            "Status,OS\nUNCONFIRMED,1\nRESOLVED,2\nTotal,3\n",
        ));
        let summary = &table.team_summaries()[0];
        let json = serde_json::to_value(summary).unwrap();
        assert!(json.get("RESOLVED").is_none());
        assert_eq!(json["UNCONFIRMED"], 1);
        assert_eq!(json["UNDER_REVIEW"], 0);
        assert_eq!(summary.counts.len(), BugStatus::ACTIVE.len());
        assert_eq!(summary.total, 3);
    }

    #[test]
    fn team_total_matches_column_sum_for_any_shape() {
        let table = NormalizedTable::from_raw(&csv_table(
            "Status,A,B,C\nRE-OPENED,1,2,3\nNEEDS_INFO,x,.,4\nCLOSED,10,0,0\nTotal,0,0,0\nUNDER_REVIEW,2,2,2\n",
        ));
        for summary in table.team_summaries() {
            let expected: u64 = table
                .rows()
                .filter(|(label, _)| *label != TOTAL_LABEL)
                .map(|(_, cells)| cells[summary.team.as_str()])
                .sum();
            assert_eq!(summary.total, expected);
        }
    }

    fn qa_table(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            strings(&["Status", "UNCONFIRMED", "CONFIRMED", "NEEDS_INFO", "IN_PROGRESS_DEV", "RESOLVED", "VERIFIED", "Total"]),
            rows.iter().map(|row| strings(row)).collect(),
        )
    }

    #[test]
    fn qa_contacts_with_activity_only() {
        let table = qa_table(&[
            &["alice@example.com", "1", "0", ".", "2", "0", "9", "3"],
            &["bob@example.com", "0", "0", "0", "0", "0", "5", "0"],
            &["nobody", "4", "4", "4", "4", "4", "0", "20"],
            &["carol@example.com", "0", "2", "0", "0", "1", "0", "."],
            &["Total", "5", "6", "4", "6", "5", "14", "23"],
        ]);
        let summaries = table.qa_contact_summaries().unwrap();
        let contacts = summaries.iter().map(|s| s.qa_contact.as_str()).collect::<Vec<_>>();
        assert_eq!(contacts, vec!["alice@example.com", "carol@example.com", "Total"]);

        let alice = &summaries[0];
        assert_eq!(alice.total, 3);
        assert_eq!(alice.statuses.len(), 2);
        assert_eq!(alice.count(BugStatus::InProgressDev), 2);

        // No parseable server total: falls back to the status sum.
        let carol = &summaries[1];
        assert_eq!(carol.total, 3);

        let total = &summaries[2];
        assert_eq!(total.count(BugStatus::Unconfirmed), 1);
        assert_eq!(total.count(BugStatus::Confirmed), 2);
        assert_eq!(total.count(BugStatus::Resolved), 1);
        assert_eq!(total.total, 6);
    }

    #[test]
    fn qa_synthetic_total_is_the_column_sum() {
        let table = qa_table(&[
            &["a@x.io", "1", "2", "3", "4", "5", "0", ""],
            &["Jane Doe <b@x.io>", "5", "4", "3", "2", "1", "0", ""],
        ]);
        let summaries = table.qa_contact_summaries().unwrap();
        let (total, contacts) = summaries.split_last().unwrap();
        for status in BugStatus::QA_TRIAGE {
            let sum: u64 = contacts.iter().map(|c| c.count(status)).sum();
            assert_eq!(total.count(status), sum);
        }
        assert_eq!(total.total, 30);
    }

    #[test]
    fn qa_without_contacts_is_no_data() {
        let table = qa_table(&[&["Total", "0", "0", "0", "0", "0", "0", "0"]]);
        assert!(matches!(table.qa_contact_summaries(), Err(Error::NoData)));
        let table = qa_table(&[&["x@y.com", "0", "0", "0", "0", "0", "3", "0"]]);
        assert!(matches!(table.qa_contact_summaries(), Err(Error::NoData)));
    }

    #[test]
    fn contact_identifiers() {
        assert!(is_contact_identifier("qa@example.com"));
        assert!(is_contact_identifier("Jane <jane@corp.example.in>"));
        assert!(!is_contact_identifier("Total"));
        assert!(!is_contact_identifier("@example.com"));
        assert!(!is_contact_identifier("jane@localhost"));
        assert!(!is_contact_identifier("jane@example."));
    }

    #[test]
    fn groups_by_component_with_other_bucket() {
        let bug = |id: &str, component: Option<&str>| {
            let mut record = BugRecord::new();
            record.insert("bug_id".into(), id.into());
            if let Some(component) = component {
                record.insert("Component".into(), component.into());
            }
            record
        };
        let bugs = vec![
            bug("1", Some("API")),
            bug("2", None),
            bug("3", Some("UI")),
            bug("4", Some("API")),
            bug("5", Some("  ")),
        ];
        let groups = bugs.group_by_component();
        let names = groups.iter().map(|g| g.component.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["API", "Other", "UI"]);
        assert_eq!(groups[0].bugs.len(), 2);
        assert_eq!(groups[1].bugs.len(), 2);
    }

    #[test]
    fn team_lookup_is_case_insensitive() {
        let table = NormalizedTable::from_raw(&csv_table("Status,OS,Web\nUNCONFIRMED,1,2\n"));
        let summaries = table.team_summaries();
        assert_eq!(find_team(&summaries, "web").unwrap().team, "Web");
        match find_team(&summaries, "mobile") {
            Err(Error::UnknownTeam { available, .. }) => assert_eq!(available, vec!["OS", "Web"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
