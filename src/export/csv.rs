//! CSV export of record collections
//!
//! Quoting follows RFC 4180: fields containing a comma, quote or line break
//! are quoted and embedded quotes doubled.

use ::csv::{QuoteStyle, WriterBuilder};

use crate::entities::decision::Decision;
use crate::entities::epic::Epic;
use crate::entities::raci::RaciMatrix;
use crate::entities::retro::ActionItem;
use crate::entities::risk::Risk;
use crate::entities::sprint::{BoardItem, PlannerItem};
use crate::entities::story::Story;
use crate::entities::team::TeamMember;
use crate::export::ExportError;

/// A record that projects onto one CSV row
pub trait CsvRow {
    fn headers() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

/// Render records as CSV with a header line
pub fn to_csv<T: CsvRow>(records: &[T]) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer.write_record(T::headers())?;
    for record in records {
        writer.write_record(record.row())?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Render the RACI matrix: one row per task, one column per stakeholder
pub fn raci_to_csv(raci: &RaciMatrix) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let mut header = vec!["Task".to_string()];
    header.extend(raci.stakeholders.iter().map(|s| {
        if s.role.is_empty() {
            s.name.clone()
        } else {
            format!("{} ({})", s.name, s.role)
        }
    }));
    writer.write_record(&header)?;

    for task in &raci.tasks {
        let mut row = vec![task.name.clone()];
        row.extend(raci.stakeholders.iter().map(|s| {
            raci.role(&task.id, &s.id)
                .map(|r| r.to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

fn join(items: &[String]) -> String {
    items.join("; ")
}

impl CsvRow for Epic {
    fn headers() -> &'static [&'static str] {
        &[
            "ID",
            "Title",
            "Description",
            "Priority",
            "Status",
            "Source",
            "Features",
            "Test Cases",
            "Linked Stories",
            "Created",
        ]
    }

    fn row(&self) -> Vec<String> {
        let linked: Vec<String> = self.linked_stories.iter().map(|s| s.to_string()).collect();
        vec![
            self.id.clone(),
            self.title.clone(),
            self.description.clone(),
            self.priority.to_string(),
            self.status.to_string(),
            self.source.clone(),
            join(&self.features),
            join(&self.test_cases),
            join(&linked),
            self.created_at.to_rfc3339(),
        ]
    }
}

impl CsvRow for Story {
    fn headers() -> &'static [&'static str] {
        &[
            "ID",
            "Role",
            "Action",
            "Benefit",
            "Acceptance Criteria",
            "Story Points",
            "Priority",
            "Status",
            "Created",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.role.clone(),
            self.action.clone(),
            self.benefit.clone(),
            join(&self.acceptance_criteria),
            self.story_points.to_string(),
            self.priority.to_string(),
            self.status.to_string(),
            self.created_at.to_rfc3339(),
        ]
    }
}

impl CsvRow for BoardItem {
    fn headers() -> &'static [&'static str] {
        &[
            "ID",
            "Story ID",
            "Title",
            "Story Points",
            "Priority",
            "Column",
            "Assignee",
            "Comments",
            "Updated",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.story_id.as_ref().map(|s| s.to_string()).unwrap_or_default(),
            self.title(),
            self.story_points.to_string(),
            self.priority.to_string(),
            self.column.to_string(),
            self.assignee.clone(),
            self.comments.len().to_string(),
            self.updated_at.to_rfc3339(),
        ]
    }
}

impl CsvRow for PlannerItem {
    fn headers() -> &'static [&'static str] {
        &["ID", "Story ID", "Title", "Story Points", "Estimated Hours", "Committed"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.story_id.as_ref().map(|s| s.to_string()).unwrap_or_default(),
            self.title.clone(),
            self.story_points.to_string(),
            self.estimated_hours.map(|h| h.to_string()).unwrap_or_default(),
            self.committed.to_string(),
        ]
    }
}

impl CsvRow for TeamMember {
    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Role", "Daily Capacity", "PTO Days"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.role.clone(),
            self.daily_capacity.to_string(),
            self.pto_days.to_string(),
        ]
    }
}

impl CsvRow for ActionItem {
    fn headers() -> &'static [&'static str] {
        &["ID", "Action", "Owner", "Due Date", "Status"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.text.clone(),
            self.owner.clone(),
            self.due_date.map(|d| d.to_string()).unwrap_or_default(),
            self.status.to_string(),
        ]
    }
}

impl CsvRow for Decision {
    fn headers() -> &'static [&'static str] {
        &[
            "ID",
            "Date",
            "Sprint ID",
            "Context",
            "Decision",
            "Rationale",
            "Owner",
            "Status",
            "Remarks",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.date.to_string(),
            self.sprint_id.as_ref().map(|s| s.to_string()).unwrap_or_default(),
            self.context.clone(),
            self.decision.clone(),
            self.rationale.clone(),
            self.owner.clone(),
            self.status.to_string(),
            self.remarks.clone(),
        ]
    }
}

impl CsvRow for Risk {
    fn headers() -> &'static [&'static str] {
        &[
            "ID",
            "Title",
            "Description",
            "Category",
            "Probability",
            "Impact",
            "Score",
            "Level",
            "Mitigation Plan",
            "Owner",
            "Status",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.title.clone(),
            self.description.clone(),
            self.category.to_string(),
            self.probability.to_string(),
            self.impact.to_string(),
            self.score.to_string(),
            self.level().to_string(),
            self.mitigation_plan.clone(),
            self.owner.clone(),
            self.status.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::raci::RaciRole;
    use crate::entities::story::StoryDraft;

    #[test]
    fn test_csv_quotes_embedded_separators() {
        let story = Story::new(
            StoryDraft {
                role: "admin, owner".to_string(),
                action: "say \"hi\"".to_string(),
                benefit: "line one\nline two".to_string(),
                ..Default::default()
            },
            &[],
        );
        let csv = to_csv(&[story]).unwrap();
        let mut lines = csv.splitn(2, '\n');
        assert_eq!(
            lines.next().unwrap(),
            "ID,Role,Action,Benefit,Acceptance Criteria,Story Points,Priority,Status,Created"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("\"admin, owner\""));
        assert!(row.contains("\"say \"\"hi\"\"\""));
        assert!(row.contains("\"line one\nline two\""));
    }

    #[test]
    fn test_csv_reads_back_with_csv_reader() {
        let member = TeamMember::new("O'Brien, Pat", "Dev", 6.0);
        let csv = to_csv(&[member]).unwrap();
        let mut reader = ::csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[1], "O'Brien, Pat");
        assert_eq!(&record[3], "6");
    }

    #[test]
    fn test_empty_collection_has_header_only() {
        let csv = to_csv::<Risk>(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_raci_csv() {
        let mut raci = RaciMatrix::default();
        let task = raci.add_task("Design");
        let alice = raci.add_stakeholder("Alice", "PM");
        raci.add_stakeholder("Bob", "");
        raci.assign(&task, &alice, Some(RaciRole::A));

        let csv = raci_to_csv(&raci).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Task,Alice (PM),Bob");
        assert_eq!(lines[1], "Design,A,");
    }
}
