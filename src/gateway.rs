//! The spreadsheet gateway: domain operations mapped onto range-addressed
//! reads and writes against the backing document.
//!
//! Record identity is (tab, 1-based row number) with row 1 reserved for the
//! header. Row numbers shift when rows above them are deleted, so batch
//! deletes must be applied in descending row order; single-row edits that race
//! a concurrent delete can still land on the wrong record. There is no
//! read-modify-write and no versioning anywhere: every mutation is one
//! targeted cell or row write, last writer wins.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::models::{
    Contact, ContactField, FIRST_DATA_ROW, NewContact, NewOpportunity, Opportunity,
    OpportunityField, Stage, Template,
};
use crate::sheets::{
    SheetsClient, TabProperties, add_sheet_request, cell_ref, delete_row_request,
    delete_sheet_request, tab_range,
};

/// Fields supplied when creating or editing a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateInput {
    pub name: String,
    pub message: String,
    pub html_content: String,
}

pub struct CrmGateway {
    client: SheetsClient,
}

impl CrmGateway {
    pub fn new(client: SheetsClient) -> Self {
        CrmGateway { client }
    }

    // ---- tabs ----

    pub async fn list_tabs(&self) -> Result<Vec<String>> {
        let tabs = self.client.get_metadata().await?;
        Ok(tabs.into_iter().map(|t| t.title).collect())
    }

    /// Create a tab and seed it with a header row plus the given contacts in
    /// one batched write. The two remote calls are not atomic: a failure
    /// between them leaves an empty tab behind.
    pub async fn create_tab(&self, title: &str, seed: &[NewContact]) -> Result<()> {
        self.client
            .batch_update(vec![add_sheet_request(title)])
            .await?;

        let mut values: Vec<Vec<String>> = Vec::with_capacity(seed.len() + 1);
        values.push(Contact::HEADER.iter().map(|s| s.to_string()).collect());
        values.extend(seed.iter().map(NewContact::seed_row));

        self.client
            .update_values(&cell_ref(title, "A", 1), values)
            .await?;

        log::debug!("created tab {title} with {} seed rows", seed.len());
        Ok(())
    }

    pub async fn delete_tab(&self, title: &str) -> Result<()> {
        let sheet_id = self.resolve_tab_id(title).await?;
        self.client
            .batch_update(vec![delete_sheet_request(sheet_id)])
            .await
    }

    async fn resolve_tab_id(&self, title: &str) -> Result<i64> {
        let tabs = self.client.get_metadata().await?;
        find_tab_id(&tabs, title)
    }

    /// Create the tab with the given header row if it does not exist yet.
    /// The fixed Opportunities/Templates tabs are created this way on first
    /// access.
    async fn ensure_tab(&self, title: &str, header: &[&str]) -> Result<()> {
        let tabs = self.client.get_metadata().await?;
        if tabs.iter().any(|t| t.title == title) {
            return Ok(());
        }
        self.client
            .batch_update(vec![add_sheet_request(title)])
            .await?;
        let header_row = vec![header.iter().map(|s| s.to_string()).collect()];
        self.client
            .update_values(&cell_ref(title, "A", 1), header_row)
            .await?;
        log::debug!("lazily created tab {title}");
        Ok(())
    }

    // ---- contacts ----

    pub async fn list_contacts(&self, tab: &str) -> Result<Vec<Contact>> {
        let rows = self.client.get_values(&tab_range(tab, "A:D")).await?;
        Ok(map_records(&rows, Contact::from_row))
    }

    pub async fn get_contact(&self, tab: &str, row: i64) -> Result<Contact> {
        let range = format!("{tab}!A{row}:D{row}");
        let rows = self.client.get_values(&range).await?;
        match rows.first() {
            Some(cells) => Ok(Contact::from_row(row, cells)),
            None => Err(Error::not_found(format!("no contact at {tab} row {row}"))),
        }
    }

    /// Write exactly one cell: the fixed column for the field at the given
    /// row. No concurrency check of any kind.
    pub async fn update_contact_field(
        &self,
        tab: &str,
        row: i64,
        field: ContactField,
        value: &str,
    ) -> Result<()> {
        let range = cell_ref(tab, &field.column(), row);
        log::debug!("writing contact field at {range}");
        self.client
            .update_values(&range, vec![vec![value.to_string()]])
            .await
    }

    /// Delete a batch of contact rows. Deletions are submitted in descending
    /// row order: each deletion shifts every row below it up by one, so
    /// ascending order would invalidate the remaining row numbers mid-batch.
    pub async fn delete_contact_rows(&self, tab: &str, rows: &[i64]) -> Result<()> {
        let sheet_id = self.resolve_tab_id(tab).await?;
        let requests = plan_row_deletes(rows)
            .into_iter()
            .map(|row| delete_row_request(sheet_id, row))
            .collect();
        self.client.batch_update(requests).await
    }

    // ---- opportunities ----

    pub async fn list_opportunities(&self) -> Result<Vec<Opportunity>> {
        self.ensure_tab(Opportunity::TAB, &Opportunity::HEADER)
            .await?;
        let rows = self
            .client
            .get_values(&tab_range(Opportunity::TAB, "A:I"))
            .await?;
        Ok(map_records(&rows, Opportunity::from_row))
    }

    pub async fn get_opportunity(&self, row: i64) -> Result<Opportunity> {
        let range = format!("{}!A{row}:I{row}", Opportunity::TAB);
        let rows = self.client.get_values(&range).await?;
        match rows.first() {
            Some(cells) => Ok(Opportunity::from_row(row, cells)),
            None => Err(Error::not_found(format!("no opportunity at row {row}"))),
        }
    }

    /// Append a new opportunity row. `createdDate` is set here, once; the
    /// stage defaults to Lead when not supplied.
    pub async fn create_opportunity(&self, new: NewOpportunity) -> Result<Opportunity> {
        self.ensure_tab(Opportunity::TAB, &Opportunity::HEADER)
            .await?;

        let row_number = self.next_row(Opportunity::TAB).await?;
        let opportunity = Opportunity {
            row_number,
            name: or_default(new.name, "Unknown"),
            contact_name: new.contact_name,
            contact_phone: new.contact_phone,
            amount: new.amount,
            stage: or_default(new.stage, Stage::Lead.as_str()),
            expected_close_date: new.expected_close_date,
            notes: new.notes,
            created_date: Utc::now().format("%Y-%m-%d").to_string(),
            source: new.source,
        };

        self.client
            .append_values(&tab_range(Opportunity::TAB, "A:I"), vec![opportunity.to_row()])
            .await?;
        Ok(opportunity)
    }

    pub async fn update_opportunity_field(
        &self,
        row: i64,
        field: OpportunityField,
        value: &str,
    ) -> Result<()> {
        let range = cell_ref(Opportunity::TAB, &field.column(), row);
        log::debug!("writing opportunity field at {range}");
        self.client
            .update_values(&range, vec![vec![value.to_string()]])
            .await
    }

    // ---- templates ----

    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        self.ensure_tab(Template::TAB, &Template::HEADER).await?;
        let rows = self
            .client
            .get_values(&tab_range(Template::TAB, "A:F"))
            .await?;
        Ok(map_records(&rows, Template::from_row))
    }

    /// Append a new template row. The opaque id is derived from the creation
    /// timestamp and is independent of row position.
    pub async fn create_template(&self, input: TemplateInput) -> Result<Template> {
        self.ensure_tab(Template::TAB, &Template::HEADER).await?;

        let now = Utc::now();
        let row_number = self.next_row(Template::TAB).await?;
        let template = Template {
            row_number,
            id: now.timestamp_millis().to_string(),
            name: input.name,
            message: input.message,
            html_content: input.html_content,
            created_date: now.to_rfc3339(),
            modified_date: now.to_rfc3339(),
        };

        self.client
            .append_values(&tab_range(Template::TAB, "A:F"), vec![template.to_row()])
            .await?;
        Ok(template)
    }

    /// Rewrite the editable cells of a template row (columns B..D) and bump
    /// its modified date (column F). The id and created date cells are never
    /// touched.
    pub async fn update_template(&self, row: i64, input: TemplateInput) -> Result<()> {
        let edit_range = format!("{}!B{row}:D{row}", Template::TAB);
        self.client
            .update_values(
                &edit_range,
                vec![vec![input.name, input.message, input.html_content]],
            )
            .await?;

        let modified = Utc::now().to_rfc3339();
        self.client
            .update_values(&cell_ref(Template::TAB, "F", row), vec![vec![modified]])
            .await
    }

    pub async fn delete_template(&self, row: i64) -> Result<()> {
        let sheet_id = self.resolve_tab_id(Template::TAB).await?;
        self.client
            .batch_update(vec![delete_row_request(sheet_id, row)])
            .await
    }

    /// Row number the next appended record will land on: one past the last
    /// populated row of column A.
    async fn next_row(&self, tab: &str) -> Result<i64> {
        let rows = self.client.get_values(&tab_range(tab, "A:A")).await?;
        Ok((rows.len() as i64).max(1) + 1)
    }
}

/// Map raw sheet rows to records, skipping the header row. Row numbers start
/// at 2 and follow physical position.
fn map_records<T>(rows: &[Vec<String>], from_row: impl Fn(i64, &[String]) -> T) -> Vec<T> {
    rows.iter()
        .skip(1)
        .enumerate()
        .map(|(i, cells)| from_row(i as i64 + FIRST_DATA_ROW, cells))
        .collect()
}

/// Resolve a tab title to its numeric id, NotFound when no tab matches.
fn find_tab_id(tabs: &[TabProperties], title: &str) -> Result<i64> {
    tabs.iter()
        .find(|t| t.title == title)
        .map(|t| t.sheet_id)
        .ok_or_else(|| Error::not_found(format!("sheet with title \"{title}\" not found")))
}

/// Order a batch of row numbers for deletion: descending, duplicates removed.
/// Descending order keeps every remaining row number in the batch valid while
/// earlier deletions shift rows upward.
fn plan_row_deletes(rows: &[i64]) -> Vec<i64> {
    let mut sorted: Vec<i64> = rows.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    sorted
}

fn or_default(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn delete_plan_is_descending_and_deduplicated() {
        assert_eq!(plan_row_deletes(&[2, 5, 3, 5]), vec![5, 3, 2]);
        assert_eq!(plan_row_deletes(&[]), Vec::<i64>::new());
    }

    /// Apply a delete plan the way the remote service would: one row at a
    /// time, each deletion shifting everything below it up by one.
    fn apply_plan(sheet: &mut Vec<&'static str>, plan: &[i64]) {
        for &row in plan {
            let idx = (row - 1) as usize;
            if idx < sheet.len() {
                sheet.remove(idx);
            }
        }
    }

    #[test]
    fn descending_deletes_remove_the_intended_rows() {
        // 6-row sheet: header + five contacts. Deleting rows 2, 3 and 5
        // must leave the header plus rows 4 and 6.
        let mut sheet = vec!["header", "r2", "r3", "r4", "r5", "r6"];
        apply_plan(&mut sheet, &plan_row_deletes(&[2, 3, 5]));
        assert_eq!(sheet, vec!["header", "r4", "r6"]);
    }

    #[test]
    fn ascending_order_would_hit_the_wrong_rows() {
        // The same batch applied ascending shows why the ordering is
        // load-bearing: the later indices drift onto surviving rows.
        let mut sheet = vec!["header", "r2", "r3", "r4", "r5", "r6"];
        apply_plan(&mut sheet, &[2, 3, 5]);
        assert_ne!(sheet, vec!["header", "r4", "r6"]);
    }

    #[test]
    fn record_mapping_skips_header_and_numbers_from_two() {
        let rows = vec![
            vec!["Name".to_string(), "Phone Number".to_string()],
            vec!["Alice".to_string(), "111".to_string()],
            vec!["Bob".to_string(), "222".to_string()],
        ];
        let contacts = map_records(&rows, Contact::from_row);
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].row_number, 2);
        assert_eq!(contacts[0].name, "Alice");
        assert_eq!(contacts[1].row_number, 3);
        assert_eq!(contacts[1].name, "Bob");
    }

    #[test]
    fn empty_sheet_maps_to_no_records() {
        let contacts = map_records(&[], Contact::from_row);
        assert!(contacts.is_empty());
    }

    #[test]
    fn seed_round_trip_preserves_fields_and_order() {
        let seed = vec![
            NewContact {
                name: "Alice".into(),
                phone: "111".into(),
                status: "Interested".into(),
                comment: "call Tue".into(),
            },
            NewContact {
                name: "Bob".into(),
                phone: "222".into(),
                status: String::new(),
                comment: String::new(),
            },
        ];

        // Layout as written by create_tab: header first, then seed rows.
        let mut written: Vec<Vec<String>> = Vec::new();
        written.push(Contact::HEADER.iter().map(|s| s.to_string()).collect());
        written.extend(seed.iter().map(NewContact::seed_row));

        let listed = map_records(&written, Contact::from_row);
        assert_eq!(listed[0].row_number, 2);
        assert_eq!(listed[0].name, "Alice");
        assert_eq!(listed[0].status, "Interested");
        assert_eq!(listed[0].comment, "call Tue");
        assert_eq!(listed[1].row_number, 3);
        assert_eq!(listed[1].status, "New");
        assert_eq!(listed[1].comment, "");
    }

    #[test]
    fn tab_lookup_resolves_titles_and_misses_as_not_found() {
        let tabs = vec![
            TabProperties {
                sheet_id: 0,
                title: "Sheet1".to_string(),
            },
            TabProperties {
                sheet_id: 417,
                title: "Upload_2024".to_string(),
            },
        ];

        assert_eq!(find_tab_id(&tabs, "Upload_2024").unwrap(), 417);

        // A title with no matching tab must surface as NotFound, never as a
        // silent success or a generic failure.
        let err = find_tab_id(&tabs, "Upload_2025").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(err.to_string().contains("Upload_2025"));

        let err = find_tab_id(&[], "Sheet1").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn repeated_field_writes_are_idempotent() {
        // A field update is one cell overwrite; writing the same value twice
        // targets the same cell and leaves a single unambiguous stored value.
        let mut store = std::collections::HashMap::new();
        for _ in 0..2 {
            let range = cell_ref("Sheet1", &ContactField::Status.column(), 5);
            store.insert(range, "Interested".to_string());
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store["Sheet1!C5"], "Interested");
    }

    fn or_default_cases() -> Vec<(String, &'static str, &'static str)> {
        vec![
            (String::new(), "Lead", "Lead"),
            ("Proposal".to_string(), "Lead", "Proposal"),
        ]
    }

    #[test]
    fn blank_fields_take_defaults() {
        for (value, fallback, expected) in or_default_cases() {
            assert_eq!(or_default(value, fallback), expected);
        }
    }
}
