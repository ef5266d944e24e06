use serde::{Deserialize, Serialize};

use crate::sheets::col_to_letter;

/// Number of header rows at the top of every tab. Row 1 is the header and is
/// never addressed as data; the first data row is row 2.
pub const HEADER_ROWS: i64 = 1;

/// Row number of the first data row on any tab.
pub const FIRST_DATA_ROW: i64 = HEADER_ROWS + 1;

/// Engagement state of a contact.
///
/// These are the canonical values; the store itself accepts arbitrary strings
/// (validation is presence-only), so records carry the raw string and this
/// enum supplies defaults and the known value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    New,
    Interested,
    NotInterested,
    Callback,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "New",
            Status::Interested => "Interested",
            Status::NotInterested => "Not Interested",
            Status::Callback => "Callback",
            Status::Completed => "Completed",
        }
    }

}

/// Sales-pipeline stage of an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Lead,
    Qualified,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Lead => "Lead",
            Stage::Qualified => "Qualified",
            Stage::Proposal => "Proposal",
            Stage::Negotiation => "Negotiation",
            Stage::ClosedWon => "Closed Won",
            Stage::ClosedLost => "Closed Lost",
        }
    }

}

/// One contact row. Identity is (tab, row number); the row number is the
/// 1-based physical position and is not stable across deletions of other rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub row_number: i64,
    pub name: String,
    pub phone: String,
    pub status: String,
    pub comment: String,
}

impl Contact {
    /// Header written as row 1 of every contact tab (columns A..D).
    pub const HEADER: [&'static str; 4] = ["Name", "Phone Number", "Status", "Comment"];

    /// Map one raw sheet row positionally, applying the fixed cell fallbacks.
    pub fn from_row(row_number: i64, cells: &[String]) -> Self {
        Contact {
            row_number,
            name: cell_or(cells, 0, "Unknown"),
            phone: cell_or(cells, 1, ""),
            status: cell_or(cells, 2, Status::New.as_str()),
            comment: cell_or(cells, 3, ""),
        }
    }
}

/// A contact not yet placed in a tab, used to seed newly created tabs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    pub status: String,
    pub comment: String,
}

impl NewContact {
    /// Cells written for this contact, with blank status/comment defaulted
    /// the same way the read path defaults them.
    pub fn seed_row(&self) -> Vec<String> {
        let status = if self.status.is_empty() {
            Status::New.as_str().to_string()
        } else {
            self.status.clone()
        };
        vec![
            self.name.clone(),
            self.phone.clone(),
            status,
            self.comment.clone(),
        ]
    }
}

/// A writable contact field, with its fixed column on the tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Name,
    Phone,
    Status,
    Comment,
}

impl ContactField {
    /// 1-based position of the field on a contact tab (A=1..D=4).
    fn column_index(&self) -> u32 {
        match self {
            ContactField::Name => 1,
            ContactField::Phone => 2,
            ContactField::Status => 3,
            ContactField::Comment => 4,
        }
    }

    pub fn column(&self) -> String {
        col_to_letter(self.column_index())
    }
}

/// One opportunity row on the fixed "Opportunities" tab (columns A..I).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub row_number: i64,
    pub name: String,
    pub contact_name: String,
    pub contact_phone: String,
    /// Decimal amount, stored as a string in the sheet
    pub amount: String,
    pub stage: String,
    pub expected_close_date: String,
    pub notes: String,
    /// Set once at creation, never rewritten
    pub created_date: String,
    pub source: String,
}

impl Opportunity {
    pub const TAB: &'static str = "Opportunities";

    pub const HEADER: [&'static str; 9] = [
        "Name",
        "Contact Name",
        "Contact Phone",
        "Amount",
        "Stage",
        "Expected Close Date",
        "Notes",
        "Created Date",
        "Source",
    ];

    pub fn from_row(row_number: i64, cells: &[String]) -> Self {
        Opportunity {
            row_number,
            name: cell_or(cells, 0, "Unknown"),
            contact_name: cell_or(cells, 1, ""),
            contact_phone: cell_or(cells, 2, ""),
            amount: cell_or(cells, 3, ""),
            stage: cell_or(cells, 4, Stage::Lead.as_str()),
            expected_close_date: cell_or(cells, 5, ""),
            notes: cell_or(cells, 6, ""),
            created_date: cell_or(cells, 7, ""),
            source: cell_or(cells, 8, ""),
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.contact_name.clone(),
            self.contact_phone.clone(),
            self.amount.clone(),
            self.stage.clone(),
            self.expected_close_date.clone(),
            self.notes.clone(),
            self.created_date.clone(),
            self.source.clone(),
        ]
    }
}

/// A writable opportunity field, with its fixed column on the tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpportunityField {
    Amount,
    Stage,
    ExpectedCloseDate,
    Notes,
}

impl OpportunityField {
    /// 1-based position of the field on the Opportunities tab.
    fn column_index(&self) -> u32 {
        match self {
            OpportunityField::Amount => 4,
            OpportunityField::Stage => 5,
            OpportunityField::ExpectedCloseDate => 6,
            OpportunityField::Notes => 7,
        }
    }

    pub fn column(&self) -> String {
        col_to_letter(self.column_index())
    }
}

/// Fields supplied when creating an opportunity. `created_date` is assigned
/// by the gateway at creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOpportunity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub expected_close_date: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub source: String,
}

/// One message template row on the fixed "Templates" tab (columns A..F).
///
/// The opaque `id` is generated from the creation timestamp and only used for
/// UI selection; storage addressing goes by row number like everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub row_number: i64,
    pub id: String,
    pub name: String,
    /// May contain `{{name}}` / `{{phone}}` placeholders
    pub message: String,
    pub html_content: String,
    pub created_date: String,
    /// Updated on every edit
    pub modified_date: String,
}

impl Template {
    pub const TAB: &'static str = "Templates";

    pub const HEADER: [&'static str; 6] = [
        "Id",
        "Name",
        "Message",
        "Html Content",
        "Created Date",
        "Modified Date",
    ];

    pub fn from_row(row_number: i64, cells: &[String]) -> Self {
        Template {
            row_number,
            id: cell_or(cells, 0, ""),
            name: cell_or(cells, 1, "Unknown"),
            message: cell_or(cells, 2, ""),
            html_content: cell_or(cells, 3, ""),
            created_date: cell_or(cells, 4, ""),
            modified_date: cell_or(cells, 5, ""),
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.message.clone(),
            self.html_content.clone(),
            self.created_date.clone(),
            self.modified_date.clone(),
        ]
    }
}

fn cell_or(cells: &[String], idx: usize, fallback: &str) -> String {
    match cells.get(idx) {
        Some(v) if !v.is_empty() => v.clone(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn contact_mapping_applies_fallbacks() {
        let cells = vec!["Alice".to_string(), "+91 98".to_string()];
        let c = Contact::from_row(2, &cells);
        assert_eq!(c.name, "Alice");
        assert_eq!(c.phone, "+91 98");
        assert_eq!(c.status, "New");
        assert_eq!(c.comment, "");
    }

    #[test]
    fn contact_missing_comment_is_empty_string() {
        let cells = vec![
            "Bob".to_string(),
            "123".to_string(),
            "Interested".to_string(),
        ];
        let c = Contact::from_row(5, &cells);
        assert_eq!(c.comment, "");
        assert_eq!(c.row_number, 5);
    }

    #[test]
    fn contact_empty_row_is_all_defaults() {
        let c = Contact::from_row(2, &[]);
        assert_eq!(c.name, "Unknown");
        assert_eq!(c.phone, "");
        assert_eq!(c.status, "New");
        assert_eq!(c.comment, "");
    }

    #[test]
    fn contact_field_columns_are_fixed() {
        assert_eq!(ContactField::Name.column(), "A");
        assert_eq!(ContactField::Phone.column(), "B");
        assert_eq!(ContactField::Status.column(), "C");
        assert_eq!(ContactField::Comment.column(), "D");
    }

    #[test]
    fn opportunity_round_trips_positionally() {
        let opp = Opportunity {
            row_number: 3,
            name: "Website rebuild".into(),
            contact_name: "Carol".into(),
            contact_phone: "+1 555".into(),
            amount: "50000".into(),
            stage: "Proposal".into(),
            expected_close_date: "2026-09-15".into(),
            notes: "warm lead".into(),
            created_date: "2026-08-01".into(),
            source: "referral".into(),
        };
        let cells = opp.to_row();
        assert_eq!(cells.len(), Opportunity::HEADER.len());
        assert_eq!(Opportunity::from_row(3, &cells), opp);
    }

    #[test]
    fn opportunity_stage_defaults_to_lead() {
        let o = Opportunity::from_row(2, &["Deal".to_string()]);
        assert_eq!(o.stage, "Lead");
    }

    #[test]
    fn opportunity_update_columns() {
        assert_eq!(OpportunityField::Amount.column(), "D");
        assert_eq!(OpportunityField::Stage.column(), "E");
        assert_eq!(OpportunityField::ExpectedCloseDate.column(), "F");
        assert_eq!(OpportunityField::Notes.column(), "G");
    }

    #[test]
    fn template_round_trips_positionally() {
        let tpl = Template {
            row_number: 2,
            id: "1756500000000".into(),
            name: "Welcome".into(),
            message: "Hi {{name}}!".into(),
            html_content: "<p>Hi</p>".into(),
            created_date: "2026-08-30T10:00:00Z".into(),
            modified_date: "2026-08-30T10:00:00Z".into(),
        };
        assert_eq!(Template::from_row(2, &tpl.to_row()), tpl);
    }

    #[test]
    fn status_canonical_values() {
        let values: Vec<&str> = [
            Status::New,
            Status::Interested,
            Status::NotInterested,
            Status::Callback,
            Status::Completed,
        ]
        .iter()
        .map(Status::as_str)
        .collect();
        assert_eq!(
            values,
            vec!["New", "Interested", "Not Interested", "Callback", "Completed"]
        );
    }

    #[test]
    fn stage_canonical_values() {
        let values: Vec<&str> = [
            Stage::Lead,
            Stage::Qualified,
            Stage::Proposal,
            Stage::Negotiation,
            Stage::ClosedWon,
            Stage::ClosedLost,
        ]
        .iter()
        .map(Stage::as_str)
        .collect();
        assert_eq!(
            values,
            vec![
                "Lead",
                "Qualified",
                "Proposal",
                "Negotiation",
                "Closed Won",
                "Closed Lost"
            ]
        );
    }
}
