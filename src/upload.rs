//! Bulk contact upload: delimited text in, a freshly seeded tab out.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::NewContact;

/// Parse an uploaded file body as delimited text with a header row.
///
/// Column names are matched case-insensitively: `name`, `phone` /
/// `phone number`, and `status` are recognized; anything else is ignored.
/// Missing names become "Unknown" and missing statuses default at write time.
pub fn parse_contacts(data: &[u8]) -> Result<Vec<NewContact>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let columns = ColumnMap::from_headers(&headers);

    let mut contacts = Vec::new();
    for record in reader.records() {
        let record = record?;
        let name = field(&record, columns.name);
        let phone = field(&record, columns.phone);
        let status = field(&record, columns.status);

        // Skip rows that are entirely blank
        if name.is_empty() && phone.is_empty() && status.is_empty() {
            continue;
        }

        contacts.push(NewContact {
            name: if name.is_empty() {
                "Unknown".to_string()
            } else {
                name.to_string()
            },
            phone: phone.to_string(),
            status: status.to_string(),
            comment: String::new(),
        });
    }

    Ok(contacts)
}

/// Title for a freshly uploaded tab: `Upload_<timestamp>` with the ISO-8601
/// timestamp made range-safe (`:` and `.` replaced by `-`).
pub fn upload_tab_title(now: DateTime<Utc>) -> String {
    let stamp = now
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace([':', '.'], "-");
    format!("Upload_{stamp}")
}

fn field(record: &csv::StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| record.get(i)).unwrap_or("").trim()
}

struct ColumnMap {
    name: Option<usize>,
    phone: Option<usize>,
    status: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut map = ColumnMap {
            name: None,
            phone: None,
            status: None,
        };
        for (idx, header) in headers.iter().enumerate() {
            match header.trim().to_lowercase().as_str() {
                "name" => map.name = map.name.or(Some(idx)),
                "phone" | "phone number" => map.phone = map.phone.or(Some(idx)),
                "status" => map.status = map.status.or(Some(idx)),
                _ => {}
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_standard_header() {
        let csv = b"Name,Phone,Status\nAlice,+91 98765,Interested\n";
        let contacts = parse_contacts(csv).unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Alice");
        assert_eq!(contacts[0].phone, "+91 98765");
        assert_eq!(contacts[0].status, "Interested");
    }

    #[test]
    fn header_matching_is_case_insensitive() {
        let csv = b"NAME,PHONE NUMBER,status\nBob,123,Callback\n";
        let contacts = parse_contacts(csv).unwrap();
        assert_eq!(contacts[0].name, "Bob");
        assert_eq!(contacts[0].phone, "123");
        assert_eq!(contacts[0].status, "Callback");
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let csv = b"Email,Name,Phone\na@b.c,Carol,456\n";
        let contacts = parse_contacts(csv).unwrap();
        assert_eq!(contacts[0].name, "Carol");
        assert_eq!(contacts[0].phone, "456");
        assert_eq!(contacts[0].status, "");
    }

    #[test]
    fn blank_name_defaults_and_blank_rows_are_skipped() {
        let csv = b"Name,Phone,Status\n,789,\n,,\n";
        let contacts = parse_contacts(csv).unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Unknown");
        assert_eq!(contacts[0].phone, "789");
    }

    #[test]
    fn blank_status_defaults_at_seed_time() {
        let csv = b"Name,Phone,Status\nDave,111,\n";
        let contacts = parse_contacts(csv).unwrap();
        assert_eq!(contacts[0].status, "");
        assert_eq!(contacts[0].seed_row()[2], "New");
    }

    #[test]
    fn upload_title_is_timestamped_and_range_safe() {
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 12, 4, 5).unwrap();
        let title = upload_tab_title(now);
        assert_eq!(title, "Upload_2026-08-30T12-04-05-000Z");
        assert!(!title.contains(':'));
        assert!(!title.contains('.'));
    }
}
