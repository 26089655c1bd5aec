//! Schedule detail and e-mail recipient selection

use super::dataset::{field_text, Dataset, Enroll, Request, Row};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Characters left alone by a URI component encoder
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A learner that can be mailed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl Recipient {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

impl From<&Enroll> for Recipient {
    fn from(enroll: &Enroll) -> Self {
        Self {
            first_name: enroll.fname.clone().unwrap_or_default(),
            last_name: enroll.lname.clone().unwrap_or_default(),
            email: enroll.email_addr.clone().filter(|e| !e.is_empty()),
        }
    }
}

impl From<&Request> for Recipient {
    fn from(request: &Request) -> Self {
        Self {
            first_name: request.fname.clone().unwrap_or_default(),
            last_name: request.lname.clone().unwrap_or_default(),
            email: request.email_addr.clone().filter(|e| !e.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Enrollments sharing an enrollment status
    Status,
    /// Pending requests for the schedule's item
    Requests,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientGroup {
    pub kind: GroupKind,
    /// Status description, empty for the request group
    pub title: String,
    pub recipients: Vec<Recipient>,
}

impl RecipientGroup {
    /// Addresses of the group, skipping recipients without one
    pub fn emails(&self) -> impl Iterator<Item = &str> {
        self.recipients.iter().filter_map(|r| r.email.as_deref())
    }
}

/// Everything shown for one selected schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDetail {
    pub schd_id: i64,
    pub title: Option<String>,
    /// Status groups in first-seen order, then the request group if any
    pub groups: Vec<RecipientGroup>,
}

impl ScheduleDetail {
    /// Collect enrollments and matching requests of a schedule.
    ///
    /// Returns `None` when no schedule has that id.
    pub fn build(dataset: &Dataset, schd_id: i64) -> Option<Self> {
        let schedule = dataset.schedule_by_id(schd_id)?;

        let mut groups: Vec<RecipientGroup> = Vec::new();
        for enroll in dataset.enrollments_for(schd_id) {
            match groups.iter_mut().find(|g| g.title == enroll.enrl_stat_desc) {
                Some(group) => group.recipients.push(enroll.into()),
                None => groups.push(RecipientGroup {
                    kind: GroupKind::Status,
                    title: enroll.enrl_stat_desc.clone(),
                    recipients: vec![enroll.into()],
                }),
            }
        }

        let requests: Vec<Recipient> = match field_text(schedule, "ITEM_KEY") {
            Some(item_key) => dataset
                .request
                .iter()
                .filter(|r| r.item_key == item_key)
                .map(Recipient::from)
                .collect(),
            None => Vec::new(),
        };
        if !requests.is_empty() {
            groups.push(RecipientGroup {
                kind: GroupKind::Requests,
                title: String::new(),
                recipients: requests,
            });
        }

        Some(Self {
            schd_id,
            title: schedule_title(schedule),
            groups,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn recipient_count(&self) -> usize {
        self.groups.iter().map(|g| g.recipients.len()).sum()
    }
}

/// Item title of a schedule row
pub fn schedule_title(schedule: &Row) -> Option<String> {
    field_text(schedule, "CPNT_TITLE").filter(|t| !t.is_empty())
}

/// Schedule id of a row, if it has a numeric `SCHD_ID`
pub fn schedule_id(row: &Row) -> Option<i64> {
    row.get("SCHD_ID").and_then(Value::as_i64)
}

/// Selected e-mail addresses in selection order, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailSelection {
    selected: Vec<String>,
}

impl EmailSelection {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, email: &str) -> bool {
        self.selected.iter().any(|e| e == email)
    }

    /// Select or unselect one address; recipients without one are ignored
    pub fn toggle(&mut self, email: Option<&str>) {
        let Some(email) = email.filter(|e| !e.is_empty()) else {
            return;
        };
        if self.contains(email) {
            self.selected.retain(|e| e != email);
        } else {
            self.selected.push(email.to_string());
        }
    }

    /// Add every address of a group to the selection
    pub fn select_all<'a>(&mut self, emails: impl IntoIterator<Item = &'a str>) {
        for email in emails {
            if !email.is_empty() && !self.contains(email) {
                self.selected.push(email.to_string());
            }
        }
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// `mailto:` link addressed to the selection, `#` when nothing is selected
    pub fn mailto_link(&self, subject: &str) -> String {
        if self.selected.is_empty() {
            return "#".to_string();
        }
        format!(
            "mailto:{}?subject={}&body=",
            self.selected.join(","),
            utf8_percent_encode(subject, URI_COMPONENT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset() -> Dataset {
        serde_json::from_value(json!({
            "sched": [
                {"SCHD_ID": 10, "CPNT_TITLE": "Fire Safety", "ITEM_KEY": "COURSE|FS|2023"},
                {"SCHD_ID": 11, "CPNT_TITLE": "", "ITEM_KEY": null}
            ],
            "enroll": [
                {"SCHD_ID": 10, "ENRL_STAT_ID": "E", "STUD_ID": "1", "ENRL_STAT_DESC": "Enrolled", "FNAME": "Ada", "LNAME": "Lovelace", "EMAIL_ADDR": "ada@example.com"},
                {"SCHD_ID": 10, "ENRL_STAT_ID": "W", "STUD_ID": "2", "ENRL_STAT_DESC": "Waitlisted", "FNAME": "Alan", "LNAME": "Turing", "EMAIL_ADDR": null},
                {"SCHD_ID": 10, "ENRL_STAT_ID": "E", "STUD_ID": "3", "ENRL_STAT_DESC": "Enrolled", "FNAME": "Grace", "LNAME": "Hopper", "EMAIL_ADDR": "grace@example.com"},
                {"SCHD_ID": 11, "ENRL_STAT_ID": "E", "STUD_ID": "4", "ENRL_STAT_DESC": "Enrolled", "EMAIL_ADDR": "x@example.com"}
            ],
            "request": [
                {"STUD_ID": "5", "FNAME": "Edsger", "LNAME": "Dijkstra", "EMAIL_ADDR": "ed@example.com", "CPNT_ID": "FS", "CPNT_TYP_ID": "COURSE", "REV_DTE": "2023", "ITEM_KEY": "COURSE|FS|2023"},
                {"STUD_ID": "6", "EMAIL_ADDR": "other@example.com", "CPNT_ID": "X", "CPNT_TYP_ID": "COURSE", "REV_DTE": "2023", "ITEM_KEY": "COURSE|X|2023"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_detail_groups_by_status_in_first_seen_order() {
        let detail = ScheduleDetail::build(&dataset(), 10).unwrap();

        assert_eq!(detail.title.as_deref(), Some("Fire Safety"));
        let titles: Vec<&str> = detail.groups.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["Enrolled", "Waitlisted", ""]);
        assert_eq!(detail.groups[0].recipients.len(), 2);
        assert_eq!(detail.groups[0].recipients[1].display_name(), "Grace Hopper");
        assert_eq!(detail.groups[2].kind, GroupKind::Requests);
        assert_eq!(detail.groups[2].recipients[0].email.as_deref(), Some("ed@example.com"));
        assert_eq!(detail.recipient_count(), 4);
    }

    #[test]
    fn test_detail_without_item_key_has_no_requests() {
        let detail = ScheduleDetail::build(&dataset(), 11).unwrap();
        assert!(detail.title.is_none());
        assert_eq!(detail.groups.len(), 1);
        assert!(ScheduleDetail::build(&dataset(), 99).is_none());
    }

    #[test]
    fn test_toggle_ignores_missing_addresses() {
        let mut selection = EmailSelection::new();
        selection.toggle(None);
        selection.toggle(Some(""));
        assert!(selection.is_empty());

        selection.toggle(Some("a@example.com"));
        assert!(selection.contains("a@example.com"));
        selection.toggle(Some("a@example.com"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_all_is_a_union() {
        let detail = ScheduleDetail::build(&dataset(), 10).unwrap();
        let mut selection = EmailSelection::new();
        selection.toggle(Some("grace@example.com"));

        selection.select_all(detail.groups[0].emails());
        assert_eq!(selection.selected(), ["grace@example.com", "ada@example.com"]);

        selection.select_all(detail.groups[1].emails());
        assert_eq!(selection.len(), 2);

        selection.deselect_all();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_mailto_link() {
        let mut selection = EmailSelection::new();
        assert_eq!(selection.mailto_link("Fire Safety"), "#");

        selection.toggle(Some("a@example.com"));
        selection.toggle(Some("b@example.com"));
        assert_eq!(
            selection.mailto_link("Fire Safety & First Aid (2023)"),
            "mailto:a@example.com,b@example.com?subject=Fire%20Safety%20%26%20First%20Aid%20(2023)&body="
        );
    }
}
