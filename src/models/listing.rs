use std::cmp::Ordering;
use std::fmt;

use clap::ValueEnum;

use super::Client;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    /// Last name, then first name
    #[default]
    Name,
    #[value(name = "created")]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// How a list of clients is narrowed down and ordered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientQuery {
    pub search: String,
    pub sort: SortKey,
    pub direction: SortDirection,
}

/// Name order shared by every backend: ASCII case folded, then byte order, then id.
pub fn cmp_by_name(a: &Client, b: &Client) -> Ordering {
    a.lastname()
        .to_ascii_lowercase()
        .cmp(&b.lastname().to_ascii_lowercase())
        .then_with(|| {
            a.firstname()
                .to_ascii_lowercase()
                .cmp(&b.firstname().to_ascii_lowercase())
        })
        .then_with(|| a.id().cmp(&b.id()))
}

impl ClientQuery {
    /// Case-insensitive substring match on the rendered name, the phone or the id.
    /// An empty search matches everything.
    pub fn matches(&self, client: &Client) -> bool {
        if self.search.is_empty() {
            return true;
        }

        let term = self.search.to_lowercase();
        client.to_string().to_lowercase().contains(&term)
            || client
                .phone()
                .is_some_and(|phone| phone.to_lowercase().contains(&term))
            || client.id().to_string().contains(&term)
    }

    pub fn compare(&self, a: &Client, b: &Client) -> Ordering {
        let ordering = match self.sort {
            SortKey::Name => cmp_by_name(a, b),
            SortKey::CreatedAt => a
                .created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(&b.id())),
        };

        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    pub fn apply(&self, clients: &[Client]) -> Vec<Client> {
        let mut selected: Vec<Client> = clients
            .iter()
            .filter(|client| self.matches(client))
            .cloned()
            .collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
    }

    /// Name ascending, name descending, created ascending, created descending, repeat
    pub fn cycle_sort(&mut self) {
        (self.sort, self.direction) = match (self.sort, self.direction) {
            (SortKey::Name, SortDirection::Ascending) => (SortKey::Name, SortDirection::Descending),
            (SortKey::Name, SortDirection::Descending) => {
                (SortKey::CreatedAt, SortDirection::Ascending)
            }
            (SortKey::CreatedAt, SortDirection::Ascending) => {
                (SortKey::CreatedAt, SortDirection::Descending)
            }
            (SortKey::CreatedAt, SortDirection::Descending) => {
                (SortKey::Name, SortDirection::Ascending)
            }
        };
    }
}

impl fmt::Display for ClientQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.sort {
            SortKey::Name => "name",
            SortKey::CreatedAt => "created",
        };
        let arrow = match self.direction {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        };
        write!(f, "{} {}", key, arrow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewClient;
    use chrono::{Duration, TimeZone, Utc};

    fn client(id: i32, first: &str, last: &str, phone: Option<&str>, minutes: i64) -> Client {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let new = NewClient::new(first, last, phone.map(str::to_string)).unwrap();
        Client::stamp(id, new, base + Duration::minutes(minutes))
    }

    fn sample() -> Vec<Client> {
        vec![
            client(1, "Zoe", "smith", None, 20),
            client(2, "adam", "Smith", Some("555-1234"), 10),
            client(3, "Jane", "Doe", Some("555-9876"), 30),
        ]
    }

    fn ids(clients: &[Client]) -> Vec<i32> {
        clients.iter().map(Client::id).collect()
    }

    #[test]
    fn default_is_name_ascending_ignoring_case() {
        assert_eq!(ids(&ClientQuery::default().apply(&sample())), [3, 2, 1]);
    }

    #[test]
    fn search_matches_name_case_insensitively() {
        let query = ClientQuery {
            search: "SMI".to_string(),
            ..ClientQuery::default()
        };
        assert_eq!(ids(&query.apply(&sample())), [2, 1]);
    }

    #[test]
    fn search_matches_phone_and_id() {
        let by_phone = ClientQuery {
            search: "9876".to_string(),
            ..ClientQuery::default()
        };
        assert_eq!(ids(&by_phone.apply(&sample())), [3]);

        let by_id = ClientQuery {
            search: "2".to_string(),
            ..ClientQuery::default()
        };
        assert_eq!(ids(&by_id.apply(&sample())), [2]);
    }

    #[test]
    fn search_spans_first_and_last_name() {
        let query = ClientQuery {
            search: "jane doe".to_string(),
            ..ClientQuery::default()
        };
        assert_eq!(ids(&query.apply(&sample())), [3]);
    }

    #[test]
    fn sort_by_created_in_both_directions() {
        let mut query = ClientQuery {
            sort: SortKey::CreatedAt,
            ..ClientQuery::default()
        };
        assert_eq!(ids(&query.apply(&sample())), [2, 1, 3]);

        query.direction = SortDirection::Descending;
        assert_eq!(ids(&query.apply(&sample())), [3, 1, 2]);
    }

    #[test]
    fn cycle_visits_every_order_and_wraps() {
        let mut query = ClientQuery::default();
        let mut seen = Vec::new();
        for _ in 0..4 {
            query.cycle_sort();
            seen.push(query.to_string());
        }
        assert_eq!(seen, ["name ▼", "created ▲", "created ▼", "name ▲"]);
    }
}
