mod client;
mod listing;

pub use client::{Client, NewClient, FIRSTNAME_MAX_LEN, LASTNAME_MAX_LEN, PHONE_MAX_LEN};
pub use listing::{cmp_by_name, ClientQuery, SortDirection, SortKey};
