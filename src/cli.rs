use std::io::Write;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::db::ClientStore;
use crate::models::{Client, ClientQuery, NewClient, SortDirection, SortKey};

/// Keep track of clients from the terminal
#[derive(Parser, Debug)]
#[command(name = "client-registry", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Open the interactive client list (default)
    Tui,
    /// Print clients, one per line
    List {
        /// Only clients whose name, phone or id contains this, ignoring case
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = SortKey::Name)]
        sort: SortKey,
        /// Reverse the sort order
        #[arg(long)]
        desc: bool,
    },
    /// Print a single client
    Show { id: i32 },
    /// Create a client and print its id
    Add {
        firstname: String,
        lastname: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Change some fields of a client
    Edit {
        id: i32,
        #[arg(long)]
        firstname: Option<String>,
        #[arg(long)]
        lastname: Option<String>,
        #[arg(long, conflicts_with = "clear_phone")]
        phone: Option<String>,
        /// Remove the phone number
        #[arg(long)]
        clear_phone: bool,
    },
    /// Remove a client
    Delete { id: i32 },
}

fn list_line(client: &Client) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        client.id(),
        client,
        client.phone().unwrap_or("-"),
        client.created_at().to_rfc3339()
    )
}

/// One-shot commands need a store that outlives the process
pub fn check_backend(persistent: bool, command: &Command) -> Result<()> {
    if persistent || matches!(command, Command::Tui) {
        return Ok(());
    }
    bail!("DATABASE_URL is not set; one-shot commands would write to a throwaway in-memory store")
}

/// Run a non-interactive command against `store`, writing output to `out`
pub async fn run<S: ClientStore, W: Write>(store: &S, command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Tui => bail!("the terminal UI is not a one-shot command"),
        Command::List { search, sort, desc } => {
            let query = ClientQuery {
                search: search.unwrap_or_default(),
                sort,
                direction: if desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                },
            };
            for client in query.apply(&store.list_clients().await?) {
                writeln!(out, "{}", list_line(&client))?;
            }
        }
        Command::Show { id } => {
            let client = store.get_client(id).await?;
            writeln!(out, "id:         {}", client.id())?;
            writeln!(out, "firstname:  {}", client.firstname())?;
            writeln!(out, "lastname:   {}", client.lastname())?;
            writeln!(out, "phone:      {}", client.phone().unwrap_or("-"))?;
            writeln!(out, "created_at: {}", client.created_at().to_rfc3339())?;
        }
        Command::Add {
            firstname,
            lastname,
            phone,
        } => {
            let phone = phone.filter(|p| !p.is_empty());
            let new = NewClient::new(firstname, lastname, phone)?;
            let client = store.create_client(&new).await?;
            info!(id = client.id(), "added client {}", client);
            writeln!(out, "{}", client.id())?;
        }
        Command::Edit {
            id,
            firstname,
            lastname,
            phone,
            clear_phone,
        } => {
            let current = store.get_client(id).await?;
            let phone = if clear_phone {
                None
            } else {
                phone
                    .or_else(|| current.phone().map(str::to_string))
                    .filter(|p| !p.is_empty())
            };
            let changes = NewClient::new(
                firstname.unwrap_or_else(|| current.firstname().to_string()),
                lastname.unwrap_or_else(|| current.lastname().to_string()),
                phone,
            )?;
            let client = store.update_client(id, &changes).await?;
            info!(id, "updated client {}", client);
            writeln!(out, "{}", list_line(&client))?;
        }
        Command::Delete { id } => {
            store.delete_client(id).await?;
            info!(id, "deleted client");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::error::{Field, ValidationError};

    async fn run_to_string(store: &MemoryStore, command: Command) -> Result<String> {
        let mut out = Vec::new();
        run(store, command, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    fn add(first: &str, last: &str, phone: Option<&str>) -> Command {
        Command::Add {
            firstname: first.to_string(),
            lastname: last.to_string(),
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn parses_add_with_phone() {
        let args = ["client-registry", "add", "Jane", "Doe", "--phone", "555-1234"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.command, Some(add("Jane", "Doe", Some("555-1234"))));
    }

    fn list(search: Option<&str>, sort: SortKey, desc: bool) -> Command {
        Command::List {
            search: search.map(str::to_string),
            sort,
            desc,
        }
    }

    fn ids(listing: &str) -> Vec<&str> {
        listing
            .lines()
            .filter_map(|line| line.split('\t').next())
            .collect()
    }

    #[test]
    fn parses_list_options() {
        let args = ["client-registry", "list", "--search", "doe", "--sort", "created", "--desc"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.command, Some(list(Some("doe"), SortKey::CreatedAt, true)));

        let cli = Cli::try_parse_from(["client-registry", "list"]).unwrap();
        assert_eq!(cli.command, Some(list(None, SortKey::Name, false)));
    }

    #[test]
    fn memory_backend_only_allows_the_tui() {
        assert!(check_backend(false, &Command::Tui).is_ok());
        assert!(check_backend(false, &add("Jane", "Doe", None)).is_err());
        assert!(check_backend(false, &Command::Delete { id: 1 }).is_err());
        assert!(check_backend(true, &add("Jane", "Doe", None)).is_ok());
    }

    #[tokio::test]
    async fn list_filters_by_search_term() {
        let store = MemoryStore::new();
        run_to_string(&store, add("Jane", "Doe", None)).await.unwrap();
        run_to_string(&store, add("John", "Roe", Some("555-1234")))
            .await
            .unwrap();
        run_to_string(&store, add("Janet", "Smith", None)).await.unwrap();

        let by_name = run_to_string(&store, list(Some("jAn"), SortKey::Name, false))
            .await
            .unwrap();
        assert_eq!(ids(&by_name), ["1", "3"]);

        let by_phone = run_to_string(&store, list(Some("1234"), SortKey::Name, false))
            .await
            .unwrap();
        assert_eq!(ids(&by_phone), ["2"]);

        let nothing = run_to_string(&store, list(Some("xyz"), SortKey::Name, false))
            .await
            .unwrap();
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn list_sorts_by_name_or_creation() {
        let store = MemoryStore::new();
        run_to_string(&store, add("Zoe", "Adams", None)).await.unwrap();
        run_to_string(&store, add("Amy", "Zimmer", None)).await.unwrap();
        run_to_string(&store, add("Jane", "Doe", None)).await.unwrap();

        let by_name_desc = run_to_string(&store, list(None, SortKey::Name, true))
            .await
            .unwrap();
        assert_eq!(ids(&by_name_desc), ["2", "3", "1"]);

        let by_created = run_to_string(&store, list(None, SortKey::CreatedAt, false))
            .await
            .unwrap();
        assert_eq!(ids(&by_created), ["1", "2", "3"]);

        let by_created_desc = run_to_string(&store, list(None, SortKey::CreatedAt, true))
            .await
            .unwrap();
        assert_eq!(ids(&by_created_desc), ["3", "2", "1"]);
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["client-registry"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn phone_and_clear_phone_conflict() {
        let parsed = Cli::try_parse_from([
            "client-registry",
            "edit",
            "1",
            "--phone",
            "555",
            "--clear-phone",
        ]);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn add_then_list() {
        let store = MemoryStore::new();
        assert_eq!(run_to_string(&store, add("Jane", "Doe", None)).await.unwrap(), "1\n");
        run_to_string(&store, add("John", "Roe", Some("555-1234")))
            .await
            .unwrap();

        let listing = run_to_string(&store, list(None, SortKey::Name, false))
            .await
            .unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1\tJane Doe\t-\t"));
        assert!(lines[1].starts_with("2\tJohn Roe\t555-1234\t"));
    }

    #[tokio::test]
    async fn add_rejects_long_firstname() {
        let store = MemoryStore::new();
        let err = run_to_string(&store, add(&"A".repeat(101), "Doe", None))
            .await
            .unwrap_err();

        let validation = err.downcast_ref::<ValidationError>().unwrap();
        assert_eq!(validation.field(), Field::Firstname);
        assert!(store.list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_merges_with_stored_values() {
        let store = MemoryStore::new();
        run_to_string(&store, add("Jane", "Doe", Some("555-1234")))
            .await
            .unwrap();
        let created_at = store.get_client(1).await.unwrap().created_at();

        let edit = Command::Edit {
            id: 1,
            firstname: Some("Janet".to_string()),
            lastname: None,
            phone: None,
            clear_phone: false,
        };
        run_to_string(&store, edit).await.unwrap();

        let client = store.get_client(1).await.unwrap();
        assert_eq!(client.to_string(), "Janet Doe");
        assert_eq!(client.phone(), Some("555-1234"));
        assert_eq!(client.created_at(), created_at);
    }

    #[tokio::test]
    async fn edit_can_clear_the_phone() {
        let store = MemoryStore::new();
        run_to_string(&store, add("Jane", "Doe", Some("555-1234")))
            .await
            .unwrap();

        let edit = Command::Edit {
            id: 1,
            firstname: None,
            lastname: None,
            phone: None,
            clear_phone: true,
        };
        run_to_string(&store, edit).await.unwrap();
        assert_eq!(store.get_client(1).await.unwrap().phone(), None);
    }

    #[tokio::test]
    async fn show_and_delete() {
        let store = MemoryStore::new();
        run_to_string(&store, add("Jane", "Doe", None)).await.unwrap();

        let shown = run_to_string(&store, Command::Show { id: 1 }).await.unwrap();
        assert!(shown.contains("firstname:  Jane"));
        assert!(shown.contains("phone:      -"));

        run_to_string(&store, Command::Delete { id: 1 }).await.unwrap();
        assert!(run_to_string(&store, Command::Show { id: 1 }).await.is_err());
    }
}
