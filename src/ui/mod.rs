pub mod client_wizard;
pub mod clients;
