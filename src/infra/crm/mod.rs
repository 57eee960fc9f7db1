pub mod hubspot_client;
