//! Copy WhatsApp Business message templates between business accounts.
//!
//! The modules follow the data flow of a run: `fetcher` lists templates,
//! `normalizer` (with `media`) reshapes them for the destination account,
//! `publisher` submits them and `driver` ties the steps together and collects
//! one `record::MigrationRecord` per attempted template.
pub mod config;
pub mod driver;
pub mod dry_run;
pub mod fetcher;
pub mod graph;
pub mod media;
pub mod model;
pub mod normalizer;
pub mod publisher;
pub mod record;
