//! Record store — persistence for incoming reports and emitted alerts.
//!
//! The `RecordStore` trait is the only seam between the aggregation core and
//! durable storage. `PgRecordStore` is the production Postgres implementation;
//! `MemoryRecordStore` backs tests with no database required.

pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;
pub use traits::RecordStore;
