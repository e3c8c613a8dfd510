//! Type definitions for the LKDR client
//!
//! Wire-level request/response types for the receipt endpoints, the device
//! metadata sent with every authentication call, and the timestamp newtypes
//! matching the service's four date formats.

// Module declarations
pub mod datetime;
pub mod device;
pub mod receipts;

pub(crate) mod auth;

// Re-export all public types
pub use datetime::{Date, DateTimeTz, MskDateTime, OffsetDateTime};
pub use device::{DeviceInfo, MetaDetails};
pub use receipts::{
    Brand, FiscalDataItem, FiscalDataRequest, FiscalDataResponse, Receipt, ReceiptRequest,
    ReceiptResponse,
};
