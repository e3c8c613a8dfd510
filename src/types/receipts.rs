//! Request/response types for the receipt endpoints

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::datetime::{Date, MskDateTime};

/// Default ordering for receipt lists: newest received first
pub const DEFAULT_ORDER: &str = "RECEIVE_DATE:DESC";

/// Filter and pagination parameters for `receipts`
///
/// The service expects all filter fields to be present in the body, null
/// when unset, so none are skipped during serialization.
///
/// # Examples
///
/// ```
/// use lkdr_client::types::ReceiptRequest;
///
/// let request = ReceiptRequest::builder().limit(10).build();
/// assert_eq!(request.limit, 10);
/// assert_eq!(request.order_by, "RECEIVE_DATE:DESC");
/// ```
#[derive(Debug, Clone, Serialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    /// Lower bound (inclusive) on the receipt date
    #[builder(default, setter(strip_option))]
    pub date_from: Option<Date>,
    /// Upper bound (inclusive) on the receipt date
    #[builder(default, setter(strip_option))]
    pub date_to: Option<Date>,
    /// Filter by the seller's tax identifier
    #[builder(default, setter(strip_option, into))]
    pub inn: Option<String>,
    /// Filter by the cash register owner's name
    #[builder(default, setter(into))]
    pub kkt_owner: String,
    /// Page size
    #[builder(default = 10)]
    pub limit: u32,
    /// Page offset
    #[builder(default)]
    pub offset: u32,
    /// Sort order, e.g. `RECEIVE_DATE:DESC`
    #[builder(default = DEFAULT_ORDER.to_string(), setter(into))]
    pub order_by: String,
}

/// Seller brand attached to receipts in a list response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Brand {
    /// Brand description
    pub description: String,
    /// Brand identifier, referenced by [`Receipt::brand_id`]
    pub id: i64,
    /// Brand image URL
    pub image: String,
    /// Display name
    pub name: String,
}

/// A single receipt in a list response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Receipt {
    /// Brand identifier, see [`ReceiptResponse::brands`]
    pub brand_id: i64,
    /// Buyer identifier (phone or email)
    pub buyer: String,
    /// Buyer identifier kind
    pub buyer_type: String,
    /// When the receipt record was created
    pub created_date: MskDateTime,
    /// Fiscal document number
    pub fiscal_document_number: String,
    /// Fiscal drive number
    pub fiscal_drive_number: String,
    /// Opaque key for fetching fiscal detail
    pub key: String,
    /// Cash register owner's name
    pub kkt_owner: String,
    /// Cash register owner's tax identifier
    pub kkt_owner_inn: String,
    /// When the receipt was received by the service
    pub receive_date: MskDateTime,
    /// Total as a decimal string
    pub total_sum: String,
}

/// Response for `receipts`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptResponse {
    /// Brands referenced by the receipts on this page
    pub brands: Vec<Brand>,
    /// Receipts on this page
    pub receipts: Vec<Receipt>,
    /// Whether further pages exist beyond `offset + limit`
    pub has_more: bool,
}

/// Request for `fiscal_data`: the receipt key from a list response
#[derive(Debug, Clone, Serialize)]
pub struct FiscalDataRequest {
    /// Opaque receipt key
    pub key: String,
}

impl FiscalDataRequest {
    /// Build a request for the given receipt key
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// A line item of a fiscal document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FiscalDataItem {
    /// Item name
    pub name: String,
    /// VAT rate code
    pub nds: i32,
    /// Payment type code
    pub payment_type: i32,
    /// Unit price
    pub price: f64,
    /// Product type code
    pub product_type: i32,
    /// Provider's tax identifier
    pub provider_inn: String,
    /// Quantity
    pub quantity: f64,
    /// Line total
    pub sum: f64,
}

/// Full fiscal document for a receipt
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FiscalDataResponse {
    /// Buyer address
    pub buyer_address: String,
    /// Cash payment total
    pub cash_total_sum: f64,
    /// Credit amount
    pub credit_sum: f64,
    /// Document timestamp
    pub date_time: MskDateTime,
    /// Electronic payment total
    pub ecash_total_sum: f64,
    /// Fiscal document format version
    pub fiscal_document_format_ver: String,
    /// Fiscal document number
    pub fiscal_document_number: i64,
    /// Fiscal drive number
    pub fiscal_drive_number: String,
    /// Fiscal sign
    pub fiscal_sign: String,
    /// Internet sale flag
    pub internet_sign: i32,
    /// Line items
    pub items: Vec<FiscalDataItem>,
    /// Cash register registration number
    pub kkt_reg_id: String,
    /// Machine number
    pub machine_number: String,
    /// VAT at 10%
    pub nds10: f64,
    /// VAT at 18/20%
    pub nds18: f64,
    /// Operation type code
    pub operation_type: i32,
    /// Prepaid amount
    pub prepaid_sum: f64,
    /// Provision amount
    pub provision_sum: f64,
    /// Request number within the shift
    pub request_number: i64,
    /// Retail place name
    pub retail_place: String,
    /// Retail place address
    pub retail_place_address: String,
    /// Shift number
    pub shift_number: i64,
    /// Taxation type code
    pub taxation_type: i32,
    /// Document total
    pub total_sum: f64,
    /// Seller name
    pub user: String,
    /// Seller tax identifier
    pub user_inn: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn receipt_request_serializes_nulls_for_unset_filters() {
        let request = ReceiptRequest::builder().limit(1).build();
        let json = serde_json::to_value(&request).unwrap();
        assert!(json["dateFrom"].is_null());
        assert!(json["dateTo"].is_null());
        assert!(json["inn"].is_null());
        assert_eq!(json["kktOwner"], "");
        assert_eq!(json["limit"], 1);
        assert_eq!(json["offset"], 0);
        assert_eq!(json["orderBy"], DEFAULT_ORDER);
    }

    #[test]
    fn receipt_request_with_filters() {
        let request = ReceiptRequest::builder()
            .date_from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().into())
            .inn("7707083893")
            .limit(50)
            .offset(100)
            .build();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["dateFrom"], "2024-01-01");
        assert_eq!(json["inn"], "7707083893");
        assert_eq!(json["offset"], 100);
    }

    #[test]
    fn receipt_response_decodes_partial_body() {
        let response: ReceiptResponse = serde_json::from_str(
            r#"{
                "receipts": [{"key": "k1", "totalSum": "123.45",
                              "createdDate": "2024-05-01T15:30:45",
                              "receiveDate": "2024-05-01T15:31:00"}],
                "hasMore": true
            }"#,
        )
        .unwrap();
        assert!(response.has_more);
        assert!(response.brands.is_empty());
        assert_eq!(response.receipts[0].key, "k1");
        assert_eq!(response.receipts[0].total_sum, "123.45");
    }

    #[test]
    fn fiscal_data_decodes_items() {
        let response: FiscalDataResponse = serde_json::from_str(
            r#"{
                "dateTime": "2024-05-01T15:30:45",
                "totalSum": 123.45,
                "items": [{"name": "Coffee", "price": 123.45, "quantity": 1.0, "sum": 123.45}]
            }"#,
        )
        .unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].name, "Coffee");
        assert!((response.total_sum - 123.45).abs() < f64::EPSILON);
    }
}
