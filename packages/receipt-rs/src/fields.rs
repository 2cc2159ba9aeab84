//! Receipt field names and selection of fields expected once per page.
use std::fmt;

use crate::detection::Detection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiptField {
    CompanyName,
    PhoneNumber,
    Product,
    Quantity,
    UnitPrice,
    ReceiptId,
}

/// Fields that carry one value per receipt.
pub const SINGLE_FIELDS: [ReceiptField; 3] = [
    ReceiptField::CompanyName,
    ReceiptField::PhoneNumber,
    ReceiptField::ReceiptId,
];

impl ReceiptField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptField::CompanyName => "company_name",
            ReceiptField::PhoneNumber => "phone_number",
            ReceiptField::Product => "product",
            ReceiptField::Quantity => "quantity",
            ReceiptField::UnitPrice => "unit_price",
            ReceiptField::ReceiptId => "receipt_id",
        }
    }
}

impl fmt::Display for ReceiptField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detections whose class name is `field`, in input order.
pub fn of_field(detections: &[Detection], field: ReceiptField) -> Vec<&Detection> {
    detections
        .iter()
        .filter(|d| d.class_name == field.as_str())
        .collect()
}

/// Highest-confidence detection of `field`; ties go to the one seen first.
pub fn select_single(detections: &[Detection], field: ReceiptField) -> Option<&Detection> {
    let mut candidates = of_field(detections, field);
    // stable, so equal confidences keep input order
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates.into_iter().next()
}
