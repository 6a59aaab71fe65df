//! CSV format handling for the sales file
//!
//! This module centralizes all CSV format concerns, providing:
//! - `SourceColumn`, the fifteen columns the pipeline consumes
//! - `ColumnLayout`, the mapping from columns to field positions
//! - Extraction of a `SourceRow` from a decoded field tuple
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{IngestError, SourceRow};
use csv_async::StringRecord;
use tracing::warn;

/// Columns consumed from the sales file, in canonical file order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceColumn {
    OrderId,
    ProductId,
    CustomerId,
    ProductName,
    Category,
    Region,
    SaleDate,
    Quantity,
    UnitPrice,
    Discount,
    ShippingCost,
    PaymentMethod,
    CustomerName,
    CustomerEmail,
    CustomerAddress,
}

impl SourceColumn {
    pub const ALL: [SourceColumn; 15] = [
        SourceColumn::OrderId,
        SourceColumn::ProductId,
        SourceColumn::CustomerId,
        SourceColumn::ProductName,
        SourceColumn::Category,
        SourceColumn::Region,
        SourceColumn::SaleDate,
        SourceColumn::Quantity,
        SourceColumn::UnitPrice,
        SourceColumn::Discount,
        SourceColumn::ShippingCost,
        SourceColumn::PaymentMethod,
        SourceColumn::CustomerName,
        SourceColumn::CustomerEmail,
        SourceColumn::CustomerAddress,
    ];

    /// Position of the column in the canonical file
    pub fn position(self) -> usize {
        self as usize
    }

    /// Header text of the column in the canonical file
    pub fn canonical_name(self) -> &'static str {
        match self {
            SourceColumn::OrderId => "Order ID",
            SourceColumn::ProductId => "Product ID",
            SourceColumn::CustomerId => "Customer ID",
            SourceColumn::ProductName => "Product Name",
            SourceColumn::Category => "Category",
            SourceColumn::Region => "Region",
            SourceColumn::SaleDate => "Date of Sale",
            SourceColumn::Quantity => "Quantity Sold",
            SourceColumn::UnitPrice => "Unit Price",
            SourceColumn::Discount => "Discount",
            SourceColumn::ShippingCost => "Shipping Cost",
            SourceColumn::PaymentMethod => "Payment Method",
            SourceColumn::CustomerName => "Customer Name",
            SourceColumn::CustomerEmail => "Customer Email",
            SourceColumn::CustomerAddress => "Customer Address",
        }
    }

    /// Accepted header names, already folded by `fold_header`
    fn header_names(self) -> &'static [&'static str] {
        match self {
            SourceColumn::OrderId => &["orderid"],
            SourceColumn::ProductId => &["productid"],
            SourceColumn::CustomerId => &["customerid"],
            SourceColumn::ProductName => &["productname"],
            SourceColumn::Category => &["category", "productcategory"],
            SourceColumn::Region => &["region"],
            SourceColumn::SaleDate => &["dateofsale", "saledate"],
            SourceColumn::Quantity => &["quantitysold", "quantity"],
            SourceColumn::UnitPrice => &["unitprice"],
            SourceColumn::Discount => &["discount"],
            SourceColumn::ShippingCost => &["shippingcost"],
            SourceColumn::PaymentMethod => &["paymentmethod"],
            SourceColumn::CustomerName => &["customername"],
            SourceColumn::CustomerEmail => &["customeremail", "email"],
            SourceColumn::CustomerAddress => &["customeraddress", "address"],
        }
    }
}

/// Lowercase a header cell and drop everything but ASCII letters and digits
///
/// `"Order ID"`, `"order_id"` and `"ORDER-ID"` all fold to `"orderid"`.
fn fold_header(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Where each consumed column lives in a data record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    indices: [usize; 15],
}

impl Default for ColumnLayout {
    /// The canonical positional layout
    fn default() -> Self {
        let mut indices = [0; 15];
        for column in SourceColumn::ALL {
            indices[column.position()] = column.position();
        }
        Self { indices }
    }
}

impl ColumnLayout {
    /// Resolve the layout from a header record
    ///
    /// Every column is looked up by name. A header that names none of the
    /// columns is treated as unrecognised and the canonical positional
    /// layout is used. A header that names only some of them is rejected,
    /// since reading it positionally would misalign the fields.
    pub fn resolve(header: &StringRecord) -> Result<Self, IngestError> {
        let folded: Vec<String> = header.iter().map(fold_header).collect();
        let mut indices = [0; 15];
        let mut missing = Vec::new();

        for column in SourceColumn::ALL {
            match folded
                .iter()
                .position(|name| column.header_names().contains(&name.as_str()))
            {
                Some(index) => indices[column.position()] = index,
                None => missing.push(column),
            }
        }

        if missing.is_empty() {
            return Ok(Self { indices });
        }

        if missing.len() == SourceColumn::ALL.len() {
            warn!(
                header = ?header.iter().collect::<Vec<_>>(),
                "Header names no sales column; falling back to positional layout"
            );
            return Ok(Self::default());
        }

        let names: Vec<&str> = missing.iter().map(|c| c.canonical_name()).collect();
        Err(IngestError::header_read(format!(
            "header is missing columns: {}",
            names.join(", ")
        )))
    }

    /// Index of a column within a data record
    pub fn index_of(&self, column: SourceColumn) -> usize {
        self.indices[column.position()]
    }

    /// Minimum number of fields a record must carry
    pub fn width(&self) -> usize {
        self.indices.iter().copied().max().map_or(0, |max| max + 1)
    }

    /// Extract a named row from a decoded field tuple
    ///
    /// Returns `None` if the record is narrower than the layout.
    pub fn extract(&self, record: &StringRecord) -> Option<SourceRow> {
        if record.len() < self.width() {
            return None;
        }

        let field = |column: SourceColumn| -> String {
            record
                .get(self.index_of(column))
                .unwrap_or_default()
                .to_string()
        };

        Some(SourceRow {
            order_id: field(SourceColumn::OrderId),
            product_id: field(SourceColumn::ProductId),
            customer_id: field(SourceColumn::CustomerId),
            product_name: field(SourceColumn::ProductName),
            category: field(SourceColumn::Category),
            region: field(SourceColumn::Region),
            sale_date: field(SourceColumn::SaleDate),
            quantity: field(SourceColumn::Quantity),
            unit_price: field(SourceColumn::UnitPrice),
            discount: field(SourceColumn::Discount),
            shipping_cost: field(SourceColumn::ShippingCost),
            payment_method: field(SourceColumn::PaymentMethod),
            customer_name: field(SourceColumn::CustomerName),
            customer_email: field(SourceColumn::CustomerEmail),
            customer_address: field(SourceColumn::CustomerAddress),
        })
    }
}
