//! Invoice layout, independent of any output format.

use chrono::NaiveDate;
use domain::{Money, OrderDetails, OrderNumber};

use crate::error::{InvoiceError, Result};

/// Flat goods-and-services tax applied to the subtotal.
pub const GST_PERCENT: u32 = 18;

/// Item rows that fit on the first page, below the header and billing block.
pub const FIRST_PAGE_ROWS: usize = 18;

/// Item rows that fit on a continuation page.
pub const CONTINUATION_PAGE_ROWS: usize = 34;

/// Rows' worth of space the totals block needs at the end of the table.
pub const SUMMARY_ROWS: usize = 6;

/// Storage key of an order's invoice.
pub fn invoice_key(order_number: &OrderNumber) -> String {
    format!("invoice-{order_number}.pdf")
}

/// Static seller details printed in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seller {
    pub name: &'static str,
    pub website: &'static str,
}

pub const SELLER: Seller = Seller {
    name: "E-Shop Pvt. Ltd.",
    website: "www.eshop.com",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingInfo {
    pub name: String,
    pub email: Option<String>,
    pub mobile: String,
    pub shipping_address: String,
}

/// One row of the item table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRow {
    /// 1-based position in the order.
    pub index: usize,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceSummary {
    pub subtotal: Money,
    pub gst: Money,
    pub discount: Money,
    pub grand_total: Money,
}

impl InvoiceSummary {
    /// Computes the totals block from an order's discounted total and discount.
    pub fn new(subtotal: Money, discount: Money) -> Self {
        let gst = subtotal.percentage_rounded_to_rupee(GST_PERCENT);
        Self {
            subtotal,
            gst,
            discount,
            grand_total: subtotal + gst,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePage {
    pub rows: Vec<InvoiceRow>,
    /// Present on the last page only.
    pub summary: Option<InvoiceSummary>,
}

/// A fully laid-out invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDocument {
    pub order_number: OrderNumber,
    pub order_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub seller: Seller,
    pub billing: BillingInfo,
    pub pages: Vec<InvoicePage>,
}

impl InvoiceDocument {
    /// Lays out the invoice for an order.
    ///
    /// Lines whose product is gone keep their locked prices and get a
    /// placeholder title. A missing purchaser or address is an error.
    pub fn build(details: &OrderDetails) -> Result<Self> {
        let order = &details.order;
        let user = details
            .user
            .as_ref()
            .ok_or(InvoiceError::MissingUser(order.id))?;
        let address = details
            .shipping_address
            .as_ref()
            .ok_or(InvoiceError::MissingAddress(order.id))?;

        let rows = details
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| InvoiceRow {
                index: i + 1,
                title: line.title().to_string(),
                quantity: line.item.quantity,
                unit_price: line.item.discounted_price,
                line_total: line.item.line_total(),
            })
            .collect();

        let summary =
            InvoiceSummary::new(order.totals.total_discounted_price, order.totals.discount);

        Ok(Self {
            order_number: order.order_number.clone(),
            order_date: order.order_date.date_naive(),
            delivery_date: order.delivery_date.date_naive(),
            seller: SELLER,
            billing: BillingInfo {
                name: user.full_name(),
                email: user.email.clone(),
                mobile: user.mobile.clone(),
                shipping_address: address.one_line(),
            },
            pages: paginate(rows, summary),
        })
    }

    pub fn key(&self) -> String {
        invoice_key(&self.order_number)
    }

    pub fn summary(&self) -> Option<&InvoiceSummary> {
        self.pages.last().and_then(|p| p.summary.as_ref())
    }

    pub fn row_count(&self) -> usize {
        self.pages.iter().map(|p| p.rows.len()).sum()
    }
}

fn paginate(rows: Vec<InvoiceRow>, summary: InvoiceSummary) -> Vec<InvoicePage> {
    let mut pages = Vec::new();
    let mut rows = rows.into_iter().peekable();
    let mut capacity = FIRST_PAGE_ROWS;

    loop {
        let page_rows: Vec<_> = rows.by_ref().take(capacity).collect();
        let used = page_rows.len();
        pages.push(InvoicePage {
            rows: page_rows,
            summary: None,
        });

        if rows.peek().is_none() {
            if used + SUMMARY_ROWS > capacity {
                pages.push(InvoicePage {
                    rows: Vec::new(),
                    summary: None,
                });
            }
            break;
        }
        capacity = CONTINUATION_PAGE_ROWS;
    }

    if let Some(last) = pages.last_mut() {
        last.summary = Some(summary);
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domain::{
        Address, CartItem, NewAddress, NewOrder, OrderItem, OrderLine, Product, Totals, User,
    };

    fn details(line_count: usize) -> OrderDetails {
        let user = User::new(
            "Asha",
            "Verma",
            Some("asha@example.com".to_string()),
            "9876543210",
        );
        let address = Address::create(
            user.id,
            NewAddress {
                first_name: "Asha".to_string(),
                last_name: "Verma".to_string(),
                street_address: "12 MG Road".to_string(),
                city: "Pune".to_string(),
                state: "MH".to_string(),
                zip_code: "411001".to_string(),
                mobile: None,
                is_default: true,
            },
            true,
        );
        let product = Product::new("Shirt", Money::from_rupees(500), Money::from_rupees(450));
        let lines: Vec<OrderLine> = (0..line_count)
            .map(|_| OrderLine {
                item: OrderItem::from_cart_item(&CartItem::for_product(
                    user.id, &product, 2, None,
                )),
                product: Some(product.clone()),
            })
            .collect();
        let totals = Totals {
            total_price: Money::from_rupees(1200),
            total_discounted_price: Money::from_rupees(1100),
            discount: Money::from_rupees(100),
            total_item: 2,
        };
        let order_date = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        let order = NewOrder::new(
            user.id,
            address.id,
            lines.iter().map(|l| l.item.id).collect(),
            totals,
        )
        .build(order_date);

        OrderDetails {
            order,
            user: Some(user),
            lines,
            shipping_address: Some(address),
        }
    }

    #[test]
    fn summary_applies_gst_to_subtotal() {
        let doc = InvoiceDocument::build(&details(2)).unwrap();
        let summary = doc.summary().unwrap();

        assert_eq!(summary.subtotal, Money::from_rupees(1100));
        assert_eq!(summary.gst, Money::from_rupees(198));
        assert_eq!(summary.discount, Money::from_rupees(100));
        assert_eq!(summary.grand_total, Money::from_rupees(1298));
    }

    #[test]
    fn gst_rounds_to_whole_rupees() {
        // 18% of 1105 is 198.90.
        let summary = InvoiceSummary::new(Money::from_rupees(1105), Money::zero());
        assert_eq!(summary.gst, Money::from_rupees(199));
        assert_eq!(summary.grand_total, Money::from_rupees(1304));
    }

    #[test]
    fn header_and_billing_come_from_order() {
        let details = details(1);
        let doc = InvoiceDocument::build(&details).unwrap();

        assert_eq!(doc.order_date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(doc.delivery_date, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
        assert_eq!(doc.billing.name, "Asha Verma");
        assert_eq!(doc.billing.shipping_address, "12 MG Road, Pune, MH - 411001");
        assert_eq!(
            doc.key(),
            format!("invoice-{}.pdf", details.order.order_number)
        );
    }

    #[test]
    fn rows_use_locked_prices() {
        let doc = InvoiceDocument::build(&details(1)).unwrap();
        let row = &doc.pages[0].rows[0];

        assert_eq!(row.index, 1);
        assert_eq!(row.title, "Shirt");
        assert_eq!(row.quantity, 2);
        assert_eq!(row.unit_price, Money::from_rupees(450));
        assert_eq!(row.line_total, Money::from_rupees(900));
    }

    #[test]
    fn missing_product_gets_placeholder_title() {
        let mut details = details(1);
        details.lines[0].product = None;

        let doc = InvoiceDocument::build(&details).unwrap();
        assert_eq!(doc.pages[0].rows[0].title, "Unavailable product");
    }

    #[test]
    fn missing_user_or_address_is_an_error() {
        let mut no_user = details(1);
        no_user.user = None;
        assert!(matches!(
            InvoiceDocument::build(&no_user),
            Err(InvoiceError::MissingUser(_))
        ));

        let mut no_address = details(1);
        no_address.shipping_address = None;
        assert!(matches!(
            InvoiceDocument::build(&no_address),
            Err(InvoiceError::MissingAddress(_))
        ));
    }

    #[test]
    fn short_invoice_fits_one_page() {
        let doc = InvoiceDocument::build(&details(3)).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].summary.is_some());
    }

    #[test]
    fn long_invoice_continues_and_keeps_every_row() {
        let count = FIRST_PAGE_ROWS + CONTINUATION_PAGE_ROWS + 3;
        let doc = InvoiceDocument::build(&details(count)).unwrap();

        assert_eq!(doc.pages.len(), 3);
        assert_eq!(doc.row_count(), count);
        assert_eq!(doc.pages[0].rows.len(), FIRST_PAGE_ROWS);
        assert!(doc.pages[..2].iter().all(|p| p.summary.is_none()));
        assert!(doc.pages[2].summary.is_some());
        let indexes: Vec<usize> = doc
            .pages
            .iter()
            .flat_map(|p| &p.rows)
            .map(|r| r.index)
            .collect();
        assert_eq!(indexes, (1..=count).collect::<Vec<_>>());
    }

    #[test]
    fn summary_moves_to_new_page_when_table_is_full() {
        let doc = InvoiceDocument::build(&details(FIRST_PAGE_ROWS)).unwrap();

        assert_eq!(doc.pages.len(), 2);
        assert!(doc.pages[0].summary.is_none());
        assert!(doc.pages[1].rows.is_empty());
        assert!(doc.pages[1].summary.is_some());
    }

    #[test]
    fn empty_order_still_has_a_summary_page() {
        let mut details = details(0);
        details.order.item_ids.clear();
        let doc = InvoiceDocument::build(&details).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.summary().is_some());
    }
}
