//! CSV export of orders

/// One order flattened for export
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExportRow {
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub subtotal: rust_decimal::Decimal,
    pub tax: rust_decimal::Decimal,
    pub shipping: rust_decimal::Decimal,
    pub discount: rust_decimal::Decimal,
    pub total: rust_decimal::Decimal,
    pub items_count: i64,
    pub created_at: i64,
}

const HEADER: &str = "Order Number,Customer Name,Customer Email,Status,Payment Status,Payment Method,Subtotal,Tax,Shipping,Discount,Total,Items Count,Created At";

/// Quote a field when it contains a comma or quote, doubling inner quotes.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_created_at(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Render the full CSV document. An empty order set yields only the
/// header line.
pub fn render_csv(rows: &[ExportRow]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for row in rows {
        let fields = [
            csv_field(&row.order_number),
            csv_field(&row.customer_name),
            csv_field(&row.customer_email),
            csv_field(&row.status),
            csv_field(&row.payment_status),
            csv_field(row.payment_method.as_deref().unwrap_or("N/A")),
            row.subtotal.to_string(),
            row.tax.to_string(),
            row.shipping.to_string(),
            row.discount.to_string(),
            row.total.to_string(),
            row.items_count.to_string(),
            csv_field(&format_created_at(row.created_at)),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn row(name: &str, payment_method: Option<&str>) -> ExportRow {
        ExportRow {
            order_number: "ORD-00001".into(),
            customer_name: name.into(),
            customer_email: "jane@example.com".into(),
            status: "PAID".into(),
            payment_status: "PAID".into(),
            payment_method: payment_method.map(String::from),
            subtotal: Decimal::from_str("100.00").unwrap(),
            tax: Decimal::from_str("7.25").unwrap(),
            shipping: Decimal::from_str("5.99").unwrap(),
            discount: Decimal::ZERO,
            total: Decimal::from_str("113.24").unwrap(),
            items_count: 2,
            created_at: 1_767_323_045_000,
        }
    }

    #[test]
    fn test_empty_export_is_header_only() {
        let csv = render_csv(&[]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[0].split(',').count(), 13);
    }

    #[test]
    fn test_comma_in_name_is_quoted() {
        let csv = render_csv(&[row("Doe, John", Some("card"))]);
        let line = csv.lines().nth(1).unwrap();
        assert!(line.contains("\"Doe, John\""));
    }

    #[test]
    fn test_missing_payment_method_renders_na() {
        let csv = render_csv(&[row("Jane", None)]);
        let line = csv.lines().nth(1).unwrap();
        assert!(line.contains(",N/A,"));
    }

    #[test]
    fn test_inner_quotes_doubled() {
        let csv = render_csv(&[row("Jane \"JJ\" Doe, Esq", Some("card"))]);
        let line = csv.lines().nth(1).unwrap();
        assert!(line.contains("\"Jane \"\"JJ\"\" Doe, Esq\""));
    }

    #[test]
    fn test_plain_row_fields() {
        let csv = render_csv(&[row("Jane", Some("card"))]);
        let line = csv.lines().nth(1).unwrap();
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 13);
        assert_eq!(fields[0], "ORD-00001");
        assert_eq!(fields[6], "100.00");
        assert_eq!(fields[10], "113.24");
        assert_eq!(fields[11], "2");
    }
}
