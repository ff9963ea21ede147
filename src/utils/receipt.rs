use uuid::Uuid;

/// Use the receipt number the desk typed, or generate `REC-XXXXXXXX`.
pub fn receipt_or_generate(supplied: Option<&str>) -> String {
    match supplied.map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => generate_receipt_no(),
    }
}

pub fn generate_receipt_no() -> String {
    let id = Uuid::new_v4().to_simple().to_string();
    format!("REC-{}", id[..8].to_uppercase())
}
