// lustre/src/model/money.rs

/// Amounts are integral paise (1/100 INR) everywhere; floats never touch money.
pub type Paise = i64;

pub const CURRENCY: &str = "INR";

/// `1234550` -> `"₹12,345.50"` (Indian digit grouping).
pub fn format_inr(amount: Paise) -> String {
  let sign = if amount < 0 { "-" } else { "" };
  let abs = amount.unsigned_abs();
  let rupees = (abs / 100).to_string();
  let paise = abs % 100;

  let grouped = if rupees.len() <= 3 {
    rupees
  } else {
    let (head, tail) = rupees.split_at(rupees.len() - 3);
    let mut parts: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
      let (left, right) = rest.split_at(rest.len() - 2);
      parts.push(right);
      rest = left;
    }
    if !rest.is_empty() {
      parts.push(rest);
    }
    parts.reverse();
    format!("{},{}", parts.join(","), tail)
  };

  format!("{sign}₹{grouped}.{paise:02}")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn formats_with_indian_grouping() {
    assert_eq!(format_inr(0), "₹0.00");
    assert_eq!(format_inr(99_900), "₹999.00");
    assert_eq!(format_inr(5_000_000), "₹50,000.00");
    assert_eq!(format_inr(1_234_567_89), "₹12,34,567.89");
    assert_eq!(format_inr(-1_050), "-₹10.50");
  }
}
