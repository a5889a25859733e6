//! Разбор значений полей ввода формы.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Число из `<input type="number">`; пустое поле означает ноль.
/// `None`, если текст не является числом.
pub fn parse_decimal_input(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return Some(Decimal::ZERO);
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
