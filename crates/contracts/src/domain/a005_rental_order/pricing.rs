//! Расчёт стоимости заказа.
//!
//! Расчёт всегда выполняется заново по текущему черновику: без кеша и без
//! изменения черновика, поэтому повторный вызов даёт тот же результат.

use super::aggregate::{LineItem, OrderDraft, OrderTiming};
use crate::domain::a002_product::ProductId;
use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Стоимость одной строки заказа
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePricing {
    pub product_id: ProductId,
    /// `None` для строк разовой продажи
    pub billable_days: Option<u32>,
    pub base_amount: Decimal,
    pub tax_amount: Decimal,
    pub line_total: Decimal,
}

/// Итоги заказа
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSummary {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount_amount: Decimal,
    pub damage_waiver_amount: Decimal,
    pub damage_waiver_tax: Decimal,
    pub total: Decimal,
    pub lines: Vec<LinePricing>,
}

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Сумма без паники при переполнении: значения вне диапазона `Decimal`
/// насыщаются, ввод всё равно отклоняется валидатором
fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount.saturating_mul(percent) / Decimal::ONE_HUNDRED
}

/// Учитывается ли день недели при заданном числе рабочих дней аренды.
///
/// Документированы значения 5, 6 и 7; значения меньше 5 следуют правилу
/// «до 6 дней: без воскресенья».
fn is_billable_weekday(weekday: Weekday, rental_days_per_week: u8) -> bool {
    match weekday {
        Weekday::Sun => rental_days_per_week >= 7,
        Weekday::Sat => rental_days_per_week != 5,
        _ => true,
    }
}

/// Количество оплачиваемых дней для строки
pub fn billable_days(line: &LineItem, timing: &OrderTiming) -> u32 {
    let floor = line.minimum_rental_period_days.max(1);
    let (Some(start), Some(end)) = (timing.charging_start(), timing.expected_return_date) else {
        return floor;
    };
    counted_days(start, end, line.rental_days_per_week).max(floor)
}

/// Дни с `start` по `end` включительно без исключённых дней недели
pub fn counted_days(start: NaiveDate, end: NaiveDate, rental_days_per_week: u8) -> u32 {
    if end < start {
        return 0;
    }
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| is_billable_weekday(day.weekday(), rental_days_per_week))
        .count() as u32
}

fn price_line(line: &LineItem, timing: &OrderTiming) -> LinePricing {
    let quantity = Decimal::from(line.quantity);

    if let Some(sale_price) = line.sale_price.filter(|_| line.is_sale()) {
        let base_amount = quantity.saturating_mul(sale_price);
        return LinePricing {
            product_id: line.product_id,
            billable_days: None,
            base_amount,
            tax_amount: Decimal::ZERO,
            line_total: base_amount,
        };
    }

    let days = billable_days(line, timing);
    let base_amount = quantity
        .saturating_mul(line.daily_rate)
        .saturating_mul(Decimal::from(days));
    let tax_amount = percent_of(base_amount, line.tax_rate_percent);
    LinePricing {
        product_id: line.product_id,
        billable_days: Some(days),
        base_amount,
        tax_amount,
        line_total: base_amount.saturating_add(tax_amount),
    }
}

/// Рассчитать итоги заказа по черновику
pub fn compute_pricing(draft: &OrderDraft) -> PricingSummary {
    let lines: Vec<LinePricing> = draft
        .line_items
        .iter()
        .map(|line| price_line(line, &draft.timing))
        .collect();

    let subtotal = money(saturating_sum(lines.iter().map(|l| l.base_amount)));
    let tax = money(saturating_sum(lines.iter().map(|l| l.tax_amount)));
    // недопустимую скидку показывает валидатор; в расчёт идёт 0..=100
    let discount_percent = draft
        .settings
        .order_discount_percent
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let discount_amount = money(percent_of(subtotal.saturating_add(tax), discount_percent));

    let waiver = draft.damage_waiver.unwrap_or_default();
    let damage_waiver_amount = money(waiver.amount);
    let damage_waiver_tax = money(waiver.tax);

    let total = subtotal
        .saturating_add(tax)
        .saturating_sub(discount_amount)
        .saturating_add(damage_waiver_amount)
        .saturating_add(damage_waiver_tax);

    PricingSummary {
        subtotal,
        tax,
        discount_amount,
        damage_waiver_amount,
        damage_waiver_tax,
        total,
        lines: lines
            .into_iter()
            .map(|l| LinePricing {
                base_amount: money(l.base_amount),
                tax_amount: money(l.tax_amount),
                line_total: money(l.line_total),
                ..l
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a005_rental_order::aggregate::DamageWaiver;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rental_line(quantity: u32, rate: i64, tax: i64) -> LineItem {
        LineItem {
            product_id: ProductId::new_v4(),
            name: "Plate compactor".into(),
            sku: "PC-200".into(),
            daily_rate: Decimal::new(rate, 0),
            tax_rate_percent: Decimal::new(tax, 0),
            quantity,
            minimum_rental_period_days: 0,
            rental_days_per_week: 7,
            sale_price: None,
            tracks_assets: false,
            selected_assets: Vec::new(),
            maintenance_config: None,
        }
    }

    fn three_day_draft() -> OrderDraft {
        let mut draft = OrderDraft::new();
        draft.timing.charging_start_date = Some(date(2024, 5, 6));
        draft.timing.use_expected_return_date = true;
        draft.timing.expected_return_date = Some(date(2024, 5, 8));
        draft.line_items.push(rental_line(2, 10, 20));
        draft
    }

    #[test]
    fn test_three_day_rental_totals() {
        let pricing = compute_pricing(&three_day_draft());
        assert_eq!(pricing.subtotal, Decimal::new(60, 0));
        assert_eq!(pricing.tax, Decimal::new(12, 0));
        assert_eq!(pricing.discount_amount, Decimal::ZERO);
        assert_eq!(pricing.total, Decimal::new(72, 0));
        assert_eq!(pricing.lines[0].billable_days, Some(3));
    }

    #[test]
    fn test_order_discount_applies_to_subtotal_and_tax() {
        let mut draft = three_day_draft();
        draft.settings.order_discount_percent = Decimal::new(10, 0);
        let pricing = compute_pricing(&draft);
        assert_eq!(pricing.discount_amount, Decimal::new(72, 1));
        assert_eq!(pricing.total, Decimal::new(648, 1));
    }

    #[test]
    fn test_sale_price_line_is_tax_exempt() {
        let mut draft = three_day_draft();
        let mut sale = rental_line(2, 999, 20);
        sale.sale_price = Some(Decimal::new(50, 0));
        draft.line_items = vec![sale];

        let pricing = compute_pricing(&draft);
        assert_eq!(pricing.subtotal, Decimal::new(100, 0));
        assert_eq!(pricing.tax, Decimal::ZERO);
        assert_eq!(pricing.lines[0].billable_days, None);

        // без дат результат тот же
        draft.timing = OrderTiming::default();
        assert_eq!(compute_pricing(&draft).subtotal, Decimal::new(100, 0));
    }

    #[test]
    fn test_zero_sale_price_is_rental() {
        let mut item = rental_line(1, 10, 0);
        item.sale_price = Some(Decimal::ZERO);
        let mut draft = three_day_draft();
        draft.line_items = vec![item];
        assert_eq!(compute_pricing(&draft).subtotal, Decimal::new(30, 0));
    }

    #[test]
    fn test_minimum_rental_period_floor() {
        let mut item = rental_line(1, 10, 0);
        item.minimum_rental_period_days = 10;
        let draft = three_day_draft();
        assert_eq!(billable_days(&item, &draft.timing), 10);
    }

    #[test]
    fn test_missing_dates_bill_floor() {
        let mut item = rental_line(1, 10, 0);
        let timing = OrderTiming::default();
        assert_eq!(billable_days(&item, &timing), 1);
        item.minimum_rental_period_days = 4;
        assert_eq!(billable_days(&item, &timing), 4);
    }

    #[test]
    fn test_return_before_start_bills_floor() {
        let item = rental_line(1, 10, 0);
        let timing = OrderTiming {
            delivery_date: Some(date(2024, 5, 10)),
            expected_return_date: Some(date(2024, 5, 1)),
            ..Default::default()
        };
        assert_eq!(billable_days(&item, &timing), 1);
    }

    #[test]
    fn test_week_exclusions() {
        // 2024-05-06: понедельник
        let start = date(2024, 5, 6);
        let end = date(2024, 5, 19);
        assert_eq!(counted_days(start, end, 7), 14);
        assert_eq!(counted_days(start, end, 6), 12);
        assert_eq!(counted_days(start, end, 5), 10);
    }

    #[test]
    fn test_charging_start_falls_back_to_delivery_date() {
        let item = rental_line(1, 10, 0);
        let timing = OrderTiming {
            delivery_date: Some(date(2024, 5, 6)),
            expected_return_date: Some(date(2024, 5, 10)),
            ..Default::default()
        };
        assert_eq!(billable_days(&item, &timing), 5);
    }

    #[test]
    fn test_damage_waiver_added_after_discount() {
        let mut draft = three_day_draft();
        draft.settings.order_discount_percent = Decimal::new(10, 0);
        draft.damage_waiver = Some(DamageWaiver {
            amount: Decimal::new(5, 0),
            tax: Decimal::new(1, 0),
        });
        let pricing = compute_pricing(&draft);
        assert_eq!(pricing.discount_amount, Decimal::new(72, 1));
        assert_eq!(pricing.total, Decimal::new(708, 1));
    }

    #[test]
    fn test_out_of_range_discount_does_not_panic() {
        let mut draft = three_day_draft();
        draft.settings.order_discount_percent =
            Decimal::from_str("10000000000000000000000000000").unwrap();
        let pricing = compute_pricing(&draft);
        assert_eq!(pricing.discount_amount, Decimal::new(72, 0));
        assert_eq!(pricing.total, Decimal::ZERO);

        draft.settings.order_discount_percent = Decimal::new(-50, 0);
        assert_eq!(compute_pricing(&draft).total, Decimal::new(72, 0));
    }

    #[test]
    fn test_huge_line_amounts_saturate() {
        let mut draft = three_day_draft();
        let mut item = rental_line(u32::MAX, 0, 20);
        item.daily_rate = Decimal::MAX;
        draft.line_items.push(item);
        draft.damage_waiver = Some(DamageWaiver {
            amount: Decimal::MAX,
            tax: Decimal::MAX,
        });
        draft.settings.order_discount_percent = Decimal::new(10, 0);

        let pricing = compute_pricing(&draft);
        assert_eq!(pricing.lines[1].base_amount, Decimal::MAX);
        assert!(pricing.total > Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn pbt_five_day_week_bills_five_days(offset in 0u64..3650) {
            let start = date(2020, 1, 1) + chrono::Days::new(offset);
            let end = start + chrono::Days::new(6);
            prop_assert_eq!(counted_days(start, end, 5), 5);
            prop_assert_eq!(counted_days(start, end, 6), 6);
        }

        #[test]
        fn pbt_pricing_is_idempotent(
            quantity in 0u32..20,
            rate in 0i64..100_000,
            tax in 0i64..3000,
            discount in 0i64..10_000,
            span in 0u64..60,
            min_days in 0u32..30,
            days_per_week in 5u8..=7,
        ) {
            let mut draft = OrderDraft::new();
            draft.timing.delivery_date = Some(date(2024, 1, 1));
            draft.timing.expected_return_date = Some(date(2024, 1, 1) + chrono::Days::new(span));
            let mut item = rental_line(quantity, 0, 0);
            item.daily_rate = Decimal::new(rate, 2);
            item.tax_rate_percent = Decimal::new(tax, 2);
            item.minimum_rental_period_days = min_days;
            item.rental_days_per_week = days_per_week;
            draft.line_items.push(item);
            draft.settings.order_discount_percent = Decimal::new(discount, 2);

            let before = draft.clone();
            let first = compute_pricing(&draft);
            let second = compute_pricing(&draft);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&draft, &before);
            prop_assert!(first.lines[0].billable_days.unwrap_or(0) >= min_days.max(1));
        }
    }
}
