// ═══════════════════════════════════════════════════════════════════
// Service Tests: BalanceService, AnalyticsService, CsvService
// ═══════════════════════════════════════════════════════════════════

mod common;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{at, dentist, groceries, salary, tx};
use finance_sync_core::errors::CoreError;
use finance_sync_core::models::analytics::SortOption;
use finance_sync_core::models::balance::BucketSize;
use finance_sync_core::models::category::{Category, Direction};
use finance_sync_core::models::transaction::Transaction;
use finance_sync_core::services::analytics_service::AnalyticsService;
use finance_sync_core::services::balance_service::BalanceService;
use finance_sync_core::services::csv_service::{CsvService, CSV_HEADER};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// BalanceService
// ═══════════════════════════════════════════════════════════════════

mod balance_service {
    use super::*;

    fn march_transactions() -> Vec<Transaction> {
        vec![
            tx(1, salary(), dec!(200), at(2025, 3, 10, 9)),
            tx(2, groceries(), dec!(50), at(2025, 3, 8, 18)),
            // Outside a five-day window ending on the 10th.
            tx(3, salary(), dec!(100), at(2025, 3, 1, 9)),
        ]
    }

    #[test]
    fn daily_walks_backward_from_current_balance() {
        let series = BalanceService::new().project_daily(
            dec!(1000),
            &march_transactions(),
            date(2025, 3, 10),
            5,
        );

        assert_eq!(series.bucket, BucketSize::Day);
        assert_eq!(series.len(), 5);
        assert_eq!(series.get(date(2025, 3, 10)), Some(dec!(1000)));
        assert_eq!(series.get(date(2025, 3, 9)), Some(dec!(800)));
        assert_eq!(series.get(date(2025, 3, 8)), Some(dec!(800)));
        assert_eq!(series.get(date(2025, 3, 7)), Some(dec!(850)));
        assert_eq!(series.get(date(2025, 3, 6)), Some(dec!(850)));
        assert_eq!(series.opening_balance, dec!(850));
    }

    #[test]
    fn first_and_last_span_the_window() {
        let series = BalanceService::new().project_daily(
            dec!(1000),
            &march_transactions(),
            date(2025, 3, 10),
            5,
        );

        assert_eq!(series.first(), Some((date(2025, 3, 6), dec!(850))));
        assert_eq!(series.last(), Some((date(2025, 3, 10), dec!(1000))));
    }

    #[test]
    fn later_deltas_explain_the_gap_to_current_balance() {
        let transactions = march_transactions();
        let current = dec!(1000);
        let series =
            BalanceService::new().project_daily(current, &transactions, date(2025, 3, 10), 5);

        let (earliest, earliest_balance) = series.first().unwrap();
        let later: Decimal = transactions
            .iter()
            .filter(|t| t.transaction_date.date_naive() > earliest)
            .map(|t| t.balance_effect())
            .sum();
        assert_eq!(later, current - earliest_balance);
    }

    #[test]
    fn projection_is_deterministic() {
        let service = BalanceService::new();
        let transactions = march_transactions();

        let a = service.project_daily(dec!(1000), &transactions, date(2025, 3, 10), 30);
        let b = service.project_daily(dec!(1000), &transactions, date(2025, 3, 10), 30);

        assert_eq!(a, b);
    }

    #[test]
    fn no_transactions_means_flat_series() {
        let series = BalanceService::new().project_daily(dec!(42.5), &[], date(2025, 3, 10), 7);

        assert_eq!(series.len(), 7);
        assert!(series.points.values().all(|b| *b == dec!(42.5)));
        assert_eq!(series.opening_balance, dec!(42.5));
    }

    #[test]
    fn zero_days_is_empty() {
        let series = BalanceService::new().project_daily(dec!(10), &[], date(2025, 3, 10), 0);

        assert!(series.is_empty());
        assert_eq!(series.opening_balance, dec!(10));
    }

    #[test]
    fn daily_window_crosses_month_boundary() {
        let transactions = vec![tx(1, groceries(), dec!(30), at(2025, 2, 28, 12))];

        let series =
            BalanceService::new().project_daily(dec!(100), &transactions, date(2025, 3, 1), 3);

        assert_eq!(series.get(date(2025, 3, 1)), Some(dec!(100)));
        assert_eq!(series.get(date(2025, 2, 28)), Some(dec!(100)));
        assert_eq!(series.get(date(2025, 2, 27)), Some(dec!(130)));
    }

    #[test]
    fn monthly_buckets_are_keyed_by_first_day() {
        let transactions = vec![
            tx(1, salary(), dec!(300), at(2025, 3, 5, 9)),
            tx(2, groceries(), dec!(100), at(2025, 2, 14, 9)),
            tx(3, salary(), dec!(50), at(2025, 1, 31, 9)),
        ];

        let series =
            BalanceService::new().project_monthly(dec!(1000), &transactions, date(2025, 3, 15), 3);

        assert_eq!(series.bucket, BucketSize::Month);
        let keys: Vec<NaiveDate> = series.points.keys().copied().collect();
        assert_eq!(keys, vec![date(2025, 1, 1), date(2025, 2, 1), date(2025, 3, 1)]);
        assert_eq!(series.get(date(2025, 3, 1)), Some(dec!(1000)));
        assert_eq!(series.get(date(2025, 2, 1)), Some(dec!(700)));
        assert_eq!(series.get(date(2025, 1, 1)), Some(dec!(800)));
        assert_eq!(series.opening_balance, dec!(750));
    }

    #[test]
    fn monthly_window_crosses_year_boundary() {
        let series = BalanceService::new().project_monthly(dec!(5), &[], date(2025, 2, 10), 4);

        let keys: Vec<NaiveDate> = series.points.keys().copied().collect();
        assert_eq!(
            keys,
            vec![date(2024, 11, 1), date(2024, 12, 1), date(2025, 1, 1), date(2025, 2, 1)]
        );
    }
}

// ═══════════════════════════════════════════════════════════════════
// AnalyticsService
// ═══════════════════════════════════════════════════════════════════

mod analytics_service {
    use super::*;

    fn sample() -> Vec<Transaction> {
        vec![
            tx(1, groceries(), dec!(30), at(2025, 3, 3, 12)),
            tx(2, salary(), dec!(1000), at(2025, 3, 1, 12)),
            tx(3, dentist(), dec!(25), at(2025, 3, 2, 12)),
            tx(4, groceries(), dec!(45), at(2025, 3, 4, 12)),
        ]
    }

    #[test]
    fn filter_keeps_one_direction_in_order() {
        let outcome = AnalyticsService::new().filter_by_direction(&sample(), Direction::Outcome);

        let ids: Vec<i64> = outcome.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn sort_by_date_ascending() {
        let sorted = AnalyticsService::new().sort(&sample(), SortOption::Date);

        let ids: Vec<i64> = sorted.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 1, 4]);
    }

    #[test]
    fn sort_by_amount_ascending() {
        let sorted = AnalyticsService::new().sort(&sample(), SortOption::Amount);

        let ids: Vec<i64> = sorted.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1, 4, 2]);
    }

    #[test]
    fn sort_none_keeps_input_order() {
        let sorted = AnalyticsService::new().sort(&sample(), SortOption::None);

        assert_eq!(sorted, sample());
    }

    #[test]
    fn breakdown_largest_first_with_percentages() {
        let service = AnalyticsService::new();
        let outcome = service.filter_by_direction(&sample(), Direction::Outcome);

        let breakdown = service.category_breakdown(&outcome);

        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, groceries());
        assert_eq!(breakdown[0].total, dec!(75));
        assert_eq!(breakdown[0].transaction_count, 2);
        assert_eq!(breakdown[0].percentage, dec!(75.00));
        assert_eq!(breakdown[1].category, dentist());
        assert_eq!(breakdown[1].percentage, dec!(25.00));
    }

    #[test]
    fn breakdown_rounds_to_two_places() {
        let a = Category::new(10, "A", 'a', false);
        let b = Category::new(11, "B", 'b', false);
        let c = Category::new(12, "C", 'c', false);
        let transactions = vec![
            tx(1, a, dec!(1), at(2025, 3, 1, 0)),
            tx(2, b, dec!(1), at(2025, 3, 1, 0)),
            tx(3, c, dec!(1), at(2025, 3, 1, 0)),
        ];

        let breakdown = AnalyticsService::new().category_breakdown(&transactions);

        let names: Vec<&str> = breakdown.iter().map(|b| b.category.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert!(breakdown.iter().all(|b| b.percentage == dec!(33.33)));
    }

    #[test]
    fn empty_breakdown() {
        let service = AnalyticsService::new();

        assert!(service.category_breakdown(&[]).is_empty());
        assert_eq!(service.total_amount(&[]), Decimal::ZERO);
    }

    #[test]
    fn summarize_income() {
        let summary = AnalyticsService::new().summarize(&sample(), Direction::Income);

        assert_eq!(summary.total, dec!(1000));
        assert_eq!(summary.breakdown.len(), 1);
        assert_eq!(summary.breakdown[0].percentage, dec!(100));
    }
}

// ═══════════════════════════════════════════════════════════════════
// CsvService
// ═══════════════════════════════════════════════════════════════════

mod csv_service {
    use super::*;

    #[test]
    fn export_writes_header_and_one_line_per_transaction() {
        let transactions = vec![
            tx(1, salary(), dec!(1000), at(2025, 3, 1, 12)),
            tx(2, groceries(), dec!(12.5), at(2025, 3, 2, 12)),
        ];

        let out = CsvService::new().export(&transactions).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert!(lines[2].starts_with("2,1,Main account,1000,RUB,3,Groceries,"));
        assert!(lines[2].contains(",12.5,2025-03-02T12:00:00.000Z,"));
    }

    #[test]
    fn exported_csv_parses_back() {
        let mut original = tx(7, groceries(), dec!(99.99), at(2025, 3, 2, 12));
        original.comment = Some("milk, bread".into());
        let service = CsvService::new();

        let parsed = service.parse(&service.export(&[original.clone()]).unwrap()).unwrap();

        assert_eq!(parsed, vec![original]);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let header = CSV_HEADER.join(",");
        let good = "1,1,Main,100,RUB,3,Groceries,🧺,false,10,2025-03-01T12:00:00Z,,2025-03-01T12:00:00Z,2025-03-01T12:00:00Z,1";
        let bad_amount = "2,1,Main,100,RUB,3,Groceries,🧺,false,lots,2025-03-01T12:00:00Z,,2025-03-01T12:00:00Z,2025-03-01T12:00:00Z,1";
        let short = "3,1,Main";
        let input = format!("{header}\n{good}\n{bad_amount}\n{short}\n");

        let parsed = CsvService::new().parse(&input).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, 1);
        assert_eq!(parsed[0].amount, dec!(10));
        assert!(parsed[0].comment.is_none());
    }

    #[test]
    fn accepts_timestamps_without_zone() {
        let header = CSV_HEADER.join(",");
        let row = "1,1,Main,100,RUB,1,Salary,💰,true,10,2025-03-01T12:00:00.123,,2025-03-01T12:00:00,2025-03-01T12:00:00,";
        let parsed = CsvService::new().parse(&format!("{header}\n{row}\n")).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].transaction_date.timestamp_subsec_millis(), 123);
        assert_eq!(parsed[0].account.user_id, None);
    }

    #[test]
    fn wrong_header_is_rejected() {
        let err = CsvService::new().parse("id,amount\n1,10\n").unwrap_err();

        assert!(matches!(err, CoreError::ValidationError(ref m) if m.contains("found 2")));
    }
}
