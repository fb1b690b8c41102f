//! Summary figures and price histogram for a result list.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceSummary {
    pub count: usize,
    pub min: Decimal,
    pub max: Decimal,
    /// Arithmetic mean rounded to two decimal places.
    pub mean: Decimal,
}

/// `None` for an empty price list.
#[must_use]
pub fn summarize(prices: &[Decimal]) -> Option<PriceSummary> {
    let (&first, rest) = prices.split_first()?;
    let (min, max, sum) = rest
        .iter()
        .fold((first, first, first), |(min, max, sum), &p| {
            (min.min(p), max.max(p), sum + p)
        });
    let count = prices.len();
    Some(PriceSummary {
        count,
        min,
        max,
        mean: (sum / Decimal::from(count)).round_dp(2),
    })
}

/// One equal-width price range. `upper` is exclusive except on the last
/// bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramBucket {
    pub lower: Decimal,
    pub upper: Decimal,
    pub count: usize,
}

/// Split `[min, max]` into `buckets` equal-width ranges and count prices.
///
/// When every price is equal there is a single bucket holding all of them.
/// Empty input or zero buckets yield an empty histogram.
#[must_use]
pub fn histogram(prices: &[Decimal], buckets: usize) -> Vec<HistogramBucket> {
    let Some(summary) = summarize(prices) else {
        return Vec::new();
    };
    if buckets == 0 {
        return Vec::new();
    }
    let span = summary.max - summary.min;
    if span.is_zero() {
        return vec![HistogramBucket {
            lower: summary.min,
            upper: summary.max,
            count: prices.len(),
        }];
    }

    let width = span / Decimal::from(buckets);
    let mut out: Vec<HistogramBucket> = (0..buckets)
        .map(|i| HistogramBucket {
            lower: summary.min + width * Decimal::from(i),
            upper: if i + 1 == buckets {
                summary.max
            } else {
                summary.min + width * Decimal::from(i + 1)
            },
            count: 0,
        })
        .collect();

    for &price in prices {
        let slot = ((price - summary.min) / width)
            .floor()
            .to_usize()
            .unwrap_or(0)
            .min(buckets - 1);
        out[slot].count += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn summarize_empty_is_none() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn summarize_reports_min_max_and_rounded_mean() {
        let summary = summarize(&[d("1.759"), d("1.699"), d("1.849")]).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, d("1.699"));
        assert_eq!(summary.max, d("1.849"));
        assert_eq!(summary.mean, d("1.77"));
    }

    #[test]
    fn histogram_spreads_prices_over_equal_buckets() {
        let prices = [d("1.60"), d("1.65"), d("1.70"), d("1.79"), d("2.00")];
        let buckets = histogram(&prices, 4);
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0].lower, d("1.60"));
        assert_eq!(buckets[0].upper, d("1.70"));
        assert_eq!(buckets[3].upper, d("2.00"));
        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 2, 0, 1]);
    }

    #[test]
    fn maximum_lands_in_last_bucket() {
        let buckets = histogram(&[d("1.0"), d("2.0")], 2);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].count, 1);
    }

    #[test]
    fn equal_prices_make_a_single_bucket() {
        let buckets = histogram(&[d("1.759"), d("1.759"), d("1.759")], 5);
        assert_eq!(
            buckets,
            vec![HistogramBucket {
                lower: d("1.759"),
                upper: d("1.759"),
                count: 3,
            }]
        );
    }

    #[test]
    fn empty_input_or_no_buckets_is_empty() {
        assert!(histogram(&[], 5).is_empty());
        assert!(histogram(&[d("1.0"), d("2.0")], 0).is_empty());
    }
}
