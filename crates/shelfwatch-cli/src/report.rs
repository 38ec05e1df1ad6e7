//! End-of-run summary of a normalized batch.

use std::collections::HashSet;

use shelfwatch_core::ProductRecord;

const TOP_DISCOUNTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PriceStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TopDiscount {
    pub name: String,
    pub brand: String,
    pub percent: f64,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Summary {
    pub products: usize,
    pub unique_ids: usize,
    pub distinct_brands: usize,
    pub priced: usize,
    pub prices: Option<PriceStats>,
    pub discounted: usize,
    pub discount_mean: Option<f64>,
    pub discount_max: Option<f64>,
    /// Largest discounts by percentage, at most five.
    pub top_discounts: Vec<TopDiscount>,
    pub links_resolved: usize,
}

impl Summary {
    pub(crate) fn from_records(records: &[ProductRecord]) -> Self {
        let unique_ids = records.iter().map(|r| r.id.as_str()).collect::<HashSet<_>>().len();
        let distinct_brands = records
            .iter()
            .map(|r| r.brand.as_str())
            .collect::<HashSet<_>>()
            .len();

        let mut prices: Vec<f64> = records.iter().filter_map(|r| r.price_current).collect();
        let priced = prices.len();
        prices.sort_by(f64::total_cmp);

        let mut discounted: Vec<&ProductRecord> = records
            .iter()
            .filter(|r| r.discount_percent.is_some())
            .collect();
        let percents: Vec<f64> = discounted.iter().filter_map(|r| r.discount_percent).collect();
        discounted.sort_by(|a, b| {
            b.discount_percent
                .unwrap_or_default()
                .total_cmp(&a.discount_percent.unwrap_or_default())
        });

        Self {
            products: records.len(),
            unique_ids,
            distinct_brands,
            priced,
            prices: price_stats(&prices),
            discounted: percents.len(),
            discount_mean: mean(&percents),
            discount_max: percents.iter().copied().reduce(f64::max),
            top_discounts: discounted
                .into_iter()
                .take(TOP_DISCOUNTS)
                .map(|r| TopDiscount {
                    name: r.name.clone(),
                    brand: r.brand.clone(),
                    percent: r.discount_percent.unwrap_or_default(),
                    amount: r.discount_amount,
                })
                .collect(),
            links_resolved: records.iter().filter(|r| r.has_link()).count(),
        }
    }

    pub(crate) fn log(&self) {
        tracing::info!(
            products = self.products,
            unique_ids = self.unique_ids,
            distinct_brands = self.distinct_brands,
            links_resolved = self.links_resolved,
            "batch summary"
        );

        match self.prices {
            Some(p) => tracing::info!(
                priced = self.priced,
                min = p.min,
                max = p.max,
                mean = %format!("{:.2}", p.mean),
                median = p.median,
                "prices"
            ),
            None => tracing::warn!("no product carried a parseable price"),
        }

        if let (Some(mean), Some(max)) = (self.discount_mean, self.discount_max) {
            tracing::info!(
                discounted = self.discounted,
                mean_percent = %format!("{mean:.2}"),
                max_percent = max,
                "discounts"
            );
        }
        for (rank, top) in self.top_discounts.iter().enumerate() {
            tracing::info!(
                rank = rank + 1,
                name = %top.name,
                brand = %top.brand,
                percent = top.percent,
                amount = ?top.amount,
                "top discount"
            );
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = values.len() as f64;
    Some(values.iter().sum::<f64>() / count)
}

/// `sorted` must be in ascending order.
fn price_stats(sorted: &[f64]) -> Option<PriceStats> {
    let (&min, &max) = (sorted.first()?, sorted.last()?);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    Some(PriceStats {
        min,
        max,
        mean: mean(sorted)?,
        median,
    })
}

#[cfg(test)]
mod tests {
    use shelfwatch_core::sentinel::LINK_NOT_AVAILABLE;

    use super::*;

    fn record(id: &str, brand: &str, current: Option<f64>, discount: Option<f64>) -> ProductRecord {
        ProductRecord {
            extracted_at: "2026-10-19 08:00:00".to_owned(),
            id: id.to_owned(),
            sequence: 1,
            name: format!("{brand} {id}"),
            brand: brand.to_owned(),
            price_current: current,
            link: format!("https://www.mediamarkt.es/es/product/_{id}.html"),
            price_original: current,
            discount_percent: discount,
            discount_amount: discount.map(|d| d / 10.0),
            price_current_text: String::new(),
            price_original_text: String::new(),
        }
    }

    #[test]
    fn empty_batch_has_no_price_stats() {
        let summary = Summary::from_records(&[]);
        assert_eq!(summary.products, 0);
        assert!(summary.prices.is_none());
        assert!(summary.discount_mean.is_none());
        assert!(summary.top_discounts.is_empty());
    }

    #[test]
    fn price_stats_use_only_parsed_prices() {
        let records = vec![
            record("a", "Kobo", Some(100.0), None),
            record("b", "Kobo", Some(300.0), None),
            record("c", "Amazon", None, None),
            record("d", "Amazon", Some(200.0), None),
            record("e", "Otra marca", Some(150.0), None),
        ];
        let summary = Summary::from_records(&records);
        assert_eq!(summary.products, 5);
        assert_eq!(summary.priced, 4);
        assert_eq!(summary.distinct_brands, 3);
        let prices = summary.prices.unwrap();
        assert!((prices.min - 100.0).abs() < f64::EPSILON);
        assert!((prices.max - 300.0).abs() < f64::EPSILON);
        assert!((prices.mean - 187.5).abs() < f64::EPSILON);
        assert!((prices.median - 175.0).abs() < f64::EPSILON);
    }

    #[test]
    fn top_discounts_are_ranked_and_capped() {
        let records: Vec<ProductRecord> = [5.0, 40.0, 12.5, 33.0, 8.0, 21.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, d)| record(&format!("p{i}"), "Kobo", Some(50.0), Some(*d)))
            .chain([record("full", "Kobo", Some(50.0), None)])
            .collect();

        let summary = Summary::from_records(&records);
        assert_eq!(summary.discounted, 7);
        assert_eq!(summary.discount_max, Some(40.0));
        let ranked: Vec<f64> = summary.top_discounts.iter().map(|t| t.percent).collect();
        assert_eq!(ranked, vec![40.0, 33.0, 21.0, 12.5, 8.0]);
    }

    #[test]
    fn counts_resolved_links_and_unique_ids() {
        let mut missing = record("a", "Kobo", Some(10.0), None);
        missing.link = LINK_NOT_AVAILABLE.to_owned();
        let records = vec![missing, record("a", "Kobo", Some(10.0), None), record("b", "Kobo", None, None)];
        let summary = Summary::from_records(&records);
        assert_eq!(summary.links_resolved, 2);
        assert_eq!(summary.unique_ids, 2);
    }
}
