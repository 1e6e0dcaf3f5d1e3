use crate::error::Result;
use crate::metadata::ApiMetadata;
use crate::models::PerformanceRecord;
use crate::resolver::AthleteResolver;
use tracing::debug;

/// How many years before the requested one are merged in. Small fields can
/// afford more history per athlete.
pub fn lookback_years(athlete_count: usize) -> i32 {
    if athlete_count <= 3 {
        4
    } else {
        1
    }
}

/// Builds one athlete's chronologically sorted result history: the requested
/// year plus up to [`lookback_years`] earlier years.
///
/// Earlier years are fetched only when they appear in the requested year's
/// `active_years`. That list is never replaced by a merged year's list.
/// Cached year entries are copied, never modified.
pub async fn build_window(
    resolver: &AthleteResolver,
    meta: &ApiMetadata,
    id: &str,
    year: i32,
    athlete_count: usize,
) -> Result<Vec<PerformanceRecord>> {
    let current = resolver.year_results(meta, id, year).await?;
    let active_years = current.active_years;
    let mut results = current.results_by_date;

    for back in 1..=lookback_years(athlete_count) {
        let prev_year = year - back;
        if !active_years.contains(&prev_year) {
            continue;
        }
        let prev = resolver.year_results(meta, id, prev_year).await?;
        debug!(
            "Merging {} results from {} for {}",
            prev.results_by_date.len(),
            prev_year,
            id
        );
        let mut merged = prev.results_by_date;
        merged.append(&mut results);
        results = merged;
    }

    // Stable: unparseable dates go first, ties keep provider order.
    results.sort_by_key(|r| r.parsed_date());
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{AthleteCache, MemoryStore};
    use crate::testing::{meta, FakeStats};
    use std::sync::Arc;

    async fn resolver(stats: Arc<FakeStats>) -> AthleteResolver {
        let cache = AthleteCache::load(Arc::new(MemoryStore::default()))
            .await
            .unwrap();
        AthleteResolver::new(stats, cache)
    }

    fn history() -> FakeStats {
        FakeStats::new()
            .with_year("7", 2023, &[2022, 2021, 2020], &[("10 JUN 2023", "800 Metres", "1:43.10")])
            .with_year(
                "7",
                2022,
                &[2022, 2021, 2020, 2019],
                &[("20 AUG 2022", "800 Metres", "1:44.00"), ("01 MAY 2022", "800 Metres", "1:45.50")],
            )
            .with_year("7", 2021, &[2021], &[("05 JUL 2021", "1500 Metres", "3:35.00")])
            .with_year("7", 2020, &[2020], &[("14 AUG 2020", "800 Metres", "1:46.20")])
            .with_year("7", 2019, &[2019], &[("01 JUN 2019", "800 Metres", "1:47.00")])
    }

    #[test]
    fn lookback_depends_on_field_size() {
        assert_eq!(lookback_years(1), 4);
        assert_eq!(lookback_years(3), 4);
        assert_eq!(lookback_years(4), 1);
        assert_eq!(lookback_years(25), 1);
    }

    #[tokio::test]
    async fn large_field_merges_only_the_previous_year() {
        let stats = Arc::new(history());
        let resolver = resolver(stats.clone()).await;

        let results = build_window(&resolver, &meta(), "7", 2023, 4).await.unwrap();

        let dates: Vec<&str> = results.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["01 MAY 2022", "20 AUG 2022", "10 JUN 2023"]);
        assert_eq!(
            stats.year_calls(),
            vec![("7".to_string(), 2023), ("7".to_string(), 2022)]
        );
    }

    #[tokio::test]
    async fn small_field_checks_the_original_active_years_only() {
        let stats = Arc::new(history());
        let resolver = resolver(stats.clone()).await;

        let results = build_window(&resolver, &meta(), "7", 2023, 2).await.unwrap();

        // 2019 is active according to 2022's list but not 2023's
        let years: Vec<i32> = stats.year_calls().into_iter().map(|(_, y)| y).collect();
        assert_eq!(years, vec![2023, 2022, 2021, 2020]);
        assert_eq!(results.len(), 5);
        assert_eq!(results.first().unwrap().date, "14 AUG 2020");
        assert_eq!(results.last().unwrap().date, "10 JUN 2023");
    }

    #[tokio::test]
    async fn merging_does_not_touch_cached_years() {
        let stats = Arc::new(history());
        let resolver = resolver(stats.clone()).await;

        build_window(&resolver, &meta(), "7", 2023, 4).await.unwrap();
        let cached = resolver.cache().year("7", 2023).await.unwrap();

        assert_eq!(cached.results_by_date.len(), 1);
    }

    #[tokio::test]
    async fn missing_requested_year_probes_two_previous_years() {
        let stats = Arc::new(history());
        let resolver = resolver(stats.clone()).await;

        let results = build_window(&resolver, &meta(), "7", 2024, 2).await.unwrap();

        let years: Vec<i32> = stats.year_calls().into_iter().map(|(_, y)| y).collect();
        assert_eq!(years, vec![2024, 2023, 2022]);
        assert_eq!(results.len(), 3);
    }
}
