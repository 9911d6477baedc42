//! Catalog fetching and candidate filtering.

use chrono::{Months, NaiveDate};
use rand::seq::SliceRandom;
use std::{collections::HashSet, sync::Arc};

use crate::{
    models::{CandidateMovie, GenreLookup, MovieSummary},
    services::providers::{CatalogProvider, ProviderError},
};

/// How far ahead a release may be and still count as upcoming
const RELEASE_WINDOW_MONTHS: u32 = 24;

/// Last release date (inclusive) considered upcoming as of `today`
pub fn release_horizon(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_months(Months::new(RELEASE_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MAX)
}

/// Fetches every upcoming release across catalog pages, oldest first.
///
/// Page 1 reports how many pages exist; the rest (up to `max_pages`) are fetched
/// concurrently. Any page failure fails the whole fetch. The genre list is
/// fetched alongside page 1 and attached to every candidate; if it cannot be
/// fetched, genre names fall back to "Unknown".
pub async fn fetch_upcoming(
    catalog: Arc<dyn CatalogProvider>,
    today: NaiveDate,
    max_pages: u32,
) -> Result<Vec<CandidateMovie>, ProviderError> {
    let horizon = release_horizon(today);

    let (first_page, genres) = tokio::join!(
        catalog.upcoming_page(today, horizon, 1),
        catalog.genres()
    );
    let first_page = first_page?;

    let lookup: Option<Arc<GenreLookup>> = match genres {
        Ok(genres) => Some(Arc::new(
            genres.into_iter().map(|genre| (genre.id, genre.name)).collect(),
        )),
        Err(e) => {
            tracing::warn!(error = %e, "Genre list unavailable, genre names will be Unknown");
            None
        }
    };

    let last_page = first_page.total_pages.min(max_pages.max(1));
    let mut summaries: Vec<MovieSummary> = first_page.results;

    let mut tasks = Vec::new();
    for page in 2..=last_page {
        let catalog = catalog.clone();
        tasks.push(tokio::spawn(async move {
            catalog.upcoming_page(today, horizon, page).await
        }));
    }

    for task in tasks {
        match task.await {
            Ok(Ok(page)) => summaries.extend(page.results),
            Ok(Err(e)) => return Err(e),
            Err(e) => {
                return Err(ProviderError::Decode(format!(
                    "Catalog page task failed: {}",
                    e
                )))
            }
        }
    }

    let mut candidates: Vec<CandidateMovie> = summaries
        .into_iter()
        .map(|summary| CandidateMovie::from_summary(summary, lookup.clone()))
        .collect();
    sort_by_release(&mut candidates);

    tracing::info!(
        pages = last_page.max(1),
        fetched = candidates.len(),
        provider = catalog.name(),
        "Upcoming releases fetched"
    );

    Ok(candidates)
}

/// Chronological, undated entries last
fn sort_by_release(candidates: &mut [CandidateMovie]) {
    candidates.sort_by_key(|movie| {
        let day = movie.release_day();
        (day.is_none(), day)
    });
}

/// Keeps the first occurrence of every id
pub fn dedupe_by_id(candidates: Vec<CandidateMovie>) -> Vec<CandidateMovie> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|movie| seen.insert(movie.id))
        .collect()
}

/// Released strictly after `today` and no later than the horizon
pub fn within_release_window(movie: &CandidateMovie, today: NaiveDate) -> bool {
    movie
        .release_day()
        .is_some_and(|day| day > today && day <= release_horizon(today))
}

/// Dedupes, time-boxes and optionally shuffles the fetched catalog
pub fn prepare_candidates(
    fetched: Vec<CandidateMovie>,
    today: NaiveDate,
    shuffle: bool,
) -> Vec<CandidateMovie> {
    let fetched_count = fetched.len();
    let mut candidates: Vec<CandidateMovie> = dedupe_by_id(fetched)
        .into_iter()
        .filter(|movie| within_release_window(movie, today))
        .collect();

    if shuffle {
        candidates.shuffle(&mut rand::thread_rng());
    }

    tracing::info!(
        fetched = fetched_count,
        candidates = candidates.len(),
        "Filtered candidates to release window"
    );

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Genre, TmdbPage};
    use crate::services::providers::MockCatalogProvider;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn movie(id: i64, release_date: &str) -> CandidateMovie {
        CandidateMovie {
            id,
            title: format!("Movie {}", id),
            release_date: release_date.to_string(),
            overview: String::new(),
            genre_ids: vec![],
            genre_names: None,
        }
    }

    fn summary(id: i64, release_date: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: format!("Movie {}", id),
            overview: String::new(),
            poster_path: None,
            release_date: release_date.to_string(),
            vote_average: 0.0,
            genre_ids: vec![28],
        }
    }

    fn page(page: u32, total_pages: u32, results: Vec<MovieSummary>) -> TmdbPage<MovieSummary> {
        TmdbPage {
            page,
            total_results: results.len() as u32,
            results,
            total_pages,
        }
    }

    #[test]
    fn test_release_window_boundaries() {
        let today = day(2024, 1, 1);

        assert!(!within_release_window(&movie(1, "2024-01-01"), today));
        assert!(within_release_window(&movie(2, "2024-01-02"), today));
        assert!(within_release_window(&movie(3, "2026-01-01"), today));
        assert!(!within_release_window(&movie(4, "2026-01-02"), today));
        assert!(!within_release_window(&movie(5, "2023-12-31"), today));
        assert!(!within_release_window(&movie(6, ""), today));
    }

    #[test]
    fn test_release_horizon_leap_day() {
        assert_eq!(release_horizon(day(2024, 2, 29)), day(2026, 2, 28));
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let mut first = movie(500, "2024-06-01");
        first.title = "First".to_string();
        let mut second = movie(500, "2024-07-01");
        second.title = "Second".to_string();

        let deduped = dedupe_by_id(vec![first, movie(501, "2024-06-02"), second]);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, 500);
        assert_eq!(deduped[0].title, "First");
        assert_eq!(deduped[1].id, 501);
    }

    #[test]
    fn test_prepare_candidates_without_shuffle_keeps_order() {
        let today = day(2024, 1, 1);
        let fetched = vec![
            movie(1, "2024-01-01"),
            movie(2, "2024-03-01"),
            movie(2, "2024-03-01"),
            movie(3, "2025-05-05"),
            movie(4, "2030-01-01"),
        ];

        let candidates = prepare_candidates(fetched, today, false);
        let ids: Vec<i64> = candidates.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_prepare_candidates_shuffle_preserves_set() {
        let today = day(2024, 1, 1);
        let fetched: Vec<CandidateMovie> = (1..=20).map(|id| movie(id, "2024-06-01")).collect();

        let candidates = prepare_candidates(fetched, today, true);
        let mut ids: Vec<i64> = candidates.iter().map(|m| m.id).collect();
        ids.sort();
        assert_eq!(ids, (1..=20).collect::<Vec<i64>>());
    }

    #[test]
    fn test_sort_by_release_puts_undated_last() {
        let mut movies = vec![
            movie(1, ""),
            movie(2, "2025-01-01"),
            movie(3, "2024-06-01"),
        ];
        sort_by_release(&mut movies);
        let ids: Vec<i64> = movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_fetch_upcoming_respects_page_cap() {
        let today = day(2024, 1, 1);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_upcoming_page()
            .returning(move |_, _, page| {
                counter.fetch_add(1, Ordering::SeqCst);
                let id = page as i64 * 10;
                Ok(page_of(page, id))
            });
        catalog.expect_genres().returning(|| {
            Ok(vec![Genre {
                id: 28,
                name: "Action".to_string(),
            }])
        });
        catalog.expect_name().return_const("mock");

        fn page_of(page: u32, id: i64) -> TmdbPage<MovieSummary> {
            let date = format!("2024-{:02}-01", 13 - page);
            TmdbPage {
                page,
                results: vec![MovieSummary {
                    id,
                    title: format!("Movie {}", id),
                    overview: String::new(),
                    poster_path: None,
                    release_date: date,
                    vote_average: 0.0,
                    genre_ids: vec![28],
                }],
                total_pages: 40,
                total_results: 40,
            }
        }

        let fetched = fetch_upcoming(Arc::new(catalog), today, 8).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 8);
        assert_eq!(fetched.len(), 8);
        // Later pages carry earlier dates, so sorting reverses page order
        assert_eq!(fetched[0].id, 80);
        assert_eq!(fetched[7].id, 10);
        assert_eq!(fetched[0].genre_labels(), vec!["Action"]);
    }

    #[tokio::test]
    async fn test_fetch_upcoming_stops_at_last_page() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_upcoming_page()
            .times(2)
            .returning(|_, _, p| Ok(page(p, 2, vec![summary(p as i64, "2024-05-01")])));
        catalog.expect_genres().returning(|| Ok(vec![]));
        catalog.expect_name().return_const("mock");

        let fetched = fetch_upcoming(Arc::new(catalog), day(2024, 1, 1), 8)
            .await
            .unwrap();
        assert_eq!(fetched.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_upcoming_page_failure_is_fatal() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_upcoming_page().returning(|_, _, p| {
            if p == 1 {
                Ok(page(1, 3, vec![summary(1, "2024-05-01")]))
            } else {
                Err(ProviderError::Status {
                    status: 500,
                    body: "boom".to_string(),
                })
            }
        });
        catalog.expect_genres().returning(|| Ok(vec![]));
        catalog.expect_name().return_const("mock");

        let result = fetch_upcoming(Arc::new(catalog), day(2024, 1, 1), 8).await;
        assert!(matches!(result, Err(ProviderError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_genre_failure_degrades_to_unknown() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_upcoming_page()
            .returning(|_, _, p| Ok(page(p, 1, vec![summary(7, "2024-05-01")])));
        catalog.expect_genres().returning(|| {
            Err(ProviderError::Status {
                status: 401,
                body: "unauthorized".to_string(),
            })
        });
        catalog.expect_name().return_const("mock");

        let fetched = fetch_upcoming(Arc::new(catalog), day(2024, 1, 1), 8)
            .await
            .unwrap();
        assert_eq!(fetched[0].genre_labels(), vec!["Unknown"]);
    }
}
