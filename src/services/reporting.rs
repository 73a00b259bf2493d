//! Reporting service: stores visitor counts and annotates them with the
//! vacation period, public holiday and special events that coincide with the
//! reported event.

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tokio::sync::Mutex;

use crate::{
    error::AppResult,
    models::{
        category::names,
        event::Event,
        reporting::{ManualReporting, NewReportingEntry, ReportingEntry, SubmitReporting, MANUAL_EVENT_ID},
    },
};

/// Read access to events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Event>>;

    /// Events other than `exclude_id` whose start date is on or before `on_or_before`
    async fn find_overlapping_by_start_date(&self, exclude_id: i32, on_or_before: NaiveDate) -> AppResult<Vec<Event>>;

    /// Events other than `exclude_id` starting exactly at `date` and `time`
    async fn find_by_exact_date_time(&self, exclude_id: i32, date: NaiveDate, time: NaiveTime) -> AppResult<Vec<Event>>;
}

/// Persistence of reporting entries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportingStore: Send + Sync {
    /// Entry with the highest id for the event
    async fn find_latest_by_event_id(&self, event_id: i32) -> AppResult<Option<ReportingEntry>>;

    async fn insert(&self, entry: &NewReportingEntry) -> AppResult<ReportingEntry>;

    async fn update(&self, entry: &ReportingEntry) -> AppResult<ReportingEntry>;
}

/// Annotations detected from the event calendar
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Annotations {
    pub vacation: Option<String>,
    pub holiday: Option<String>,
    pub special: Option<String>,
}

impl Annotations {
    /// Detected values win; caller values fill the gaps
    fn merge(self, vacation: Option<String>, holiday: Option<String>, special: Option<String>) -> Self {
        Self {
            vacation: self.vacation.or(vacation),
            holiday: self.holiday.or(holiday),
            special: self.special.or(special),
        }
    }
}

/// First vacation and holiday whose period covers `date`.
///
/// Candidates are scanned in ascending id order.
pub fn detect_periods(candidates: &[Event], date: NaiveDate) -> (Option<String>, Option<String>) {
    let mut sorted: Vec<&Event> = candidates.iter().filter(|e| e.covers(date)).collect();
    sorted.sort_by_key(|e| e.id);

    let mut vacation = None;
    let mut holiday = None;
    for event in sorted {
        if vacation.is_none() && event.has_category(names::VACATION) {
            vacation = Some(event.title.clone());
        }
        if holiday.is_none() && event.has_category(names::HOLIDAY) {
            holiday = Some(event.title.clone());
        }
        if vacation.is_some() && holiday.is_some() {
            break;
        }
    }
    (vacation, holiday)
}

/// Titles of worship evenings and specials in the same slot, joined by ", "
pub fn detect_special(candidates: &[Event]) -> Option<String> {
    let mut sorted: Vec<&Event> = candidates.iter().collect();
    sorted.sort_by_key(|e| e.id);

    let mut titles: Vec<&str> = Vec::new();
    for event in sorted {
        let flagged = event.has_category(names::WORSHIP_EVENING) || event.has_category(names::SPECIAL);
        let title = event.title.as_str();
        if flagged && !title.is_empty() && !titles.contains(&title) {
            titles.push(title);
        }
    }

    if titles.is_empty() {
        None
    } else {
        Some(titles.join(", "))
    }
}

#[derive(Clone)]
pub struct ReportingService {
    events: Arc<dyn EventStore>,
    entries: Arc<dyn ReportingStore>,
    locks: Arc<Mutex<HashMap<i32, Weak<Mutex<()>>>>>,
}

impl ReportingService {
    pub fn new(events: Arc<dyn EventStore>, entries: Arc<dyn ReportingStore>) -> Self {
        Self {
            events,
            entries,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a visitor count for an event.
    ///
    /// Falls back to a manual row when `event_id` does not resolve.
    pub async fn submit_reporting(&self, data: SubmitReporting) -> AppResult<ReportingEntry> {
        let Some(event) = self.events.get_by_id(data.event_id).await? else {
            tracing::debug!(event_id = data.event_id, "Unknown event, storing manual reporting entry");
            return self.submit_reporting_manual(data.into()).await;
        };

        let detected = self.annotate(&event).await?;
        let annotations = detected.merge(data.vacation, data.holiday, data.special);

        let lock = self.event_lock(event.id).await;
        let result = {
            let _guard = lock.lock().await;
            self.upsert(&event, data.visitor, annotations).await
        };

        let entry = result?;
        tracing::info!(
            event_id = entry.event_id,
            entry_id = entry.id,
            visitor = ?entry.visitor,
            "Reporting stored"
        );
        Ok(entry)
    }

    /// Insert a free-form row; never looks at existing entries or events
    pub async fn submit_reporting_manual(&self, data: ManualReporting) -> AppResult<ReportingEntry> {
        let event_id = match data.event_id {
            None | Some(0) => MANUAL_EVENT_ID,
            Some(id) => id,
        };

        let entry = NewReportingEntry {
            event_id,
            event_title: data.event_title.unwrap_or_default(),
            event_date: data.event_date,
            event_start_time: data.event_start_time,
            visitor: data.visitor,
            vacation: data.vacation,
            holiday: data.holiday,
            special: data.special,
        };

        let created = self.entries.insert(&entry).await?;
        tracing::info!(event_id = created.event_id, entry_id = created.id, "Manual reporting entry created");
        Ok(created)
    }

    async fn annotate(&self, event: &Event) -> AppResult<Annotations> {
        let Some(date) = event.start_date else {
            return Ok(Annotations::default());
        };

        let overlapping = self.events.find_overlapping_by_start_date(event.id, date).await?;
        let (vacation, holiday) = detect_periods(&overlapping, date);

        let special = match event.start_time {
            Some(time) => {
                let same_slot = self.events.find_by_exact_date_time(event.id, date, time).await?;
                detect_special(&same_slot)
            }
            None => None,
        };

        Ok(Annotations { vacation, holiday, special })
    }

    async fn upsert(&self, event: &Event, visitor: Option<i32>, annotations: Annotations) -> AppResult<ReportingEntry> {
        match self.entries.find_latest_by_event_id(event.id).await? {
            Some(mut entry) => {
                entry.event_title = event.title.clone();
                entry.event_date = event.start_date;
                entry.event_start_time = event.start_time;
                entry.visitor = visitor;
                entry.vacation = annotations.vacation;
                entry.holiday = annotations.holiday;
                entry.special = annotations.special;
                self.entries.update(&entry).await
            }
            None => {
                let entry = NewReportingEntry {
                    event_id: event.id,
                    event_title: event.title.clone(),
                    event_date: event.start_date,
                    event_start_time: event.start_time,
                    visitor,
                    vacation: annotations.vacation,
                    holiday: annotations.holiday,
                    special: annotations.special,
                };
                self.entries.insert(&entry).await
            }
        }
    }

    /// Write lock for one event id; entries nobody holds anymore are pruned
    async fn event_lock(&self, event_id: i32) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, weak| weak.strong_count() > 0);

        if let Some(existing) = locks.get(&event_id).and_then(Weak::upgrade) {
            return existing;
        }

        let lock = Arc::new(Mutex::new(()));
        locks.insert(event_id, Arc::downgrade(&lock));
        lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::Category;
    use std::sync::Mutex as StdMutex;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn event(id: i32, title: &str, start: Option<&str>, end: Option<&str>, at: Option<&str>, cats: &[&str]) -> Event {
        Event {
            id,
            title: title.to_string(),
            start_date: start.map(date),
            end_date: end.map(date),
            start_time: at.map(time),
            categories: cats
                .iter()
                .enumerate()
                .map(|(i, name)| Category {
                    id: i as i32 + 1,
                    name: name.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Event and reporting stores backed by vectors
    #[derive(Default)]
    struct MemoryStore {
        events: Vec<Event>,
        entries: StdMutex<Vec<ReportingEntry>>,
    }

    impl MemoryStore {
        fn with_events(events: Vec<Event>) -> Arc<Self> {
            Arc::new(Self { events, ..Default::default() })
        }

        fn entries(&self) -> Vec<ReportingEntry> {
            self.entries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventStore for MemoryStore {
        async fn get_by_id(&self, id: i32) -> AppResult<Option<Event>> {
            Ok(self.events.iter().find(|e| e.id == id).cloned())
        }

        async fn find_overlapping_by_start_date(&self, exclude_id: i32, on_or_before: NaiveDate) -> AppResult<Vec<Event>> {
            Ok(self
                .events
                .iter()
                .filter(|e| e.id != exclude_id && e.start_date.is_some_and(|d| d <= on_or_before))
                .cloned()
                .collect())
        }

        async fn find_by_exact_date_time(&self, exclude_id: i32, date: NaiveDate, time: NaiveTime) -> AppResult<Vec<Event>> {
            Ok(self
                .events
                .iter()
                .filter(|e| e.id != exclude_id && e.start_date == Some(date) && e.start_time == Some(time))
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl ReportingStore for MemoryStore {
        async fn find_latest_by_event_id(&self, event_id: i32) -> AppResult<Option<ReportingEntry>> {
            Ok(self.entries().into_iter().filter(|e| e.event_id == event_id).max_by_key(|e| e.id))
        }

        async fn insert(&self, entry: &NewReportingEntry) -> AppResult<ReportingEntry> {
            let mut entries = self.entries.lock().unwrap();
            let created = entry.clone().with_id(entries.len() as i32 + 1);
            entries.push(created.clone());
            Ok(created)
        }

        async fn update(&self, entry: &ReportingEntry) -> AppResult<ReportingEntry> {
            let mut entries = self.entries.lock().unwrap();
            let slot = entries.iter_mut().find(|e| e.id == entry.id).unwrap();
            *slot = entry.clone();
            Ok(entry.clone())
        }
    }

    fn service(store: &Arc<MemoryStore>) -> ReportingService {
        ReportingService::new(store.clone(), store.clone())
    }

    fn submit(event_id: i32, visitor: Option<i32>) -> SubmitReporting {
        SubmitReporting { event_id, visitor, ..Default::default() }
    }

    #[tokio::test]
    async fn test_event_without_date_gets_caller_values_only() {
        let store = MemoryStore::with_events(vec![
            event(1, "Gottesdienst", None, None, None, &[]),
            event(2, "Sommerferien", Some("2024-07-01"), Some("2024-08-15"), None, &["Ferien"]),
        ]);

        let entry = service(&store)
            .submit_reporting(SubmitReporting {
                event_id: 1,
                visitor: Some(40),
                holiday: Some("Eigene Angabe".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(entry.vacation, None);
        assert_eq!(entry.holiday.as_deref(), Some("Eigene Angabe"));
        assert_eq!(entry.special, None);
    }

    #[tokio::test]
    async fn test_vacation_window_is_inclusive() {
        let store = MemoryStore::with_events(vec![
            event(1, "Herbstferien", Some("2024-10-01"), Some("2024-10-10"), None, &["Ferien"]),
            event(2, "GD first day", Some("2024-10-01"), None, None, &[]),
            event(3, "GD last day", Some("2024-10-10"), None, None, &[]),
            event(4, "GD after", Some("2024-10-11"), None, None, &[]),
        ]);
        let svc = service(&store);

        assert_eq!(svc.submit_reporting(submit(2, None)).await.unwrap().vacation.as_deref(), Some("Herbstferien"));
        assert_eq!(svc.submit_reporting(submit(3, None)).await.unwrap().vacation.as_deref(), Some("Herbstferien"));
        assert_eq!(svc.submit_reporting(submit(4, None)).await.unwrap().vacation, None);
    }

    #[tokio::test]
    async fn test_open_ended_period_and_lowest_id_wins() {
        let store = MemoryStore::with_events(vec![
            event(7, "Pfingstferien", Some("2024-05-20"), None, None, &["Ferien"]),
            event(3, "Osterferien", Some("2024-03-25"), None, None, &["Ferien"]),
            event(5, "Pfingstmontag", Some("2024-05-20"), Some("2024-05-20"), None, &["Feiertag"]),
            event(9, "GD", Some("2024-05-20"), None, None, &[]),
        ]);

        let entry = service(&store).submit_reporting(submit(9, Some(10))).await.unwrap();

        assert_eq!(entry.vacation.as_deref(), Some("Osterferien"));
        assert_eq!(entry.holiday.as_deref(), Some("Pfingstmontag"));
    }

    #[tokio::test]
    async fn test_special_from_same_slot_is_deduplicated() {
        let store = MemoryStore::with_events(vec![
            event(1, "GD", Some("2024-12-24"), None, Some("17:00"), &[]),
            event(2, "Krippenspiel", Some("2024-12-24"), None, Some("17:00"), &["Special"]),
            event(3, "Lobpreis", Some("2024-12-24"), None, Some("17:00"), &["Lobpreisabend"]),
            event(4, "Krippenspiel", Some("2024-12-24"), None, Some("17:00"), &["Special"]),
            event(5, "", Some("2024-12-24"), None, Some("17:00"), &["Special"]),
            event(6, "Other slot", Some("2024-12-24"), None, Some("22:00"), &["Special"]),
            event(7, "Unflagged", Some("2024-12-24"), None, Some("17:00"), &[]),
        ]);

        let entry = service(&store)
            .submit_reporting(SubmitReporting {
                event_id: 1,
                special: Some("ignored".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(entry.special.as_deref(), Some("Krippenspiel, Lobpreis"));
    }

    #[tokio::test]
    async fn test_no_time_means_no_special_detection() {
        let store = MemoryStore::with_events(vec![
            event(1, "GD", Some("2024-12-24"), None, None, &[]),
            event(2, "Krippenspiel", Some("2024-12-24"), None, None, &["Special"]),
        ]);

        let entry = service(&store).submit_reporting(submit(1, None)).await.unwrap();
        assert_eq!(entry.special, None);
    }

    #[tokio::test]
    async fn test_resubmission_updates_latest_entry_in_place() {
        let store = MemoryStore::with_events(vec![event(1, "GD", Some("2024-01-07"), None, None, &[])]);
        let svc = service(&store);

        let first = svc.submit_reporting(submit(1, Some(50))).await.unwrap();
        let second = svc.submit_reporting(submit(1, Some(55))).await.unwrap();

        assert_eq!(first.id, second.id);
        let entries = store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].visitor, Some(55));
    }

    #[tokio::test]
    async fn test_visitor_none_overwrites_and_zero_is_kept() {
        let store = MemoryStore::with_events(vec![event(1, "GD", Some("2024-01-07"), None, None, &[])]);
        let svc = service(&store);

        svc.submit_reporting(submit(1, Some(50))).await.unwrap();
        let cleared = svc.submit_reporting(submit(1, None)).await.unwrap();
        assert_eq!(cleared.visitor, None);

        let zero = svc.submit_reporting(submit(1, Some(0))).await.unwrap();
        assert_eq!(zero.visitor, Some(0));
    }

    #[tokio::test]
    async fn test_unknown_event_falls_back_to_manual_insert() {
        let store = MemoryStore::with_events(vec![]);
        let svc = service(&store);

        let entry = svc.submit_reporting(submit(0, Some(12))).await.unwrap();
        assert_eq!(entry.event_id, MANUAL_EVENT_ID);
        assert_eq!(entry.event_title, "");

        svc.submit_reporting(submit(0, Some(13))).await.unwrap();
        assert_eq!(store.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_manual_submission_never_reads_stores() {
        let mut events = MockEventStore::new();
        events.expect_get_by_id().never();
        let mut entries = MockReportingStore::new();
        entries.expect_find_latest_by_event_id().never();
        entries
            .expect_insert()
            .times(1)
            .withf(|e| e.event_id == MANUAL_EVENT_ID && e.event_title.is_empty() && e.visitor == Some(30))
            .returning(|e| Ok(e.clone().with_id(1)));

        let svc = ReportingService::new(Arc::new(events), Arc::new(entries));
        let entry = svc
            .submit_reporting_manual(ManualReporting {
                visitor: Some(30),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(entry.id, 1);
    }

    #[tokio::test]
    async fn test_manual_submission_keeps_explicit_event_id() {
        let events = MockEventStore::new();
        let mut entries = MockReportingStore::new();
        entries
            .expect_insert()
            .withf(|e| e.event_id == 42 && e.event_title == "Taufe")
            .returning(|e| Ok(e.clone().with_id(3)));

        let svc = ReportingService::new(Arc::new(events), Arc::new(entries));
        let entry = svc
            .submit_reporting_manual(ManualReporting {
                event_id: Some(42),
                event_title: Some("Taufe".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(entry.event_id, 42);
    }

    #[tokio::test]
    async fn test_snapshot_comes_from_event_not_caller() {
        let mut events = MockEventStore::new();
        events
            .expect_get_by_id()
            .returning(|_| Ok(Some(event(4, "Neujahr GD", Some("2025-01-01"), None, Some("10:00"), &[]))));
        events.expect_find_overlapping_by_start_date().returning(|_, _| Ok(vec![]));
        events.expect_find_by_exact_date_time().returning(|_, _, _| Ok(vec![]));

        let mut entries = MockReportingStore::new();
        entries.expect_find_latest_by_event_id().returning(|_| Ok(None));
        entries
            .expect_insert()
            .times(1)
            .withf(|e| e.event_title == "Neujahr GD" && e.event_date == Some(date("2025-01-01")))
            .returning(|e| Ok(e.clone().with_id(8)));
        entries.expect_update().never();

        let svc = ReportingService::new(Arc::new(events), Arc::new(entries));
        let entry = svc
            .submit_reporting(SubmitReporting {
                event_id: 4,
                event_title: Some("caller title".to_string()),
                event_date: Some(date("1999-01-01")),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(entry.event_start_time, Some(time("10:00")));
    }

    #[test]
    fn test_detect_periods_skips_ended_periods() {
        let candidates = vec![
            event(1, "Winterferien", Some("2024-02-01"), Some("2024-02-10"), None, &["Ferien"]),
            event(2, "Einheitstag", Some("2024-10-03"), Some("2024-10-03"), None, &["Feiertag"]),
        ];
        assert_eq!(detect_periods(&candidates, date("2024-10-03")), (None, Some("Einheitstag".to_string())));
        assert_eq!(detect_periods(&candidates, date("2024-10-04")), (None, None));
    }

    #[test]
    fn test_detect_special_empty() {
        assert_eq!(detect_special(&[]), None);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_keep_single_entry() {
        let store = MemoryStore::with_events(vec![event(1, "GD", Some("2024-01-07"), None, None, &[])]);
        let svc = service(&store);

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.submit_reporting(submit(1, Some(n))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.entries().len(), 1);
        assert!(svc.locks.lock().await.values().all(|w| w.strong_count() == 0));
    }

    #[tokio::test]
    async fn test_only_latest_of_several_entries_is_updated() {
        let store = MemoryStore::with_events(vec![
            event(1, "GD", Some("2024-07-14"), None, None, &[]),
            event(2, "Sommerferien", Some("2024-07-01"), Some("2024-08-15"), None, &["Ferien"]),
            event(3, "Tag der Einheit", Some("2024-07-14"), Some("2024-07-14"), None, &["Feiertag"]),
        ]);
        let svc = service(&store);
        for visitor in [5, 6] {
            store
                .insert(&NewReportingEntry {
                    event_id: 1,
                    event_title: "GD".to_string(),
                    visitor: Some(visitor),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let entry = svc
            .submit_reporting(SubmitReporting {
                event_id: 1,
                visitor: Some(77),
                vacation: Some("caller".to_string()),
                holiday: Some("caller".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(entry.id, 2);
        assert_eq!(entry.vacation.as_deref(), Some("Sommerferien"));
        assert_eq!(entry.holiday.as_deref(), Some("Tag der Einheit"));

        let rows: Vec<_> = store.entries().iter().map(|e| (e.id, e.visitor)).collect();
        assert_eq!(rows, vec![(1, Some(5)), (2, Some(77))]);
        assert_eq!(store.entries()[0].vacation, None);
    }

    /// Reporting store whose lookup never completes
    struct StalledEntries {
        entered: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl ReportingStore for StalledEntries {
        async fn find_latest_by_event_id(&self, _event_id: i32) -> AppResult<Option<ReportingEntry>> {
            self.entered.notify_one();
            std::future::pending().await
        }

        async fn insert(&self, entry: &NewReportingEntry) -> AppResult<ReportingEntry> {
            Ok(entry.clone().with_id(1))
        }

        async fn update(&self, entry: &ReportingEntry) -> AppResult<ReportingEntry> {
            Ok(entry.clone())
        }
    }

    #[tokio::test]
    async fn test_aborted_submission_does_not_keep_lock_entry() {
        let events = MemoryStore::with_events(vec![
            event(1, "GD", Some("2024-01-07"), None, None, &[]),
            event(2, "GD", Some("2024-01-14"), None, None, &[]),
        ]);
        let entered = Arc::new(tokio::sync::Notify::new());
        let svc = ReportingService::new(events, Arc::new(StalledEntries { entered: entered.clone() }));

        let stalled = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.submit_reporting(submit(1, Some(3))).await })
        };
        entered.notified().await;
        assert_eq!(svc.locks.lock().await.get(&1).map(Weak::strong_count), Some(1));

        stalled.abort();
        assert!(stalled.await.unwrap_err().is_cancelled());
        assert_eq!(svc.locks.lock().await.get(&1).map(Weak::strong_count), Some(0));

        let _held = svc.event_lock(2).await;
        let locks = svc.locks.lock().await;
        assert!(!locks.contains_key(&1));
        assert!(locks.contains_key(&2));
    }
}
