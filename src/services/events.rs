//! Events service

use std::{
    cmp::Ordering,
    collections::HashMap,
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, NaiveTime};

use crate::{
    error::{AppError, AppResult},
    models::event::{CreateEvent, Event, EventNode, UpdateEvent},
    repository::Repository,
};

#[derive(Clone)]
pub struct EventsService {
    repository: Repository,
    attachments_dir: PathBuf,
}

impl EventsService {
    pub fn new(repository: Repository, attachments_dir: impl Into<PathBuf>) -> Self {
        Self {
            repository,
            attachments_dir: attachments_dir.into(),
        }
    }

    pub async fn list(&self) -> AppResult<Vec<Event>> {
        self.repository.events.list().await
    }

    /// All events nested under their parents
    pub async fn tree(&self) -> AppResult<Vec<EventNode>> {
        let events = self.repository.events.list().await?;
        Ok(build_event_tree(&events))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Event> {
        self.repository.events.get(id).await
    }

    pub async fn create(&self, data: &CreateEvent) -> AppResult<Event> {
        let event = self.repository.events.create(data).await?;
        tracing::info!(event_id = event.id, title = %event.title, "Event created");
        Ok(event)
    }

    pub async fn update(&self, id: i32, data: &UpdateEvent) -> AppResult<Event> {
        self.repository.events.update(id, data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.events.delete(id).await?;
        tracing::info!(event_id = id, "Event deleted");
        Ok(())
    }

    /// Store (or replace) the single attachment of an event as `event_{id}{ext}`
    pub async fn save_attachment(&self, id: i32, original_name: Option<&str>, content: &[u8]) -> AppResult<Event> {
        // 404 before touching the disk
        self.repository.events.get(id).await?;

        let filename = attachment_filename(id, original_name.unwrap_or("attachment"));
        tokio::fs::create_dir_all(&self.attachments_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Cannot create attachments directory: {}", e)))?;
        tokio::fs::write(self.attachments_dir.join(&filename), content)
            .await
            .map_err(|e| AppError::Internal(format!("Cannot write attachment: {}", e)))?;

        tracing::info!(event_id = id, file = %filename, size = content.len(), "Attachment stored");
        self.repository.events.set_attachment(id, &filename).await
    }
}

/// `event_{id}` plus the extension of the uploaded file name
pub fn attachment_filename(id: i32, original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    format!("event_{}{}", id, ext)
}

fn sort_key(event: &Event, parent: Option<&Event>) -> (NaiveDate, NaiveTime, i32) {
    let date = event
        .start_date
        .or_else(|| parent.and_then(|p| p.start_date))
        .unwrap_or(NaiveDate::MAX);
    let time = event
        .start_time
        .or_else(|| parent.and_then(|p| p.start_time))
        .unwrap_or_else(max_time);
    (date, time, event.id)
}

fn max_time() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or_default()
}

/// Nest events under their parents.
///
/// Roots are events without a parent, ordered by date, time and id with
/// missing values last. Children fall back to the parent's date and time
/// when they have none of their own.
pub fn build_event_tree(events: &[Event]) -> Vec<EventNode> {
    let mut children: HashMap<i32, Vec<&Event>> = HashMap::new();
    let mut roots: Vec<&Event> = Vec::new();
    for event in events {
        match event.parent_id {
            Some(parent_id) => children.entry(parent_id).or_default().push(event),
            None => roots.push(event),
        }
    }

    roots.sort_by(|a, b| compare(a, b, None));
    roots.into_iter().map(|root| build_node(root, &children)).collect()
}

fn compare(a: &Event, b: &Event, parent: Option<&Event>) -> Ordering {
    sort_key(a, parent).cmp(&sort_key(b, parent))
}

fn build_node(event: &Event, children: &HashMap<i32, Vec<&Event>>) -> EventNode {
    let mut node = EventNode::leaf(event);
    if let Some(kids) = children.get(&event.id) {
        let mut kids = kids.clone();
        kids.sort_by(|a, b| compare(a, b, Some(event)));
        node.children = kids.into_iter().map(|child| build_node(child, children)).collect();
    }
    node
}
