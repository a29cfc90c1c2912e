//! Serialisable snapshot handed to the shell on every render.

use serde::{Deserialize, Serialize};

use crate::carousel::{Carousel, CarouselPhase};
use crate::comments::{Comment, CommentThread, ThreadStatus};
use crate::composer::{ComposerStage, EventComposer};
use crate::detail::EventDetail;
use crate::event::Page;
use crate::favorites::FavoriteSet;
use crate::feed::FeedFilters;
use crate::mapper::{format_short_date, CategoryOption, EventRecord};
use crate::model::{LoadStatus, Model};
use crate::{
    ToastView, UserFacingError, DETAIL_LOAD_FAILED_MESSAGE, MISSING_EVENT_ID_MESSAGE,
    NO_COMMENTS_MESSAGE, NO_EVENTS_MESSAGE, NO_RELATED_MESSAGE,
};

const CATEGORIES_UNAVAILABLE: &str = "Categories unavailable";
const COMMENTS_LOAD_FAILED: &str = "Failed to load comments.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCard {
    pub uuid: String,
    pub title: String,
    pub description: String,
    pub date_text: String,
    pub location: String,
    pub category: String,
    pub image: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_favorite: bool,
}

impl EventCard {
    #[must_use]
    pub fn new(record: &EventRecord, favorites: &FavoriteSet) -> Self {
        Self {
            uuid: record.uuid.to_string(),
            title: record.title.clone(),
            description: record.description.clone(),
            date_text: format_short_date(record.date.as_deref()),
            location: record.location.clone(),
            category: record.category_display.clone(),
            image: record.image.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            is_favorite: favorites.contains(record.uuid.as_str()),
        }
    }
}

fn cards(records: &[EventRecord], favorites: &FavoriteSet) -> Vec<EventCard> {
    records
        .iter()
        .map(|record| EventCard::new(record, favorites))
        .collect()
}

/// The visible page of a carousel. `show_navigation` is false when every
/// item fits on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarouselView<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub page_count: usize,
    pub phase: CarouselPhase,
    pub show_navigation: bool,
}

impl<T> CarouselView<T> {
    fn build<S>(carousel: &Carousel<S>, map: impl Fn(&S) -> T) -> Self {
        Self {
            items: carousel.current_items().iter().map(map).collect(),
            current_page: carousel.current_page(),
            page_count: carousel.page_count(),
            phase: carousel.phase(),
            show_navigation: carousel.can_rotate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedView {
    pub status: LoadStatus,
    pub cards: Vec<EventCard>,
    pub show_see_more: bool,
    pub empty_message: Option<String>,
    pub filters: FeedFilters,
    pub favorite_count: usize,
    pub show_favorite_badge: bool,
    pub categories: Vec<CategoryOption>,
    pub categories_enabled: bool,
    pub categories_placeholder: Option<String>,
}

impl FeedView {
    fn build(model: &Model) -> Self {
        let cards = cards(model.feed.visible_slice(), &model.favorites);
        let empty_message = (model.feed_status == LoadStatus::Ready && cards.is_empty())
            .then(|| NO_EVENTS_MESSAGE.to_string());
        let categories_failed = matches!(model.categories_status, LoadStatus::Failed { .. });
        Self {
            status: model.feed_status.clone(),
            show_see_more: model.feed.has_more(),
            cards,
            empty_message,
            filters: model.feed.filters().clone(),
            favorite_count: model.favorites.count(),
            show_favorite_badge: !model.favorites.is_empty(),
            categories: model.categories.clone(),
            categories_enabled: !categories_failed,
            categories_placeholder: categories_failed.then(|| CATEGORIES_UNAVAILABLE.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeView {
    pub hero: CarouselView<usize>,
    pub status: LoadStatus,
    pub sports: Vec<EventCard>,
    pub show_see_more: bool,
    pub new_events: CarouselView<EventCard>,
}

impl HomeView {
    fn build(model: &Model) -> Self {
        Self {
            hero: CarouselView::build(&model.hero, |slide| *slide),
            status: model.sports_status.clone(),
            sports: cards(model.sports.visible_slice(), &model.favorites),
            show_see_more: model.sports.has_more(),
            new_events: CarouselView::build(&model.new_events, |record| {
                EventCard::new(record, &model.favorites)
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub author_name: String,
    pub initials: String,
    pub content: String,
    pub time_text: String,
    pub pending: bool,
}

impl From<&Comment> for CommentView {
    fn from(c: &Comment) -> Self {
        Self {
            author_name: c.author_name.clone(),
            initials: c.initials(),
            content: c.content.clone(),
            time_text: c.time_text(),
            pending: c.pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentsView {
    pub is_loading: bool,
    pub comments: Vec<CommentView>,
    pub empty_message: Option<String>,
    pub error: Option<String>,
    pub can_post: bool,
    pub is_posting: bool,
}

impl CommentsView {
    fn build(thread: &CommentThread, has_event_id: bool) -> Self {
        if !has_event_id {
            return Self {
                is_loading: false,
                comments: Vec::new(),
                empty_message: None,
                error: Some(MISSING_EVENT_ID_MESSAGE.to_string()),
                can_post: false,
                is_posting: false,
            };
        }

        let comments: Vec<CommentView> = thread.sorted().into_iter().map(CommentView::from).collect();
        let error = match thread.status() {
            ThreadStatus::Failed { .. } => Some(COMMENTS_LOAD_FAILED.to_string()),
            _ => None,
        };
        let empty_message = (*thread.status() == ThreadStatus::Ready && comments.is_empty())
            .then(|| NO_COMMENTS_MESSAGE.to_string());
        Self {
            is_loading: *thread.status() == ThreadStatus::Loading,
            comments,
            empty_message,
            error,
            can_post: !thread.is_posting(),
            is_posting: thread.is_posting(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailView {
    pub status: LoadStatus,
    pub event: Option<EventDetail>,
    pub message: Option<String>,
    pub related: CarouselView<EventCard>,
    pub related_message: Option<String>,
    pub comments: CommentsView,
}

impl DetailView {
    fn build(model: &Model) -> Self {
        let event = model
            .selected
            .as_ref()
            .map(|selected| EventDetail::build(selected, model.page_url.as_deref()));
        let has_event_id = event.as_ref().is_some_and(|e| e.uuid.is_some());
        let message = matches!(model.detail_status, LoadStatus::Failed { .. })
            .then(|| DETAIL_LOAD_FAILED_MESSAGE.to_string());
        let related_message = match model.related_status {
            LoadStatus::Empty | LoadStatus::Failed { .. } => Some(NO_RELATED_MESSAGE.to_string()),
            _ => None,
        };
        Self {
            status: model.detail_status.clone(),
            related: CarouselView::build(&model.related, |record| {
                EventCard::new(record, &model.favorites)
            }),
            related_message,
            comments: CommentsView::build(&model.comments, has_event_id),
            message,
            event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposerView {
    pub is_open: bool,
    pub stage: ComposerStage,
    pub is_submitting: bool,
    pub image_preview: Option<String>,
    pub error: Option<String>,
    pub success_visible: bool,
}

impl From<&EventComposer> for ComposerView {
    fn from(composer: &EventComposer) -> Self {
        Self {
            is_open: composer.is_open(),
            stage: composer.stage(),
            is_submitting: composer.is_submitting(),
            image_preview: composer.image().map(|i| i.file_name.clone()),
            error: composer.error().map(str::to_string),
            success_visible: composer.success_visible(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub page: Option<Page>,
    pub home: HomeView,
    pub feed: FeedView,
    pub detail: DetailView,
    pub composer: ComposerView,
    pub toast: Option<ToastView>,
    pub error: Option<UserFacingError>,
    /// Set when the shell should navigate, e.g. to the detail page after an
    /// event was selected. Acknowledged with `Event::NavigationHandled`.
    pub navigate_to: Option<Page>,
}

impl ViewModel {
    #[must_use]
    pub fn build(model: &Model) -> Self {
        Self {
            page: model.page,
            home: HomeView::build(model),
            feed: FeedView::build(model),
            detail: DetailView::build(model),
            composer: ComposerView::from(&model.composer),
            toast: model.toast.as_ref().map(ToastView::from),
            error: model.active_error.as_ref().map(UserFacingError::from),
            navigate_to: model.navigate_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::ApiComment;
    use crate::detail::SelectedEvent;
    use crate::mapper::{map_event, ApiEvent};

    fn record(uuid: &str) -> EventRecord {
        map_event(&ApiEvent {
            uuid: Some(uuid.into()),
            name: Some(format!("Event {uuid}")),
            created_at: Some("2025-03-01T10:00:00Z".into()),
            ..ApiEvent::default()
        })
    }

    mod feed_view_tests {
        use super::*;

        #[test]
        fn test_card_marks_favorites_and_formats_date() {
            let mut favorites = FavoriteSet::default();
            favorites.toggle("a");
            let card = EventCard::new(&record("a"), &favorites);
            assert!(card.is_favorite);
            assert_eq!(card.date_text, "March 1, 2025");
            assert_eq!(card.category, "Uncategorized");
        }

        #[test]
        fn test_empty_message_only_after_load() {
            let mut model = Model::default();
            assert!(ViewModel::build(&model).feed.empty_message.is_none());

            model.feed_status = LoadStatus::Ready;
            let view = ViewModel::build(&model);
            assert_eq!(view.feed.empty_message.as_deref(), Some(NO_EVENTS_MESSAGE));
            assert!(!view.feed.show_see_more);
        }

        #[test]
        fn test_badge_hidden_when_no_favorites() {
            let mut model = Model::default();
            assert!(!ViewModel::build(&model).feed.show_favorite_badge);
            model.favorites.toggle("a");
            let view = ViewModel::build(&model);
            assert!(view.feed.show_favorite_badge);
            assert_eq!(view.feed.favorite_count, 1);
        }

        #[test]
        fn test_failed_categories_disable_filter() {
            let mut model = Model::default();
            model.categories_status = LoadStatus::Failed {
                message: "offline".into(),
            };
            let view = ViewModel::build(&model);
            assert!(!view.feed.categories_enabled);
            assert_eq!(
                view.feed.categories_placeholder.as_deref(),
                Some(CATEGORIES_UNAVAILABLE)
            );
        }
    }

    mod detail_view_tests {
        use super::*;

        #[test]
        fn test_missing_event_id_blocks_comments() {
            let mut model = Model::default();
            model.selected = Some(SelectedEvent {
                title: Some("Derby".into()),
                ..SelectedEvent::default()
            });
            let view = ViewModel::build(&model);
            assert_eq!(
                view.detail.comments.error.as_deref(),
                Some(MISSING_EVENT_ID_MESSAGE)
            );
            assert!(!view.detail.comments.can_post);
        }

        #[test]
        fn test_empty_thread_invites_first_comment() {
            let mut model = Model::default();
            model.selected = Some(SelectedEvent::from(&record("a")));
            let ticket = model.comments.begin_load("a");
            model.comments.finish_load(ticket, Ok(Vec::<ApiComment>::new()));
            let view = ViewModel::build(&model);
            assert_eq!(
                view.detail.comments.empty_message.as_deref(),
                Some(NO_COMMENTS_MESSAGE)
            );
        }

        #[test]
        fn test_failed_detail_shows_message() {
            let mut model = Model::default();
            model.detail_status = LoadStatus::Failed {
                message: "missing".into(),
            };
            let view = ViewModel::build(&model);
            assert!(view.detail.event.is_none());
            assert_eq!(view.detail.message.as_deref(), Some(DETAIL_LOAD_FAILED_MESSAGE));
        }

        #[test]
        fn test_related_page_and_navigation() {
            let mut model = Model::default();
            model
                .related
                .set_items((0..6).map(|i| record(&format!("r{i}"))).collect());
            let view = ViewModel::build(&model);
            assert_eq!(view.detail.related.items.len(), 4);
            assert_eq!(view.detail.related.page_count, 2);
            assert!(view.detail.related.show_navigation);

            model.related_status = LoadStatus::Empty;
            model.related.set_items(Vec::new());
            let view = ViewModel::build(&model);
            assert!(!view.detail.related.show_navigation);
            assert_eq!(view.detail.related_message.as_deref(), Some(NO_RELATED_MESSAGE));
        }
    }
}
