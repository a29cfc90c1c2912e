use serde::{Deserialize, Serialize};

use crate::capabilities::http::RequestFence;
use crate::capabilities::timer::{TimerCommand, TimerId, TimerOwner};
use crate::carousel::{Carousel, CarouselControl, CarouselId};
use crate::comments::CommentThread;
use crate::composer::EventComposer;
use crate::config::AppConfig;
use crate::detail::SelectedEvent;
use crate::event::Page;
use crate::favorites::FavoriteSet;
use crate::feed::FeedState;
use crate::mapper::{CategoryOption, EventRecord};
use crate::{AppError, ToastKind, ToastMessage};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Empty,
    Failed {
        message: String,
    },
}

/// Application state for one page lifetime. Each controller owns its slice
/// of it; nothing lives in globals.
#[derive(Debug)]
pub struct Model {
    pub config: AppConfig,
    pub page: Option<Page>,
    pub page_url: Option<String>,
    pub navigate_to: Option<Page>,

    pub favorites: FavoriteSet,
    pub favorites_restored: bool,

    pub feed: FeedState,
    pub feed_status: LoadStatus,
    pub events_fence: RequestFence,

    pub categories: Vec<CategoryOption>,
    pub categories_status: LoadStatus,
    pub categories_fence: RequestFence,

    pub sports: FeedState,
    pub sports_status: LoadStatus,
    pub sports_fence: RequestFence,

    pub hero: Carousel<usize>,
    pub new_events: Carousel<EventRecord>,
    pub related: Carousel<EventRecord>,
    pub related_status: LoadStatus,
    pub related_fence: RequestFence,

    pub selected: Option<SelectedEvent>,
    pub detail_status: LoadStatus,
    pub comments: CommentThread,

    pub composer: EventComposer,

    pub toast: Option<ToastMessage>,
    pub toast_seq: u64,
    pub active_error: Option<AppError>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Model {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            page: None,
            page_url: None,
            navigate_to: None,
            favorites: FavoriteSet::default(),
            favorites_restored: false,
            feed: FeedState::new(config.feed_initial_count, config.feed_load_more_count),
            feed_status: LoadStatus::Idle,
            events_fence: RequestFence::default(),
            categories: Vec::new(),
            categories_status: LoadStatus::Idle,
            categories_fence: RequestFence::default(),
            sports: FeedState::new(config.sports_page_size, config.sports_page_size),
            sports_status: LoadStatus::Idle,
            sports_fence: RequestFence::default(),
            hero: Carousel::new(CarouselId::Hero, 1, config.hero_interval_ms),
            new_events: Carousel::new(CarouselId::NewEvents, 1, config.new_events_interval_ms),
            related: Carousel::new(
                CarouselId::Related,
                config.related_page_size,
                config.related_interval_ms,
            )
            .with_transitions(),
            related_status: LoadStatus::Idle,
            related_fence: RequestFence::default(),
            selected: None,
            detail_status: LoadStatus::Idle,
            comments: CommentThread::default(),
            composer: EventComposer::default(),
            toast: None,
            toast_seq: 0,
            active_error: None,
            config,
        }
    }

    /// Swaps in a new configuration. Controllers are rebuilt with the new
    /// sizes; favorites, the selected event and the visible toast survive.
    /// The toast sequence carries over so a pending dismissal timer can only
    /// ever match the toast it was scheduled for.
    pub fn reconfigure(&mut self, config: AppConfig) -> Vec<TimerCommand> {
        let commands = self.stop_all_carousels();
        let mut next = Self::new(config);
        next.page = self.page;
        next.page_url = self.page_url.take();
        next.favorites = std::mem::take(&mut self.favorites);
        next.favorites_restored = self.favorites_restored;
        next.selected = self.selected.take();
        next.toast = self.toast.take();
        next.toast_seq = self.toast_seq;
        *self = next;
        commands
    }

    pub fn carousel_mut(&mut self, id: CarouselId) -> &mut dyn CarouselControl {
        match id {
            CarouselId::Hero => &mut self.hero,
            CarouselId::NewEvents => &mut self.new_events,
            CarouselId::Related => &mut self.related,
        }
    }

    pub fn stop_all_carousels(&mut self) -> Vec<TimerCommand> {
        let mut commands = self.hero.stop_auto_play();
        commands.extend(self.new_events.stop_auto_play());
        commands.extend(self.related.stop_auto_play());
        commands
    }

    /// Replaces any visible toast and returns the timer that will dismiss it.
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) -> TimerCommand {
        self.toast_seq += 1;
        self.toast = Some(ToastMessage {
            id: self.toast_seq,
            message: message.into(),
            kind,
            duration_ms: self.config.toast_duration_ms,
        });
        TimerCommand::Schedule {
            id: TimerId::new(TimerOwner::Toast, self.toast_seq),
            after_ms: self.config.toast_duration_ms,
        }
    }

    /// Dismisses the toast the timer was scheduled for, if it is still showing.
    pub fn expire_toast(&mut self, seq: u64) {
        if self.toast.as_ref().is_some_and(|t| t.id == seq) {
            self.toast = None;
        }
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }
}
