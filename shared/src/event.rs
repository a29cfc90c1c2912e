use serde::{Deserialize, Serialize};

use crate::capabilities::http::{GatewayResult, UploadResponse};
use crate::capabilities::kv::{KvError, StorageKey, StoredValue};
use crate::capabilities::timer::{TimerId, TimerOutput};
use crate::carousel::CarouselId;
use crate::comments::ApiComment;
use crate::composer::{EventForm, ImageFile};
use crate::config::AppConfig;
use crate::mapper::{ApiCategory, ApiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    Events,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Noop,
    Configure(AppConfig),

    // --- Page lifecycle ---
    HomeOpened,
    EventsPageOpened,
    /// `page_url` is the address of the detail page, used for share links.
    DetailOpened {
        page_url: Option<String>,
    },
    NavigationHandled,

    // --- Feed (events page) ---
    CategorySelected(String),
    SearchChanged(String),
    FavoritesOnlyToggled,
    FavoriteToggled {
        uuid: String,
    },
    SeeMoreRequested,
    EventSelected {
        uuid: String,
    },

    // --- Home page ---
    SportsSeeMoreRequested,
    SportSelected {
        uuid: String,
    },

    // --- Carousels ---
    CarouselNext(CarouselId),
    CarouselPrev(CarouselId),
    CarouselGoTo {
        carousel: CarouselId,
        page: i64,
    },
    CarouselHoverStarted(CarouselId),
    CarouselHoverEnded(CarouselId),
    CarouselTransitionEnded(CarouselId),

    // --- Detail page ---
    RelatedEventSelected {
        uuid: String,
    },
    CommentSubmitted {
        text: String,
    },
    LinkCopied {
        ok: bool,
    },

    // --- Composer ---
    ComposerOpened,
    ComposerClosed,
    ComposerImageChosen(ImageFile),
    ComposerImageCleared,
    ComposerSubmitted(EventForm),
    SuccessDismissed,

    ToastDismissed,
    ErrorDismissed,

    // --- Capability responses ---
    #[serde(skip)]
    FavoritesRestored(StoredValue),
    #[serde(skip)]
    SelectedEventRestored(StoredValue),
    #[serde(skip)]
    StorageWritten {
        key: StorageKey,
        result: Result<(), KvError>,
    },
    #[serde(skip)]
    EventsFetched {
        ticket: u64,
        result: GatewayResult<Vec<ApiEvent>>,
    },
    #[serde(skip)]
    CategoriesFetched {
        ticket: u64,
        result: GatewayResult<Vec<ApiCategory>>,
    },
    #[serde(skip)]
    SportsFetched {
        ticket: u64,
        result: GatewayResult<Vec<ApiEvent>>,
    },
    #[serde(skip)]
    RelatedFetched {
        ticket: u64,
        result: GatewayResult<Vec<ApiEvent>>,
    },
    #[serde(skip)]
    CommentsFetched {
        ticket: u64,
        result: GatewayResult<Vec<ApiComment>>,
    },
    #[serde(skip)]
    CommentPosted(GatewayResult<()>),
    #[serde(skip)]
    ImageUploaded(GatewayResult<UploadResponse>),
    #[serde(skip)]
    EventCreated(GatewayResult<()>),
    #[serde(skip)]
    TimerFired {
        id: TimerId,
        output: TimerOutput,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::HomeOpened => "home_opened",
            Self::EventsPageOpened => "events_page_opened",
            Self::DetailOpened { .. } => "detail_opened",
            Self::NavigationHandled => "navigation_handled",
            Self::CategorySelected(_) => "category_selected",
            Self::SearchChanged(_) => "search_changed",
            Self::FavoritesOnlyToggled => "favorites_only_toggled",
            Self::FavoriteToggled { .. } => "favorite_toggled",
            Self::SeeMoreRequested => "see_more_requested",
            Self::EventSelected { .. } => "event_selected",
            Self::SportsSeeMoreRequested => "sports_see_more_requested",
            Self::SportSelected { .. } => "sport_selected",
            Self::CarouselNext(_) => "carousel_next",
            Self::CarouselPrev(_) => "carousel_prev",
            Self::CarouselGoTo { .. } => "carousel_go_to",
            Self::CarouselHoverStarted(_) => "carousel_hover_started",
            Self::CarouselHoverEnded(_) => "carousel_hover_ended",
            Self::CarouselTransitionEnded(_) => "carousel_transition_ended",
            Self::RelatedEventSelected { .. } => "related_event_selected",
            Self::CommentSubmitted { .. } => "comment_submitted",
            Self::LinkCopied { .. } => "link_copied",
            Self::ComposerOpened => "composer_opened",
            Self::ComposerClosed => "composer_closed",
            Self::ComposerImageChosen(_) => "composer_image_chosen",
            Self::ComposerImageCleared => "composer_image_cleared",
            Self::ComposerSubmitted(_) => "composer_submitted",
            Self::SuccessDismissed => "success_dismissed",
            Self::ToastDismissed => "toast_dismissed",
            Self::ErrorDismissed => "error_dismissed",
            Self::FavoritesRestored(_) => "favorites_restored",
            Self::SelectedEventRestored(_) => "selected_event_restored",
            Self::StorageWritten { .. } => "storage_written",
            Self::EventsFetched { .. } => "events_fetched",
            Self::CategoriesFetched { .. } => "categories_fetched",
            Self::SportsFetched { .. } => "sports_fetched",
            Self::RelatedFetched { .. } => "related_fetched",
            Self::CommentsFetched { .. } => "comments_fetched",
            Self::CommentPosted(_) => "comment_posted",
            Self::ImageUploaded(_) => "image_uploaded",
            Self::EventCreated(_) => "event_created",
            Self::TimerFired { .. } => "timer_fired",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::CategorySelected(_)
                | Self::SearchChanged(_)
                | Self::FavoritesOnlyToggled
                | Self::FavoriteToggled { .. }
                | Self::SeeMoreRequested
                | Self::EventSelected { .. }
                | Self::SportsSeeMoreRequested
                | Self::SportSelected { .. }
                | Self::CarouselNext(_)
                | Self::CarouselPrev(_)
                | Self::CarouselGoTo { .. }
                | Self::RelatedEventSelected { .. }
                | Self::CommentSubmitted { .. }
                | Self::ComposerOpened
                | Self::ComposerClosed
                | Self::ComposerImageChosen(_)
                | Self::ComposerImageCleared
                | Self::ComposerSubmitted(_)
                | Self::SuccessDismissed
                | Self::ToastDismissed
                | Self::ErrorDismissed
        )
    }
}
