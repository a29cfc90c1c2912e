use crux_core::App as _;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::capabilities::http::{
    decode, get_json, json_body, post_json, post_multipart, Endpoint, GatewayError, GatewayResult,
    MultipartBody, NewEventRequest,
};
use crate::capabilities::kv::{self, StorageKey, StoredValue};
use crate::capabilities::timer::{TimerCommand, TimerOutput, TimerOwner};
use crate::capabilities::Capabilities;
use crate::comments::CommentThread;
use crate::composer::Submission;
use crate::config::AppConfig;
use crate::detail::{pick_related, SelectedEvent};
use crate::event::{Event, Page};
use crate::favorites::FavoriteSet;
use crate::feed::FilterPatch;
use crate::mapper::{category_options, map_events, EventRecord};
use crate::model::{LoadStatus, Model};
use crate::view::ViewModel;
use crate::{ToastKind, ValidationError, DETAIL_LOAD_FAILED_MESSAGE};

#[derive(Default)]
pub struct App;

impl App {
    fn run_timers(commands: Vec<TimerCommand>, caps: &Capabilities) {
        for command in commands {
            match command {
                TimerCommand::Schedule { id, after_ms } => {
                    caps.timer
                        .schedule(id, after_ms, move |output| Event::TimerFired { id, output });
                }
                TimerCommand::Cancel { id } => caps.timer.cancel(id),
            }
        }
    }

    fn endpoint_url(config: &AppConfig, endpoint: &Endpoint) -> GatewayResult<Url> {
        let base = config.base_url()?;
        endpoint.url(&base)
    }

    /// Issues a GET. A request that cannot even be built is reported through
    /// the same event a failed response would produce.
    fn fetch<T, F>(&self, endpoint: &Endpoint, model: &mut Model, caps: &Capabilities, make_event: F)
    where
        T: DeserializeOwned + 'static,
        F: FnOnce(GatewayResult<T>) -> Event + Send + 'static,
    {
        match Self::endpoint_url(&model.config, endpoint) {
            Ok(url) => get_json(&caps.http, &url, make_event),
            Err(e) => {
                warn!(endpoint = endpoint.name(), error = %e, "could not build request");
                self.update(make_event(Err(e)), model, caps);
            }
        }
    }

    fn post<F>(
        &self,
        endpoint: &Endpoint,
        body: GatewayResult<Vec<u8>>,
        model: &mut Model,
        caps: &Capabilities,
        make_event: F,
    ) where
        F: FnOnce(GatewayResult<Vec<u8>>) -> Event + Send + 'static,
    {
        match Self::endpoint_url(&model.config, endpoint).and_then(|url| body.map(|b| (url, b))) {
            Ok((url, body)) => post_json(&caps.http, &url, body, make_event),
            Err(e) => {
                warn!(endpoint = endpoint.name(), error = %e, "could not build request");
                self.update(make_event(Err(e)), model, caps);
            }
        }
    }

    fn upload(&self, body: MultipartBody, model: &mut Model, caps: &Capabilities) {
        let make_event =
            |result: GatewayResult<Vec<u8>>| Event::ImageUploaded(result.and_then(|b| decode(&b)));
        match Self::endpoint_url(&model.config, &Endpoint::Upload) {
            Ok(url) => post_multipart(&caps.http, &url, body, make_event),
            Err(e) => self.update(make_event(Err(e)), model, caps),
        }
    }

    fn fetch_events(&self, model: &mut Model, caps: &Capabilities) {
        let ticket = model.events_fence.issue();
        model.feed_status = LoadStatus::Loading;
        self.fetch(&Endpoint::Events, model, caps, move |result| {
            Event::EventsFetched { ticket, result }
        });
    }

    fn fetch_categories(&self, model: &mut Model, caps: &Capabilities) {
        let ticket = model.categories_fence.issue();
        model.categories_status = LoadStatus::Loading;
        self.fetch(&Endpoint::Categories, model, caps, move |result| {
            Event::CategoriesFetched { ticket, result }
        });
    }

    fn fetch_sports(&self, model: &mut Model, caps: &Capabilities) {
        let ticket = model.sports_fence.issue();
        model.sports_status = LoadStatus::Loading;
        self.fetch(&Endpoint::Sports, model, caps, move |result| {
            Event::SportsFetched { ticket, result }
        });
    }

    fn fetch_related(&self, model: &mut Model, caps: &Capabilities) {
        let ticket = model.related_fence.issue();
        model.related_status = LoadStatus::Loading;
        self.fetch(&Endpoint::Sports, model, caps, move |result| {
            Event::RelatedFetched { ticket, result }
        });
    }

    fn fetch_comments(&self, uuid: &str, model: &mut Model, caps: &Capabilities) {
        let ticket = model.comments.begin_load(uuid);
        self.fetch(
            &Endpoint::EventComments(uuid.to_string()),
            model,
            caps,
            move |result| Event::CommentsFetched { ticket, result },
        );
    }

    fn restore_favorites(model: &Model, caps: &Capabilities) {
        if !model.favorites_restored {
            kv::read(&caps.key_value, StorageKey::Favorites, Event::FavoritesRestored);
        }
    }

    fn persist_favorites(model: &Model, caps: &Capabilities) {
        kv::write(
            &caps.key_value,
            StorageKey::Favorites,
            model.favorites.to_bytes(),
            |result| Event::StorageWritten {
                key: StorageKey::Favorites,
                result,
            },
        );
    }

    /// Hands the event to the detail page and asks the shell to navigate there.
    fn select_event(record: &EventRecord, model: &mut Model, caps: &Capabilities) {
        let selected = SelectedEvent::from(record);
        if let Some(bytes) = kv::encode(StorageKey::SelectedEvent, &selected) {
            kv::write(&caps.key_value, StorageKey::SelectedEvent, bytes, |result| {
                Event::StorageWritten {
                    key: StorageKey::SelectedEvent,
                    result,
                }
            });
        }
        info!(uuid = %record.uuid, "event selected");
        model.selected = Some(selected);
        model.navigate_to = Some(Page::Detail);
    }

    fn show_detail(&self, selected: SelectedEvent, model: &mut Model, caps: &Capabilities) {
        let uuid = selected.uuid().map(str::to_string);
        model.selected = Some(selected);
        model.detail_status = LoadStatus::Ready;

        match uuid {
            Some(uuid) => self.fetch_comments(&uuid, model, caps),
            None => {
                warn!("selected event has no uuid, comments unavailable");
                model.comments = CommentThread::default();
            }
        }
        self.fetch_related(model, caps);
    }

    fn toast(model: &mut Model, caps: &Capabilities, message: impl Into<String>, kind: ToastKind) {
        let command = model.show_toast(message, kind);
        Self::run_timers(vec![command], caps);
    }

    fn enter_page(page: Page, model: &mut Model, caps: &Capabilities) {
        info!(?page, "page opened");
        model.page = Some(page);
        model.navigate_to = None;
        Self::run_timers(model.stop_all_carousels(), caps);
        Self::restore_favorites(model, caps);
    }

    fn send_create(&self, request: &NewEventRequest, model: &mut Model, caps: &Capabilities) {
        info!(name = %request.name, "creating event");
        self.post(&Endpoint::Events, json_body(request), model, caps, |result| {
            Event::EventCreated(result.map(|_| ()))
        });
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        if event.is_user_initiated() {
            debug!(event = event.name(), "user action");
        } else {
            debug!(event = event.name(), "event");
        }

        match event {
            Event::Noop => return,

            Event::Configure(config) => match config.validate() {
                Ok(()) => {
                    info!(api = %config.api_base_url, "configuration applied");
                    Self::run_timers(model.reconfigure(config), caps);
                    let reopen = match model.page {
                        Some(Page::Home) => Some(Event::HomeOpened),
                        Some(Page::Events) => Some(Event::EventsPageOpened),
                        Some(Page::Detail) => Some(Event::DetailOpened {
                            page_url: model.page_url.clone(),
                        }),
                        None => None,
                    };
                    if let Some(reopen) = reopen {
                        self.update(reopen, model, caps);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "configuration rejected");
                    model.set_error(e.into());
                }
            },

            // --- Pages ---
            Event::HomeOpened => {
                Self::enter_page(Page::Home, model, caps);
                let slides: Vec<usize> = (0..model.config.hero_slide_count).collect();
                Self::run_timers(model.hero.set_items(slides), caps);
                Self::run_timers(model.hero.start_auto_play(), caps);
                self.fetch_sports(model, caps);
            }

            Event::EventsPageOpened => {
                Self::enter_page(Page::Events, model, caps);
                self.fetch_events(model, caps);
                self.fetch_categories(model, caps);
            }

            Event::DetailOpened { page_url } => {
                Self::enter_page(Page::Detail, model, caps);
                model.page_url = page_url;
                model.detail_status = LoadStatus::Loading;
                kv::read(
                    &caps.key_value,
                    StorageKey::SelectedEvent,
                    Event::SelectedEventRestored,
                );
            }

            Event::NavigationHandled => {
                model.navigate_to = None;
            }

            // --- Feed ---
            Event::CategorySelected(category) => {
                model
                    .feed
                    .set_filter(FilterPatch::category(category), &model.favorites);
            }

            Event::SearchChanged(term) => {
                model.feed.set_filter(FilterPatch::search(term), &model.favorites);
            }

            Event::FavoritesOnlyToggled => {
                let enabled = !model.feed.filters().favorites_only;
                model
                    .feed
                    .set_filter(FilterPatch::favorites_only(enabled), &model.favorites);
            }

            Event::FavoriteToggled { uuid } => {
                if !model.favorites_restored {
                    debug!(uuid = %uuid, "favorites not restored yet, ignoring toggle");
                    return;
                }
                if model.feed.find(&uuid).is_none() {
                    warn!(uuid = %uuid, "cannot favorite an event that is not loaded");
                    return;
                }
                let now_favorite = model.favorites.toggle(&uuid);
                info!(uuid = %uuid, favorite = now_favorite, "favorite toggled");
                if model.feed.filters().favorites_only {
                    model.feed.refilter(&model.favorites);
                }
                Self::persist_favorites(model, caps);
            }

            Event::SeeMoreRequested => model.feed.load_more(),

            Event::EventSelected { uuid } => match model.feed.find(&uuid).cloned() {
                Some(record) => Self::select_event(&record, model, caps),
                None => {
                    warn!(uuid = %uuid, "selected event is not in the feed");
                    return;
                }
            },

            // --- Home ---
            Event::SportsSeeMoreRequested => model.sports.load_more(),

            Event::SportSelected { uuid } => {
                let record = model.sports.find(&uuid).cloned().or_else(|| {
                    model
                        .new_events
                        .items()
                        .iter()
                        .find(|r| r.uuid.as_str() == uuid)
                        .cloned()
                });
                match record {
                    Some(record) => Self::select_event(&record, model, caps),
                    None => {
                        warn!(uuid = %uuid, "selected sport event is not loaded");
                        return;
                    }
                }
            }

            // --- Carousels ---
            Event::CarouselNext(id) => Self::run_timers(model.carousel_mut(id).next(), caps),
            Event::CarouselPrev(id) => Self::run_timers(model.carousel_mut(id).prev(), caps),
            Event::CarouselGoTo { carousel, page } => {
                Self::run_timers(model.carousel_mut(carousel).go_to(page), caps);
            }
            Event::CarouselHoverStarted(id) => {
                Self::run_timers(model.carousel_mut(id).hover_enter(), caps);
            }
            Event::CarouselHoverEnded(id) => {
                Self::run_timers(model.carousel_mut(id).hover_leave(), caps);
            }
            Event::CarouselTransitionEnded(id) => model.carousel_mut(id).finish_transition(),

            // --- Detail ---
            Event::RelatedEventSelected { uuid } => {
                let record = model
                    .related
                    .items()
                    .iter()
                    .find(|r| r.uuid.as_str() == uuid)
                    .cloned();
                match record {
                    Some(record) => Self::select_event(&record, model, caps),
                    None => {
                        warn!(uuid = %uuid, "related event is not loaded");
                        return;
                    }
                }
            }

            Event::CommentSubmitted { text } => {
                if model.comments.is_posting() {
                    debug!("comment already being posted");
                    return;
                }
                match model.comments.prepare_post(&text) {
                    Ok(request) => {
                        model
                            .comments
                            .begin_post(&request, model.config.optimistic_comments);
                        self.post(&Endpoint::Comments, json_body(&request), model, caps, |result| {
                            Event::CommentPosted(result.map(|_| ()))
                        });
                    }
                    Err(ValidationError::EmptyComment) => Self::toast(
                        model,
                        caps,
                        "Please enter a comment before posting.",
                        ToastKind::Error,
                    ),
                    Err(ValidationError::MissingField { .. }) => Self::toast(
                        model,
                        caps,
                        "Cannot post comment: Event ID is missing.",
                        ToastKind::Error,
                    ),
                    Err(e) => Self::toast(model, caps, e.to_string(), ToastKind::Error),
                }
            }

            Event::CommentPosted(result) => match model.comments.finish_post(result) {
                Ok(()) => {
                    info!("comment posted");
                    Self::toast(model, caps, "Comment posted successfully!", ToastKind::Success);
                    if let Some(uuid) = model.comments.event_uuid().map(str::to_string) {
                        self.fetch_comments(&uuid, model, caps);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "comment post failed");
                    Self::toast(
                        model,
                        caps,
                        format!("Failed to post comment: {}", e.message()),
                        ToastKind::Error,
                    );
                }
            },

            Event::LinkCopied { ok } => {
                if ok {
                    Self::toast(model, caps, "Event link copied to clipboard!", ToastKind::Success);
                } else {
                    Self::toast(model, caps, "Failed to copy link to clipboard.", ToastKind::Error);
                }
            }

            // --- Composer ---
            Event::ComposerOpened => model.composer.open(),
            Event::ComposerClosed => model.composer.close(),

            Event::ComposerImageChosen(file) => {
                let max = model.config.max_upload_bytes;
                if let Err(e) = model.composer.choose_image(file, max) {
                    warn!(error = %e, "image rejected");
                }
            }

            Event::ComposerImageCleared => model.composer.clear_image(),

            Event::ComposerSubmitted(form) => match model.composer.submit(&form) {
                Ok(Submission::Upload(body)) => {
                    info!(bytes = body.bytes.len(), "uploading event image");
                    self.upload(body, model, caps);
                }
                Ok(Submission::Create(request)) => self.send_create(&request, model, caps),
                Err(e) => warn!(error = %e, "event submission rejected"),
            },

            Event::ImageUploaded(result) => match model.composer.on_uploaded(result) {
                Ok(request) => self.send_create(&request, model, caps),
                Err(e) => warn!(error = %e, "image upload failed"),
            },

            Event::EventCreated(result) => match model.composer.on_created(result) {
                Ok(()) => {
                    info!("event created");
                    self.fetch_events(model, caps);
                    if model.page == Some(Page::Events) {
                        self.fetch_categories(model, caps);
                    }
                }
                Err(e) => warn!(error = %e, "event creation failed"),
            },

            Event::SuccessDismissed => model.composer.dismiss_success(),
            Event::ToastDismissed => model.toast = None,
            Event::ErrorDismissed => model.clear_error(),

            // --- Capability responses ---
            Event::FavoritesRestored(stored) => {
                model.favorites = restored_favorites(stored);
                model.favorites_restored = true;
                debug!(count = model.favorites.count(), "favorites restored");
                if model.feed_status == LoadStatus::Ready
                    && model.favorites.retain_known(model.feed.all())
                {
                    Self::persist_favorites(model, caps);
                }
                model.feed.refilter(&model.favorites);
            }

            Event::SelectedEventRestored(stored) => {
                match kv::decode_stored::<SelectedEvent>(StorageKey::SelectedEvent, stored) {
                    Some(selected) => self.show_detail(selected, model, caps),
                    None => {
                        warn!("no selected event to show");
                        model.selected = None;
                        model.comments = CommentThread::default();
                        model.detail_status = LoadStatus::Failed {
                            message: DETAIL_LOAD_FAILED_MESSAGE.to_string(),
                        };
                    }
                }
            }

            Event::StorageWritten { key, result } => {
                match result {
                    Ok(()) => debug!(key = key.as_str(), "stored"),
                    Err(e) => warn!(key = key.as_str(), error = %e, "storage write failed"),
                }
                return;
            }

            Event::EventsFetched { ticket, result } => {
                if !model.events_fence.is_current(ticket) {
                    debug!(ticket, "dropping stale events response");
                    return;
                }
                match result {
                    Ok(list) => {
                        let records = map_events(&list);
                        info!(count = records.len(), "events loaded");
                        model.feed.load(records, &model.favorites);
                        model.feed_status = LoadStatus::Ready;
                        if model.favorites_restored
                            && model.favorites.retain_known(model.feed.all())
                        {
                            info!("pruned favorites of events that no longer exist");
                            Self::persist_favorites(model, caps);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to fetch events");
                        model.feed.load(Vec::new(), &model.favorites);
                        model.feed_status = failed(&e);
                    }
                }
            }

            Event::CategoriesFetched { ticket, result } => {
                if !model.categories_fence.is_current(ticket) {
                    debug!(ticket, "dropping stale categories response");
                    return;
                }
                match result {
                    Ok(list) => {
                        model.categories = category_options(&list);
                        model.categories_status = LoadStatus::Ready;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to fetch sport categories");
                        model.categories.clear();
                        model.categories_status = failed(&e);
                    }
                }
            }

            Event::SportsFetched { ticket, result } => {
                if !model.sports_fence.is_current(ticket) {
                    debug!(ticket, "dropping stale sports response");
                    return;
                }
                match result {
                    Ok(list) => {
                        let records = map_events(&list);
                        info!(count = records.len(), "sports loaded");
                        let newest: Vec<EventRecord> = records
                            .iter()
                            .take(model.config.new_events_count)
                            .cloned()
                            .collect();
                        model.sports_status = if records.is_empty() {
                            LoadStatus::Empty
                        } else {
                            LoadStatus::Ready
                        };
                        model.sports.load(records, &model.favorites);
                        Self::run_timers(model.new_events.set_items(newest), caps);
                        Self::run_timers(model.new_events.start_auto_play(), caps);
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to fetch sports");
                        model.sports.load(Vec::new(), &model.favorites);
                        Self::run_timers(model.new_events.set_items(Vec::new()), caps);
                        model.sports_status = failed(&e);
                    }
                }
            }

            Event::RelatedFetched { ticket, result } => {
                if !model.related_fence.is_current(ticket) {
                    debug!(ticket, "dropping stale related response");
                    return;
                }
                let related = match result {
                    Ok(list) => {
                        let current = model.selected.as_ref().and_then(SelectedEvent::uuid);
                        let picked = pick_related(
                            map_events(&list),
                            current,
                            model.config.related_events_limit,
                            &mut rand::thread_rng(),
                        );
                        model.related_status = if picked.is_empty() {
                            LoadStatus::Empty
                        } else {
                            LoadStatus::Ready
                        };
                        picked
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to fetch related events");
                        model.related_status = failed(&e);
                        Vec::new()
                    }
                };
                Self::run_timers(model.related.set_items(related), caps);
                Self::run_timers(model.related.start_auto_play(), caps);
            }

            Event::CommentsFetched { ticket, result } => {
                if let Err(e) = &result {
                    if !e.is_not_found() {
                        warn!(error = %e, "could not fetch comments");
                    }
                }
                if !model.comments.finish_load(ticket, result) {
                    debug!(ticket, "dropping stale comments response");
                    return;
                }
            }

            Event::TimerFired { id, output } => {
                if output == TimerOutput::Cancelled {
                    debug!(timer = %id, "timer cancelled");
                    return;
                }
                match id.owner {
                    TimerOwner::Toast => model.expire_toast(id.seq),
                    TimerOwner::Carousel(carousel) => {
                        Self::run_timers(model.carousel_mut(carousel).on_timer(id), caps);
                    }
                }
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::build(model)
    }
}

fn restored_favorites(stored: StoredValue) -> FavoriteSet {
    match stored {
        Ok(bytes) => FavoriteSet::load(bytes.as_deref()),
        Err(e) => {
            warn!(error = %e, "could not read favorites");
            FavoriteSet::default()
        }
    }
}

fn failed(e: &GatewayError) -> LoadStatus {
    LoadStatus::Failed {
        message: e.message().to_string(),
    }
}
