use crux_core::testing::AppTester;
use shared::capabilities::timer::{TimerId, TimerOperation, TimerOutput, TimerOwner};
use shared::capabilities::GatewayError;
use shared::carousel::{CarouselId, CarouselPhase};
use shared::event::Page;
use shared::mapper::ApiEvent;
use shared::model::LoadStatus;
use shared::{App, Effect, Event, Model};

fn scheduled(effects: &[Effect]) -> Vec<TimerId> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Timer(request) => match &request.operation {
                TimerOperation::Schedule { id, .. } => Some(*id),
                TimerOperation::Cancel { .. } => None,
            },
            _ => None,
        })
        .collect()
}

fn sports(n: usize) -> Vec<ApiEvent> {
    (0..n)
        .map(|i| ApiEvent {
            uuid: Some(format!("s{i}")),
            name: Some(format!("Sport {i}")),
            ..ApiEvent::default()
        })
        .collect()
}

fn loaded_home(app: &AppTester<App, Effect>, model: &mut Model, n: usize) -> Vec<TimerId> {
    app.update(Event::HomeOpened, model);
    let ticket = model.sports_fence.latest();
    let update = app.update(
        Event::SportsFetched {
            ticket,
            result: Ok(sports(n)),
        },
        model,
    );
    scheduled(&update.effects)
}

#[test]
fn test_home_lists_sports_in_pages_of_eight() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    loaded_home(&app, &mut model, 10);

    let view = app.view(&model);
    assert_eq!(view.page, Some(Page::Home));
    assert_eq!(view.home.status, LoadStatus::Ready);
    assert_eq!(view.home.sports.len(), 8);
    assert!(view.home.show_see_more);

    app.update(Event::SportsSeeMoreRequested, &mut model);
    let view = app.view(&model);
    assert_eq!(view.home.sports.len(), 10);
    assert!(!view.home.show_see_more);
}

#[test]
fn test_new_events_rotator_takes_first_five() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let timers = loaded_home(&app, &mut model, 10);

    assert!(timers
        .iter()
        .any(|id| id.owner == TimerOwner::Carousel(CarouselId::NewEvents)));
    assert_eq!(model.new_events.items().len(), 5);

    let rotator = app.view(&model).home.new_events;
    assert_eq!(rotator.items.len(), 1);
    assert_eq!(rotator.items[0].uuid, "s0");
    assert_eq!(rotator.page_count, 5);
}

#[test]
fn test_rotator_tick_advances_and_reschedules() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let timers = loaded_home(&app, &mut model, 3);
    let tick = timers
        .into_iter()
        .find(|id| id.owner == TimerOwner::Carousel(CarouselId::NewEvents))
        .unwrap();

    let update = app.update(
        Event::TimerFired {
            id: tick,
            output: TimerOutput::Fired,
        },
        &mut model,
    );

    assert_eq!(model.new_events.current_page(), 1);
    assert_eq!(scheduled(&update.effects).len(), 1);
}

#[test]
fn test_cancelled_tick_changes_nothing() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let hero = scheduled(&app.update(Event::HomeOpened, &mut model).effects)[0];

    let update = app.update(
        Event::TimerFired {
            id: hero,
            output: TimerOutput::Cancelled,
        },
        &mut model,
    );

    assert!(update.effects.is_empty());
    assert_eq!(model.hero.current_page(), 0);
}

#[test]
fn test_hero_hover_pauses_auto_play() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::HomeOpened, &mut model);
    assert_eq!(app.view(&model).home.hero.phase, CarouselPhase::AutoPlaying);

    app.update(Event::CarouselHoverStarted(CarouselId::Hero), &mut model);
    assert_eq!(app.view(&model).home.hero.phase, CarouselPhase::Idle);

    let update = app.update(Event::CarouselHoverEnded(CarouselId::Hero), &mut model);
    assert_eq!(scheduled(&update.effects).len(), 1);
    assert_eq!(app.view(&model).home.hero.phase, CarouselPhase::AutoPlaying);
}

#[test]
fn test_hero_dot_navigation_wraps() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::HomeOpened, &mut model);

    app.update(
        Event::CarouselGoTo {
            carousel: CarouselId::Hero,
            page: 2,
        },
        &mut model,
    );
    assert_eq!(app.view(&model).home.hero.current_page, 2);

    app.update(Event::CarouselNext(CarouselId::Hero), &mut model);
    assert_eq!(app.view(&model).home.hero.current_page, 0);
}

#[test]
fn test_failed_sports_fetch_shows_error_state() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::HomeOpened, &mut model);
    let ticket = model.sports_fence.latest();

    app.update(
        Event::SportsFetched {
            ticket,
            result: Err(GatewayError::Transport {
                message: "offline".into(),
            }),
        },
        &mut model,
    );

    let view = app.view(&model);
    assert!(matches!(view.home.status, LoadStatus::Failed { .. }));
    assert!(view.home.sports.is_empty());
    assert!(view.home.new_events.items.is_empty());
}

#[test]
fn test_leaving_home_cancels_carousel_timers() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    loaded_home(&app, &mut model, 10);

    let update = app.update(Event::EventsPageOpened, &mut model);

    let cancels = update
        .effects
        .iter()
        .filter(|e| matches!(e, Effect::Timer(r) if matches!(r.operation, TimerOperation::Cancel { .. })))
        .count();
    assert_eq!(cancels, 2);
    assert!(!model.hero.is_auto_playing());
    assert!(!model.new_events.is_auto_playing());
}
