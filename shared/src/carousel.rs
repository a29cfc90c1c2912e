//! Paged rotation state machine shared by the hero slider, the related-events
//! carousel and the home page "new events" rotator.
//!
//! The carousel never touches the timer capability itself. Every operation
//! that affects auto-play returns the [`TimerCommand`]s the app must run.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capabilities::timer::{TimerCommand, TimerId, TimerOwner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarouselId {
    Hero,
    NewEvents,
    Related,
}

impl CarouselId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::NewEvents => "new_events",
            Self::Related => "related",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarouselPhase {
    Idle,
    Animating,
    AutoPlaying,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carousel<T> {
    id: CarouselId,
    items: Vec<T>,
    page_size: usize,
    current_page: usize,
    interval_ms: u64,
    transitions: bool,
    animating: bool,
    timer: Option<TimerId>,
    timer_seq: u64,
    paused_by_hover: bool,
}

impl<T> Carousel<T> {
    #[must_use]
    pub fn new(id: CarouselId, page_size: usize, interval_ms: u64) -> Self {
        Self {
            id,
            items: Vec::new(),
            page_size: page_size.max(1),
            current_page: 0,
            interval_ms,
            transitions: false,
            animating: false,
            timer: None,
            timer_seq: 0,
            paused_by_hover: false,
        }
    }

    /// Navigation puts the carousel into `Animating` until the shell reports
    /// the transition finished via [`Carousel::finish_transition`]. A shell
    /// that never reports it only delays navigation until the next live tick,
    /// which ends the transition itself.
    #[must_use]
    pub fn with_transitions(mut self) -> Self {
        self.transitions = true;
        self
    }

    /// Replaces the items, rewinds to the first page and stops auto-play.
    pub fn set_items(&mut self, items: Vec<T>) -> Vec<TimerCommand> {
        self.items = items;
        self.current_page = 0;
        self.animating = false;
        self.paused_by_hover = false;
        self.stop_auto_play()
    }

    #[must_use]
    pub fn id(&self) -> CarouselId {
        self.id
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(self.page_size)
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    #[must_use]
    pub fn current_items(&self) -> &[T] {
        let start = self.current_page * self.page_size;
        if start >= self.items.len() {
            return &[];
        }
        let end = (start + self.page_size).min(self.items.len());
        &self.items[start..end]
    }

    #[must_use]
    pub fn phase(&self) -> CarouselPhase {
        if self.animating {
            CarouselPhase::Animating
        } else if self.timer.is_some() {
            CarouselPhase::AutoPlaying
        } else {
            CarouselPhase::Idle
        }
    }

    #[must_use]
    pub fn is_auto_playing(&self) -> bool {
        self.timer.is_some()
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Whether there is more than one page to rotate through.
    #[must_use]
    pub fn can_rotate(&self) -> bool {
        self.items.len() > self.page_size
    }

    /// Moves to `page`, wrapping out-of-range values around the page count.
    pub fn go_to(&mut self, page: i64) -> Vec<TimerCommand> {
        if self.animating {
            return Vec::new();
        }
        let pages = self.page_count();
        if pages == 0 {
            return Vec::new();
        }

        let pages_i64 = i64::try_from(pages).unwrap_or(i64::MAX);
        let target = usize::try_from(page.rem_euclid(pages_i64)).unwrap_or(0);
        if target != self.current_page {
            self.current_page = target;
            self.animating = self.transitions;
        }

        if self.timer.is_some() {
            self.restart_timer()
        } else {
            Vec::new()
        }
    }

    pub fn next(&mut self) -> Vec<TimerCommand> {
        if self.page_count() == 0 {
            return Vec::new();
        }
        self.go_to(self.current_page_i64() + 1)
    }

    pub fn prev(&mut self) -> Vec<TimerCommand> {
        if self.page_count() == 0 {
            return Vec::new();
        }
        self.go_to(self.current_page_i64() - 1)
    }

    pub fn finish_transition(&mut self) {
        self.animating = false;
    }

    pub fn start_auto_play(&mut self) -> Vec<TimerCommand> {
        self.paused_by_hover = false;
        if !self.can_rotate() {
            return self.stop_auto_play();
        }
        self.restart_timer()
    }

    pub fn stop_auto_play(&mut self) -> Vec<TimerCommand> {
        self.timer
            .take()
            .map(|id| TimerCommand::Cancel { id })
            .into_iter()
            .collect()
    }

    pub fn hover_enter(&mut self) -> Vec<TimerCommand> {
        if self.timer.is_none() {
            return Vec::new();
        }
        let commands = self.stop_auto_play();
        self.paused_by_hover = true;
        commands
    }

    pub fn hover_leave(&mut self) -> Vec<TimerCommand> {
        if !self.paused_by_hover {
            return Vec::new();
        }
        self.start_auto_play()
    }

    /// Handles a fired timer. Ticks for anything but the live timer are stale
    /// and dropped; a live tick advances one page and schedules the next one.
    pub fn on_timer(&mut self, id: TimerId) -> Vec<TimerCommand> {
        if self.timer != Some(id) {
            debug!(carousel = self.id.as_str(), timer = %id, "ignoring stale tick");
            return Vec::new();
        }
        self.timer = None;

        if !self.can_rotate() {
            self.animating = false;
            return Vec::new();
        }
        self.current_page = (self.current_page + 1) % self.page_count();
        self.animating = self.transitions;
        self.schedule_next()
    }

    fn current_page_i64(&self) -> i64 {
        i64::try_from(self.current_page).unwrap_or(0)
    }

    fn restart_timer(&mut self) -> Vec<TimerCommand> {
        let mut commands = self.stop_auto_play();
        commands.extend(self.schedule_next());
        commands
    }

    fn schedule_next(&mut self) -> Vec<TimerCommand> {
        self.timer_seq += 1;
        let id = TimerId::new(TimerOwner::Carousel(self.id), self.timer_seq);
        self.timer = Some(id);
        vec![TimerCommand::Schedule {
            id,
            after_ms: self.interval_ms,
        }]
    }
}

/// Item-type-erased control surface, so the app can drive any carousel by id.
pub trait CarouselControl {
    fn go_to(&mut self, page: i64) -> Vec<TimerCommand>;
    fn next(&mut self) -> Vec<TimerCommand>;
    fn prev(&mut self) -> Vec<TimerCommand>;
    fn start_auto_play(&mut self) -> Vec<TimerCommand>;
    fn stop_auto_play(&mut self) -> Vec<TimerCommand>;
    fn hover_enter(&mut self) -> Vec<TimerCommand>;
    fn hover_leave(&mut self) -> Vec<TimerCommand>;
    fn finish_transition(&mut self);
    fn on_timer(&mut self, id: TimerId) -> Vec<TimerCommand>;
}

impl<T> CarouselControl for Carousel<T> {
    fn go_to(&mut self, page: i64) -> Vec<TimerCommand> {
        Carousel::go_to(self, page)
    }

    fn next(&mut self) -> Vec<TimerCommand> {
        Carousel::next(self)
    }

    fn prev(&mut self) -> Vec<TimerCommand> {
        Carousel::prev(self)
    }

    fn start_auto_play(&mut self) -> Vec<TimerCommand> {
        Carousel::start_auto_play(self)
    }

    fn stop_auto_play(&mut self) -> Vec<TimerCommand> {
        Carousel::stop_auto_play(self)
    }

    fn hover_enter(&mut self) -> Vec<TimerCommand> {
        Carousel::hover_enter(self)
    }

    fn hover_leave(&mut self) -> Vec<TimerCommand> {
        Carousel::hover_leave(self)
    }

    fn finish_transition(&mut self) {
        Carousel::finish_transition(self);
    }

    fn on_timer(&mut self, id: TimerId) -> Vec<TimerCommand> {
        Carousel::on_timer(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn carousel(len: usize, page_size: usize) -> Carousel<usize> {
        let mut c = Carousel::new(CarouselId::Related, page_size, 5000);
        c.set_items((0..len).collect());
        c
    }

    fn scheduled(commands: &[TimerCommand]) -> Option<TimerId> {
        commands.iter().find_map(|c| match c {
            TimerCommand::Schedule { id, .. } => Some(*id),
            TimerCommand::Cancel { .. } => None,
        })
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn test_ten_items_page_four_wraps_after_three_nexts() {
            let mut c = carousel(10, 4);
            assert_eq!(c.page_count(), 3);
            c.next();
            c.next();
            assert_eq!(c.current_items(), &[8, 9]);
            c.next();
            assert_eq!(c.current_page(), 0);
        }

        #[test]
        fn test_prev_wraps_to_last_page() {
            let mut c = carousel(10, 4);
            c.prev();
            assert_eq!(c.current_page(), 2);
        }

        #[test]
        fn test_go_to_wraps_out_of_range() {
            let mut c = carousel(10, 4);
            c.go_to(5);
            assert_eq!(c.current_page(), 2);
            c.go_to(-1);
            assert_eq!(c.current_page(), 2);
        }

        #[test]
        fn test_empty_carousel_never_moves() {
            let mut c = carousel(0, 4);
            assert_eq!(c.page_count(), 0);
            assert!(c.next().is_empty());
            assert!(c.prev().is_empty());
            assert!(c.go_to(5).is_empty());
            assert_eq!(c.current_page(), 0);
            assert!(c.current_items().is_empty());
        }

        #[test]
        fn test_animating_blocks_navigation() {
            let mut c = Carousel::new(CarouselId::Related, 1, 5000).with_transitions();
            c.set_items(vec![1, 2, 3]);
            c.next();
            assert_eq!(c.phase(), CarouselPhase::Animating);
            c.next();
            assert_eq!(c.current_page(), 1);

            c.finish_transition();
            c.next();
            assert_eq!(c.current_page(), 2);
        }

        #[test]
        fn test_live_tick_ends_unfinished_transition() {
            let mut c = Carousel::new(CarouselId::Related, 1, 5000).with_transitions();
            c.set_items(vec![1, 2, 3]);
            c.start_auto_play();
            let id = scheduled(&c.next()).unwrap();
            assert!(c.is_animating());
            assert_eq!(c.current_page(), 1);

            let commands = c.on_timer(id);
            assert_eq!(c.current_page(), 2);
            assert!(scheduled(&commands).is_some());
        }

        #[test]
        fn test_set_items_rewinds() {
            let mut c = carousel(10, 4);
            c.next();
            c.set_items(vec![1, 2]);
            assert_eq!(c.current_page(), 0);
        }
    }

    mod auto_play_tests {
        use super::*;

        #[test]
        fn test_start_schedules_one_timer() {
            let mut c = carousel(10, 4);
            let commands = c.start_auto_play();
            assert_eq!(commands.len(), 1);
            assert!(c.is_auto_playing());
            assert_eq!(c.phase(), CarouselPhase::AutoPlaying);
        }

        #[test]
        fn test_restart_cancels_previous_timer() {
            let mut c = carousel(10, 4);
            let first = scheduled(&c.start_auto_play()).unwrap();
            let commands = c.start_auto_play();
            assert_eq!(commands[0], TimerCommand::Cancel { id: first });
            assert_ne!(scheduled(&commands), Some(first));
        }

        #[test]
        fn test_suppressed_when_nothing_to_rotate() {
            let mut c = carousel(4, 4);
            assert!(c.start_auto_play().is_empty());
            assert!(!c.is_auto_playing());
        }

        #[test]
        fn test_tick_advances_and_chains() {
            let mut c = carousel(10, 4);
            let id = scheduled(&c.start_auto_play()).unwrap();
            let commands = c.on_timer(id);
            assert_eq!(c.current_page(), 1);
            assert!(scheduled(&commands).is_some());
            assert!(c.is_auto_playing());
        }

        #[test]
        fn test_stale_tick_is_ignored() {
            let mut c = carousel(10, 4);
            let stale = scheduled(&c.start_auto_play()).unwrap();
            c.start_auto_play();
            assert!(c.on_timer(stale).is_empty());
            assert_eq!(c.current_page(), 0);
        }

        #[test]
        fn test_stop_is_idempotent() {
            let mut c = carousel(10, 4);
            c.start_auto_play();
            assert_eq!(c.stop_auto_play().len(), 1);
            assert!(c.stop_auto_play().is_empty());
        }

        #[test]
        fn test_navigation_resets_running_timer() {
            let mut c = carousel(10, 4);
            let first = scheduled(&c.start_auto_play()).unwrap();
            let commands = c.next();
            assert_eq!(commands[0], TimerCommand::Cancel { id: first });
            assert!(scheduled(&commands).is_some());
        }

        #[test]
        fn test_navigation_without_timer_schedules_nothing() {
            let mut c = carousel(10, 4);
            assert!(c.next().is_empty());
        }

        #[test]
        fn test_hover_pauses_and_resumes() {
            let mut c = carousel(10, 4);
            c.start_auto_play();
            assert_eq!(c.hover_enter().len(), 1);
            assert!(!c.is_auto_playing());
            assert!(scheduled(&c.hover_leave()).is_some());
            assert!(c.is_auto_playing());
        }

        #[test]
        fn test_hover_leave_without_prior_play_does_nothing() {
            let mut c = carousel(10, 4);
            c.hover_enter();
            assert!(c.hover_leave().is_empty());
            assert!(!c.is_auto_playing());
        }
    }

    proptest! {
        #[test]
        fn prop_current_page_always_in_range(
            len in 0usize..30,
            page_size in 1usize..6,
            moves in proptest::collection::vec(-8i64..8, 0..40),
        ) {
            let mut c = carousel(len, page_size);
            for m in moves {
                match m {
                    0 => { c.next(); }
                    1 => { c.prev(); }
                    2 => { c.start_auto_play(); }
                    3 => { c.stop_auto_play(); }
                    other => { c.go_to(other); }
                }
                let pages = c.page_count();
                if pages == 0 {
                    prop_assert_eq!(c.current_page(), 0);
                } else {
                    prop_assert!(c.current_page() < pages);
                }
                prop_assert!(c.current_items().len() <= page_size);
            }
        }

        #[test]
        fn prop_full_cycle_returns_to_start(len in 1usize..30, page_size in 1usize..6) {
            let mut c = carousel(len, page_size);
            for _ in 0..c.page_count() {
                c.next();
            }
            prop_assert_eq!(c.current_page(), 0);
        }
    }
}
