use std::time::{Duration, Instant};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarouselState {
    #[default]
    Inactive,
    Active {
        index: usize,
        count: usize,
    },
}

impl CarouselState {
    pub fn index(&self) -> Option<usize> {
        match self {
            CarouselState::Inactive => None,
            CarouselState::Active { index, .. } => Some(*index),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            CarouselState::Inactive => 0,
            CarouselState::Active { count, .. } => *count,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, CarouselState::Active { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselEvent {
    Reload { count: usize },
    Tick,
    Select(usize),
}

// Invariant: index < count whenever the state is Active. A reload always
// re-enters at the first banner, which also covers a banner list that
// shrank below the previous index.
pub fn step(state: CarouselState, event: CarouselEvent) -> CarouselState {
    match (state, event) {
        (_, CarouselEvent::Reload { count: 0 }) => CarouselState::Inactive,
        (_, CarouselEvent::Reload { count }) => CarouselState::Active { index: 0, count },
        (CarouselState::Inactive, _) => CarouselState::Inactive,
        (CarouselState::Active { index, count }, CarouselEvent::Tick) => CarouselState::Active {
            index: (index + 1) % count,
            count,
        },
        (CarouselState::Active { count, .. }, CarouselEvent::Select(target)) => {
            CarouselState::Active {
                index: target.min(count - 1),
                count,
            }
        }
    }
}

pub struct Ticker {
    interval: Duration,
    last_tick: Instant,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: Instant::now(),
        }
    }

    pub fn due(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) >= self.interval {
            self.last_tick = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reload_is_inactive() {
        let state = step(CarouselState::default(), CarouselEvent::Reload { count: 0 });
        assert_eq!(state, CarouselState::Inactive);
        assert_eq!(state.index(), None);
    }

    #[test]
    fn reload_enters_at_first_banner() {
        let state = step(CarouselState::default(), CarouselEvent::Reload { count: 3 });
        assert_eq!(state, CarouselState::Active { index: 0, count: 3 });
    }

    #[test]
    fn ticks_wrap_at_banner_count() {
        let mut state = step(CarouselState::default(), CarouselEvent::Reload { count: 3 });
        let mut seen = Vec::new();
        for _ in 0..4 {
            state = step(state, CarouselEvent::Tick);
            seen.push(state.index().unwrap());
        }
        assert_eq!(seen, [1, 2, 0, 1]);
    }

    #[test]
    fn tick_on_inactive_is_a_no_op() {
        let state = step(CarouselState::Inactive, CarouselEvent::Tick);
        assert_eq!(state, CarouselState::Inactive);
    }

    #[test]
    fn select_clamps_into_range() {
        let state = step(CarouselState::default(), CarouselEvent::Reload { count: 3 });
        let state = step(state, CarouselEvent::Select(2));
        assert_eq!(state.index(), Some(2));
        let state = step(state, CarouselEvent::Select(9));
        assert_eq!(state.index(), Some(2));
    }

    #[test]
    fn shrinking_reload_resets_index() {
        let state = step(CarouselState::default(), CarouselEvent::Reload { count: 5 });
        let state = step(state, CarouselEvent::Select(4));
        let state = step(state, CarouselEvent::Reload { count: 2 });
        assert_eq!(state, CarouselState::Active { index: 0, count: 2 });
        let state = step(state, CarouselEvent::Tick);
        assert_eq!(state.index(), Some(1));
    }

    #[test]
    fn ticker_fires_only_after_interval() {
        let mut immediate = Ticker::new(Duration::ZERO);
        assert!(immediate.due());

        let mut slow = Ticker::new(Duration::from_secs(60));
        assert!(!slow.due());
        assert!(!slow.due());
    }
}
