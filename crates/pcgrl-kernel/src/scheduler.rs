//! Turn scheduling: per-step agent order and the negative-switch ring.
//!
//! Every step draws a fresh uniform permutation of the agents. There is no
//! fairness beyond the shuffle, so one agent may go first several steps in a
//! row.
//!
//! In negative-switch mode a single agent is "active" and only it may edit the
//! grid. Whenever any agent receives a negative reward the active index moves
//! to the next agent, wrapping around. The check happens as each turn is
//! processed, so a hand-over mid-step already affects agents later in the
//! same order.

use rand::Rng;
use rand::seq::SliceRandom;

/// Agent order and active-agent state.
#[derive(Debug, Clone)]
pub struct TurnScheduler {
    order: Vec<usize>,
    active_agent: usize,
    negative_switch: bool,
}

impl TurnScheduler {
    pub fn new(n_agents: usize) -> Self {
        Self {
            order: (0..n_agents).collect(),
            active_agent: 0,
            negative_switch: false,
        }
    }

    pub fn n_agents(&self) -> usize {
        self.order.len()
    }

    /// Draw a new visitation order for this step.
    pub fn shuffle(&mut self, rng: &mut impl Rng) -> &[usize] {
        self.order.shuffle(rng);
        &self.order
    }

    /// The order drawn by the last call to [`shuffle`](Self::shuffle).
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn active_agent(&self) -> usize {
        self.active_agent
    }

    pub fn is_active(&self, agent: usize) -> bool {
        self.active_agent == agent
    }

    pub fn negative_switch(&self) -> bool {
        self.negative_switch
    }

    pub fn set_negative_switch(&mut self, enabled: bool) {
        self.negative_switch = enabled;
    }

    /// Whether `agent` may edit the grid this turn.
    pub fn may_edit(&self, agent: usize) -> bool {
        !self.negative_switch || self.is_active(agent)
    }

    /// Feed a turn's reward into the ring. Returns `true` if the active agent
    /// changed.
    pub fn observe_reward(&mut self, reward: f64) -> bool {
        if self.negative_switch && reward < 0.0 {
            self.active_agent = (self.active_agent + 1) % self.order.len();
            return true;
        }
        false
    }
}
