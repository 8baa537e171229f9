//! Per-agent reward history for the current episode.

/// Append-only reward sequences, one per agent.
#[derive(Debug, Clone, Default)]
pub struct RewardLedger {
    history: Vec<Vec<f64>>,
}

impl RewardLedger {
    pub fn new(n_agents: usize) -> Self {
        Self {
            history: vec![Vec::new(); n_agents],
        }
    }

    pub fn record(&mut self, agent: usize, reward: f64) {
        if let Some(rewards) = self.history.get_mut(agent) {
            rewards.push(reward);
        }
    }

    /// Drop all recorded rewards, keeping one empty sequence per agent.
    pub fn clear(&mut self) {
        for rewards in &mut self.history {
            rewards.clear();
        }
    }

    /// Episode total for every agent.
    pub fn totals(&self) -> Vec<f64> {
        self.history.iter().map(|r| r.iter().sum()).collect()
    }

    pub fn history(&self, agent: usize) -> &[f64] {
        self.history.get(agent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of rewards recorded for `agent` this episode.
    pub fn len(&self, agent: usize) -> usize {
        self.history(agent).len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.iter().all(Vec::is_empty)
    }
}
