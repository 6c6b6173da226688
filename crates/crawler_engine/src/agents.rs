use rand::prelude::*;

const DEFAULT_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.212 Safari/537.36",
    "Mozilla/5.0 (Linux; Android 10; Pixel 4 XL Build/QD1A.190821.007) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.77 Mobile Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/91.0.864.59 Safari/537.36",
];

/// Fixed pool of user agents; each request picks one uniformly at random.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// Falls back to the built-in pool when `agents` has no usable entry.
    pub fn new(agents: Vec<String>) -> Self {
        let agents: Vec<String> = agents
            .into_iter()
            .map(|agent| agent.trim().to_string())
            .filter(|agent| !agent.is_empty())
            .collect();
        if agents.is_empty() {
            Self::default()
        } else {
            Self { agents }
        }
    }

    pub fn pick(&self) -> &str {
        let index = rand::rng().random_range(0..self.agents.len());
        &self.agents[index]
    }

    pub fn agents(&self) -> &[String] {
        &self.agents
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self {
            agents: DEFAULT_AGENTS.iter().map(|agent| agent.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_uses_builtin_pool() {
        let pool = UserAgentPool::new(vec!["  ".to_string()]);
        assert_eq!(pool.agents().len(), 4);
    }

    #[test]
    fn pick_stays_inside_the_pool() {
        let pool = UserAgentPool::new(vec!["a/1".to_string(), "b/2".to_string()]);
        for _ in 0..32 {
            let agent = pool.pick();
            assert!(agent == "a/1" || agent == "b/2");
        }
    }
}
